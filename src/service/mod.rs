//! Domain services: validation and business rules between handlers and the document store.

mod reports;
mod tours;
mod users;
mod validation;

pub use reports::{ReportService, STATS_MIN_RATING};
pub use tours::{slugify, TourService, DIFFICULTIES, TOP_CHEAP_ALIAS, TOURS, TOUR_RULES};
pub use users::{load_seed_file, UserService, USERS};
pub use validation::{FieldKind, RequestValidator, Rules, ValidationRule};
