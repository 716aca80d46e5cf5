//! Tours API: REST endpoints over `tours` and `users` document collections, with query-string
//! driven listing and a single terminal error stage.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod intercept;
pub mod middleware;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AppConfig, Environment};
pub use error::{AppError, ConfigError, ErrorReport, StatusCategory};
pub use intercept::capture;
pub use query::{QueryBuilder, QuerySpec, RawParams};
pub use routes::app;
pub use service::{load_seed_file, TourService, UserService, TOURS, USERS};
pub use state::AppState;
pub use store::{ensure_database_exists, DocumentStore, InMemoryDocumentStore, PgDocumentStore, StoreError};
