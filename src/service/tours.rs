//! Tours: schema rules, derived fields and CRUD over the `tours` collection.

use crate::error::AppError;
use crate::intercept::capture;
use crate::query::{QuerySpec, RawParams};
use crate::service::validation::{FieldKind, RequestValidator, Rules, ValidationRule};
use crate::store::{Collection, Document, DocumentStore};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

pub const TOURS: Collection = Collection {
    name: "tours",
    unique_fields: &["name"],
    hidden_fields: &["createdAt"],
    secret_flag: Some("secretTour"),
};

pub const DIFFICULTIES: &[&str] = &["easy", "medium", "hard"];

pub const TOUR_RULES: &Rules = &[
    (
        "name",
        ValidationRule {
            min_length: Some(10),
            max_length: Some(40),
            pattern: Some(r"^[A-Za-z ]+$"),
            ..ValidationRule::required(FieldKind::Text, "A tour must have a name")
        },
    ),
    ("duration", ValidationRule::required(FieldKind::Number, "A tour must have a duration")),
    ("maxGroupSize", ValidationRule::required(FieldKind::Number, "A tour must have a group size")),
    (
        "difficulty",
        ValidationRule {
            allowed: Some(DIFFICULTIES),
            ..ValidationRule::required(FieldKind::Text, "A tour must have a difficulty")
        },
    ),
    (
        "ratingsAverage",
        ValidationRule {
            minimum: Some(1.0),
            maximum: Some(5.0),
            ..ValidationRule::optional(FieldKind::Number)
        },
    ),
    ("ratingsQuantity", ValidationRule::optional(FieldKind::Number)),
    ("price", ValidationRule::required(FieldKind::Number, "A tour must have a price")),
    ("priceDiscount", ValidationRule::optional(FieldKind::Number)),
    ("summary", ValidationRule::required(FieldKind::Text, "A tour must have a summary")),
    ("description", ValidationRule::optional(FieldKind::Text)),
    ("imageCover", ValidationRule::required(FieldKind::Text, "A tour must have a cover image")),
    ("images", ValidationRule::optional(FieldKind::TextList)),
    ("startDates", ValidationRule::optional(FieldKind::TextList)),
    ("secretTour", ValidationRule::optional(FieldKind::Boolean)),
];

const TRIMMED: &[&str] = &["name", "difficulty", "summary", "description"];

/// Query applied by the `top-5-cheap` route before the regular list pipeline.
pub const TOP_CHEAP_ALIAS: &[(&str, &str)] = &[
    ("limit", "5"),
    ("sort", "-ratingsAverage,price"),
    ("fields", "name,price,ratingsAverage,summary,difficulty"),
];

const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

pub struct TourService;

impl TourService {
    pub async fn list(store: &dyn DocumentStore, params: &RawParams) -> Result<Vec<Document>, AppError> {
        let spec = QuerySpec::from_params(params);
        let tours = capture(store.find(&TOURS, &spec)).await?;
        Ok(tours.into_iter().map(with_virtuals).collect())
    }

    /// Five best-rated tours, cheapest first among equal ratings. Other filters in `params` still apply.
    pub async fn top_cheap(store: &dyn DocumentStore, params: &RawParams) -> Result<Vec<Document>, AppError> {
        let mut params = params.clone();
        for (key, value) in TOP_CHEAP_ALIAS {
            params.set(key, *value);
        }
        Self::list(store, &params).await
    }

    pub async fn read(store: &dyn DocumentStore, id: Uuid) -> Result<Document, AppError> {
        let tour = capture(store.find_by_id(&TOURS, id)).await?.ok_or_else(tour_not_found)?;
        Ok(present(tour))
    }

    pub async fn create(store: &dyn DocumentStore, body: Value) -> Result<Document, AppError> {
        let mut doc = normalize(body_to_map(body)?);
        apply_defaults(&mut doc);
        RequestValidator::validate(&doc, TOUR_RULES)?;
        check_consistency(&doc)?;
        if let Some(name) = doc.get("name").and_then(Value::as_str) {
            let slug = slugify(name);
            doc.insert("slug".into(), Value::String(slug));
        }
        doc.insert(
            "createdAt".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        let created = capture(store.insert(&TOURS, doc)).await?;
        tracing::info!(id = ?created.get("id"), "tour created");
        Ok(present(created))
    }

    pub async fn update(store: &dyn DocumentStore, id: Uuid, body: Value) -> Result<Document, AppError> {
        let mut patch = normalize(body_to_map(body)?);
        RequestValidator::validate_partial(&patch, TOUR_RULES)?;

        let existing = capture(store.find_by_id(&TOURS, id)).await?.ok_or_else(tour_not_found)?;
        let mut merged = existing;
        merged.extend(patch.clone());
        check_consistency(&merged)?;

        if let Some(name) = patch.get("name").and_then(Value::as_str) {
            let slug = slugify(name);
            patch.insert("slug".into(), Value::String(slug));
        }
        let updated = capture(store.update(&TOURS, id, patch)).await?.ok_or_else(tour_not_found)?;
        Ok(present(updated))
    }

    pub async fn delete(store: &dyn DocumentStore, id: Uuid) -> Result<(), AppError> {
        if capture(store.delete(&TOURS, id)).await? {
            tracing::info!(%id, "tour deleted");
            Ok(())
        } else {
            Err(tour_not_found())
        }
    }
}

fn tour_not_found() -> AppError {
    AppError::not_found("No tour found with that ID")
}

pub(crate) fn body_to_map(body: Value) -> Result<Document, AppError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::bad_request("Request body must be a JSON object")),
    }
}

/// Keep schema fields only and trim text fields.
fn normalize(mut doc: Document) -> Document {
    doc.retain(|key, _| TOUR_RULES.iter().any(|(name, _)| *name == key.as_str()));
    for field in TRIMMED {
        if let Some(Value::String(s)) = doc.get_mut(*field) {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    }
    doc
}

fn apply_defaults(doc: &mut Document) {
    let defaults = [
        ("ratingsAverage", Value::from(DEFAULT_RATINGS_AVERAGE)),
        ("ratingsQuantity", Value::from(0)),
        ("images", Value::Array(Vec::new())),
        ("startDates", Value::Array(Vec::new())),
        ("secretTour", Value::Bool(false)),
    ];
    for (key, value) in defaults {
        doc.entry(key).or_insert(value);
    }
}

/// Cross-field rules: discount below price, parseable start dates.
fn check_consistency(doc: &Document) -> Result<(), AppError> {
    let mut problems = Vec::new();
    let discount = doc.get("priceDiscount").and_then(Value::as_f64);
    let price = doc.get("price").and_then(Value::as_f64);
    if let (Some(discount), Some(price)) = (discount, price) {
        if discount >= price {
            problems.push(format!("Discount price ({}) should be below regular price", discount));
        }
    }
    if let Some(Value::Array(dates)) = doc.get("startDates") {
        for date in dates.iter().filter_map(Value::as_str) {
            if parse_start_date(date).is_none() {
                problems.push(format!("startDates contains an invalid date: {}", date));
            }
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid input data. {}", problems.join(". "))))
    }
}

/// Lowercase, hyphen-separated form of the name.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    match Regex::new(r"[^a-z0-9]+") {
        Ok(re) => re.replace_all(&lower, "-").trim_matches('-').to_string(),
        Err(_) => lower,
    }
}

/// Output shape: hidden fields dropped, `durationWeeks` derived from `duration`.
fn present(doc: Document) -> Document {
    with_virtuals(TOURS.present(doc))
}

fn with_virtuals(mut doc: Document) -> Document {
    if let Some(days) = doc.get("duration").and_then(Value::as_f64) {
        let weeks = serde_json::Number::from_f64(days / 7.0).map_or(Value::Null, Value::Number);
        doc.insert("durationWeeks".into(), weeks);
    }
    doc
}

/// Accepts RFC 3339, `YYYY-MM-DD`, and `YYYY-MM-DD,HH:MM` as used by the tour data set.
pub fn parse_start_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d,%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
