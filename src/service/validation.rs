//! Schema validation for request bodies: per-field rules checked before anything reaches the store.

use crate::error::AppError;
use regex::Regex;
use serde_json::Value;

/// JSON type a field must have when present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    TextList,
    Any,
}

impl FieldKind {
    fn accepts(&self, v: &Value) -> bool {
        match self {
            FieldKind::Text => v.is_string(),
            FieldKind::Number => v.is_number(),
            FieldKind::Boolean => v.is_boolean(),
            FieldKind::TextList => v.as_array().map_or(false, |items| items.iter().all(Value::is_string)),
            FieldKind::Any => true,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::TextList => "a list of strings",
            FieldKind::Any => "any value",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ValidationRule {
    pub kind: FieldKind,
    /// Message when the field is missing; `None` means optional.
    pub required: Option<&'static str>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub allowed: Option<&'static [&'static str]>,
    pub pattern: Option<&'static str>,
}

impl ValidationRule {
    pub const fn optional(kind: FieldKind) -> Self {
        ValidationRule {
            kind,
            required: None,
            min_length: None,
            max_length: None,
            minimum: None,
            maximum: None,
            allowed: None,
            pattern: None,
        }
    }

    pub const fn required(kind: FieldKind, message: &'static str) -> Self {
        ValidationRule {
            required: Some(message),
            ..ValidationRule::optional(kind)
        }
    }
}

pub type Rules = [(&'static str, ValidationRule)];

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a full document: every required field must be present and non-null.
    pub fn validate(body: &serde_json::Map<String, Value>, rules: &Rules) -> Result<(), AppError> {
        let mut problems = Vec::new();
        for (col, rule) in rules {
            match body.get(*col) {
                None | Some(Value::Null) => {
                    if let Some(message) = rule.required {
                        problems.push(message.to_string());
                    }
                }
                Some(v) => problems.extend(check_field(col, v, rule)),
            }
        }
        finish(problems)
    }

    /// Validate only the fields present in body (for PATCH). Required is enforced only against explicit nulls.
    pub fn validate_partial(body: &serde_json::Map<String, Value>, rules: &Rules) -> Result<(), AppError> {
        let mut problems = Vec::new();
        for (col, v) in body {
            let Some((_, rule)) = rules.iter().find(|(name, _)| *name == col.as_str()) else {
                continue;
            };
            match (v, rule.required) {
                (Value::Null, Some(message)) => problems.push(message.to_string()),
                (Value::Null, None) => {}
                _ => problems.extend(check_field(col, v, rule)),
            }
        }
        finish(problems)
    }
}

fn finish(problems: Vec<String>) -> Result<(), AppError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid input data. {}", problems.join(". "))))
    }
}

fn check_field(col: &str, v: &Value, rule: &ValidationRule) -> Vec<String> {
    if !rule.kind.accepts(v) {
        return vec![format!("{} must be {}", col, rule.kind.describe())];
    }
    let mut problems = Vec::new();
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max {
                problems.push(format!("{} must have less or equal than {} characters", col, max));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min {
                problems.push(format!("{} must have more or equal than {} characters", col, min));
            }
        }
        if let Some(pattern) = rule.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => problems.push(format!("{} does not match required pattern", col)),
                Ok(_) => {}
                Err(_) => problems.push(format!("invalid pattern for {}", col)),
            }
        }
        if let Some(allowed) = rule.allowed {
            if !allowed.iter().any(|a| *a == s) {
                problems.push(format!("{} is either: {}", col, allowed.join(", ")));
            }
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                problems.push(format!("{} must be above {}", col, min));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                problems.push(format!("{} must be below {}", col, max));
            }
        }
    }
    problems
}
