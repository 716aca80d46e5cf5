//! QuerySpec: filter, sort, projection and pagination for one list request. Never executes anything.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 100;

/// Parameters that steer the query instead of filtering documents.
pub const RESERVED_KEYS: &[&str] = &["page", "sort", "limit", "fields"];

/// Comparison operators understood by the document store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// Plain token as written in a query string (`price[gte]=...`).
    pub fn from_plain(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            _ => None,
        }
    }

    /// Store operator syntax (`$gte`).
    pub fn from_operator(op: &str) -> Option<Self> {
        op.strip_prefix('$').and_then(Self::from_plain)
    }

    pub fn operator(&self) -> &'static str {
        match self {
            Comparison::Gt => "$gt",
            Comparison::Gte => "$gte",
            Comparison::Lt => "$lt",
            Comparison::Lte => "$lte",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    /// Equality against the field.
    Literal(String),
    /// Sub-mapping; keys are store operators (`$gte`) or passed-through tokens.
    Ops(BTreeMap<String, FilterValue>),
}

impl FilterValue {
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Literal(s) => Value::String(s.clone()),
            FilterValue::Ops(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }
}

pub type FilterPredicate = BTreeMap<String, FilterValue>;

/// Plain decimal such as `100`, `-3` or `4.5`; such literals compare numerically against number fields.
pub fn is_numeric_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        SortKey {
            field: field.into(),
            direction,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Pagination {
            page,
            limit,
            skip: (page - 1).saturating_mul(limit),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pub filter: FilterPredicate,
    /// Empty means the store's default order.
    pub sort: Vec<SortKey>,
    /// Empty means all fields minus the store's default exclusions.
    pub projection: BTreeSet<String>,
    pub pagination: Pagination,
}

impl QuerySpec {
    /// Shape a stored document for output.
    ///
    /// With an explicit projection only the listed fields and `id_field` are kept, hidden ones
    /// included. Otherwise every field except `hidden` is kept.
    pub fn project(&self, doc: Map<String, Value>, id_field: &str, hidden: &[&str]) -> Map<String, Value> {
        if self.projection.is_empty() {
            return doc.into_iter().filter(|(k, _)| !hidden.contains(&k.as_str())).collect();
        }
        doc.into_iter()
            .filter(|(k, _)| k == id_field || self.projection.contains(k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skip_is_derived_from_page_and_limit() {
        assert_eq!(Pagination::new(3, 10).skip, 20);
        assert_eq!(Pagination::default(), Pagination { page: 1, limit: 100, skip: 0 });
        assert_eq!(Pagination::new(u64::MAX, u64::MAX).skip, u64::MAX);
    }

    #[test]
    fn numeric_literals() {
        assert!(is_numeric_literal("100"));
        assert!(is_numeric_literal("-4.5"));
        assert!(!is_numeric_literal("4."));
        assert!(!is_numeric_literal("1e5"));
        assert!(!is_numeric_literal("NaN"));
        assert!(!is_numeric_literal(""));
    }

    #[test]
    fn operators_round_between_forms() {
        assert_eq!(Comparison::from_plain("gte").map(|c| c.operator()), Some("$gte"));
        assert_eq!(Comparison::from_operator("$lt"), Some(Comparison::Lt));
        assert_eq!(Comparison::from_operator("lt"), None);
        assert_eq!(Comparison::from_plain("ne"), None);
    }

    #[test]
    fn projection_defaults_to_hiding_internal_fields() {
        let doc = json!({"id": "1", "name": "Sea Explorer", "__v": 0, "createdAt": "2024"});
        let Value::Object(doc) = doc else { unreachable!() };

        let all = QuerySpec::default().project(doc.clone(), "id", &["__v", "createdAt"]);
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["id", "name"]);

        let spec = QuerySpec {
            projection: ["createdAt".to_string()].into_iter().collect(),
            ..QuerySpec::default()
        };
        let picked = spec.project(doc, "id", &["__v", "createdAt"]);
        assert_eq!(picked.keys().collect::<Vec<_>>(), vec!["createdAt", "id"]);
    }
}
