//! Builds a [`QuerySpec`] from [`RawParams`].
//!
//! Each step reads only the raw parameters and returns a new builder, so steps compose in any
//! order and the result is the same. No step fails: malformed values fall back to defaults and
//! unknown operator tokens pass through for the store to judge.

use crate::query::params::{ParamValue, RawParams};
use crate::query::spec::{
    Comparison, FilterPredicate, FilterValue, Pagination, QuerySpec, SortDirection, SortKey, DEFAULT_LIMIT, DEFAULT_PAGE,
    RESERVED_KEYS,
};
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
pub struct QueryBuilder<'a> {
    params: &'a RawParams,
    spec: QuerySpec,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(params: &'a RawParams) -> Self {
        QueryBuilder {
            params,
            spec: QuerySpec::default(),
        }
    }

    /// Every non-reserved parameter becomes a predicate; operator tokens in sub-mappings are rewritten.
    pub fn filter(self) -> Self {
        let filter: FilterPredicate = self
            .params
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), rewrite_operators(v)))
            .collect();
        self.with(|spec| spec.filter = filter)
    }

    /// `sort=-price,name` → price descending, then name ascending.
    pub fn sort(self) -> Self {
        let sort: Vec<SortKey> = self
            .params
            .scalar("sort")
            .map(|s| {
                comma_tokens(s)
                    .filter_map(|token| match token.strip_prefix('-') {
                        Some(field) if !field.is_empty() => Some(SortKey::new(field, SortDirection::Descending)),
                        Some(_) => None,
                        None => Some(SortKey::new(token, SortDirection::Ascending)),
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.with(|spec| spec.sort = sort)
    }

    /// `fields=name,price` → positive projection.
    pub fn limit_fields(self) -> Self {
        let projection: BTreeSet<String> = self
            .params
            .scalar("fields")
            .map(|s| comma_tokens(s).map(str::to_string).collect())
            .unwrap_or_default();
        self.with(|spec| spec.projection = projection)
    }

    /// `page` and `limit` as positive integers; never checked against a document count.
    pub fn paginate(self) -> Self {
        let page = positive_int(self.params.scalar("page")).unwrap_or(DEFAULT_PAGE);
        let limit = positive_int(self.params.scalar("limit")).unwrap_or(DEFAULT_LIMIT);
        self.with(|spec| spec.pagination = Pagination::new(page, limit))
    }

    pub fn build(self) -> QuerySpec {
        self.spec
    }

    fn with(mut self, f: impl FnOnce(&mut QuerySpec)) -> Self {
        f(&mut self.spec);
        self
    }
}

impl QuerySpec {
    /// Apply all four builder steps.
    pub fn from_params(params: &RawParams) -> Self {
        let spec = QueryBuilder::new(params).filter().sort().limit_fields().paginate().build();
        tracing::debug!(?spec, "built query spec");
        spec
    }
}

// Keys are rewritten at every depth, so a nested field literally named `gt` becomes `$gt` too.
fn rewrite_operators(value: &ParamValue) -> FilterValue {
    match value {
        ParamValue::Scalar(s) => FilterValue::Literal(s.clone()),
        ParamValue::Nested(map) => FilterValue::Ops(
            map.iter()
                .map(|(k, v)| {
                    let key = Comparison::from_plain(k)
                        .map(|op| op.operator().to_string())
                        .unwrap_or_else(|| k.clone());
                    (key, rewrite_operators(v))
                })
                .collect(),
        ),
    }
}

fn comma_tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn positive_int(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).filter(|n| *n >= 1)
}
