//! Filter evaluation and ordering over JSON documents, used by the in-memory store.
//!
//! Equality: literals compare numerically against number fields when they look numeric, as text
//! against string fields, and as `true`/`false` against booleans; an array field matches when any
//! element does. Comparisons (`$gt` and friends): a numeric literal only orders number fields, any
//! other literal only orders string fields. Ordering follows jsonb: missing and null, then
//! strings, numbers, booleans, arrays, objects.

use crate::query::{is_numeric_literal, Comparison, FilterPredicate, FilterValue, SortDirection, SortKey};
use crate::store::{Document, StoreError};
use serde_json::Value;
use std::cmp::Ordering;

/// Reject unknown `$` operators before any document is looked at.
pub(crate) fn check_filter(filter: &FilterPredicate) -> Result<(), StoreError> {
    for cond in filter.values() {
        let FilterValue::Ops(ops) = cond else {
            continue;
        };
        if !ops.keys().any(|k| k.starts_with('$')) {
            continue;
        }
        for (op, operand) in ops {
            if Comparison::from_operator(op).is_none() || !matches!(operand, FilterValue::Literal(_)) {
                return Err(StoreError::UnsupportedOperator(op.clone()));
            }
        }
    }
    Ok(())
}

pub(crate) fn matches(doc: &Document, filter: &FilterPredicate) -> Result<bool, StoreError> {
    for (field, cond) in filter {
        if !matches_field(doc.get(field), cond)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_field(value: Option<&Value>, cond: &FilterValue) -> Result<bool, StoreError> {
    match cond {
        FilterValue::Literal(lit) => Ok(any_element(value, |v| compare_literal(v, lit) == Some(Ordering::Equal))),
        FilterValue::Ops(ops) if ops.keys().any(|k| k.starts_with('$')) => {
            for (op, operand) in ops {
                let cmp = Comparison::from_operator(op).ok_or_else(|| StoreError::UnsupportedOperator(op.clone()))?;
                let FilterValue::Literal(lit) = operand else {
                    return Err(StoreError::UnsupportedOperator(op.clone()));
                };
                let hit = value
                    .and_then(|v| order_against(v, lit))
                    .map_or(false, |ord| satisfies(ord, cmp));
                if !hit {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        FilterValue::Ops(_) => Ok(value == Some(&cond.to_json())),
    }
}

fn any_element(value: Option<&Value>, pred: impl Fn(&Value) -> bool) -> bool {
    match value {
        Some(Value::Array(items)) => items.iter().any(&pred),
        Some(v) => pred(v),
        None => false,
    }
}

fn satisfies(ord: Ordering, cmp: Comparison) -> bool {
    match cmp {
        Comparison::Gt => ord == Ordering::Greater,
        Comparison::Gte => ord != Ordering::Less,
        Comparison::Lt => ord == Ordering::Less,
        Comparison::Lte => ord != Ordering::Greater,
    }
}

/// Order for comparison operators; None when the field type does not fit the literal.
fn order_against(value: &Value, lit: &str) -> Option<Ordering> {
    match value {
        Value::Number(n) if is_numeric_literal(lit) => n.as_f64()?.partial_cmp(&lit.parse::<f64>().ok()?),
        Value::String(s) if !is_numeric_literal(lit) => Some(s.as_str().cmp(lit)),
        _ => None,
    }
}

/// Equality order of the stored value relative to the literal; None when they are not comparable.
fn compare_literal(value: &Value, lit: &str) -> Option<Ordering> {
    match value {
        Value::Number(n) if is_numeric_literal(lit) => n.as_f64()?.partial_cmp(&lit.parse::<f64>().ok()?),
        Value::String(s) => Some(s.as_str().cmp(lit)),
        Value::Bool(b) => lit.parse::<bool>().ok().map(|l| b.cmp(&l)),
        _ => None,
    }
}

pub(crate) fn compare_docs(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = compare_values(a.get(&key.field), b.get(&key.field));
        let ord = match key.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

// Missing and null first, then jsonb type order.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::Bool(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
