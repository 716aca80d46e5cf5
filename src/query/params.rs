//! Query-string parameters in nested form: `price[gte]=100` decodes to `{price: {gte: "100"}}`.

use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    Nested(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ParamValue::Scalar(s) => Some(s),
            ParamValue::Nested(_) => None,
        }
    }
}

/// Decoded query string of one request. A repeated key keeps its last value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawParams {
    entries: BTreeMap<String, ParamValue>,
}

impl RawParams {
    pub fn new() -> Self {
        RawParams::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = RawParams::new();
        for (k, v) in pairs {
            params.insert(k.as_ref(), v);
        }
        params
    }

    /// Insert a raw `key=value` pair, expanding bracket segments into nested maps.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let path = key_path(key);
        insert_path(&mut self.entries, &path, value.into());
    }

    /// Replace a top-level key with a scalar, dropping any nested value it had.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), ParamValue::Scalar(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_scalar)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawParams::from_pairs(iter)
    }
}

/// Split `a[b][c]` into `["a", "b", "c"]`. Malformed keys are kept whole; empty segments (`a[]`) are dropped.
fn key_path(key: &str) -> Vec<String> {
    let whole = || vec![key.to_string()];
    let Some(open) = key.find('[') else {
        return whole();
    };
    if open == 0 || !key.ends_with(']') {
        return whole();
    }
    let mut path = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return whole();
        };
        let Some(close) = inner.find(']') else {
            return whole();
        };
        let segment = &inner[..close];
        if segment.contains('[') {
            return whole();
        }
        if !segment.is_empty() {
            path.push(segment.to_string());
        }
        rest = &inner[close + 1..];
    }
    path
}

fn insert_path(map: &mut BTreeMap<String, ParamValue>, path: &[String], value: String) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    if tail.is_empty() {
        map.insert(head.clone(), ParamValue::Scalar(value));
        return;
    }
    let entry = map
        .entry(head.clone())
        .or_insert_with(|| ParamValue::Nested(BTreeMap::new()));
    if let ParamValue::Scalar(_) = entry {
        *entry = ParamValue::Nested(BTreeMap::new());
    }
    if let ParamValue::Nested(children) = entry {
        insert_path(children, tail, value);
    }
}
