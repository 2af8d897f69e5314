use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::{Document, StoreError, ID_FIELD};

/// Query predicate over a single top-level field.
#[derive(Debug, Clone)]
pub enum Filter {
    All,
    /// Field equals value; an array field matches when any element equals it.
    Eq(String, Value),
    /// Case-insensitive regex over a string field or any string element of an array field.
    Regex(String, Regex),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn id(id: &str) -> Self {
        Filter::Eq(ID_FIELD.to_string(), Value::String(id.to_string()))
    }

    /// Compile `pattern` case-insensitively. An empty pattern matches every string.
    pub fn regex_ci(field: impl Into<String>, pattern: &str) -> Result<Self, StoreError> {
        let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Filter::Regex(field.into(), re))
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, want) => match doc.get(field) {
                Some(Value::Array(items)) if !want.is_array() => items.iter().any(|v| v == want),
                Some(v) => v == want,
                None => want.is_null(),
            },
            Filter::Regex(field, re) => match doc.get(field) {
                Some(Value::String(s)) => re.is_match(s),
                Some(Value::Array(items)) => items.iter().any(|v| v.as_str().is_some_and(|s| re.is_match(s))),
                _ => false,
            },
        }
    }

    /// Fields an upsert copies into a freshly inserted document.
    pub(crate) fn seed_document(&self) -> Document {
        let mut doc = Document::new();
        if let Filter::Eq(field, value) = self {
            doc.insert(field.clone(), value.clone());
        }
        doc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

// missing/null < numbers < strings < objects < arrays < booleans
fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
