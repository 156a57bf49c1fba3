//! Input rows before and after validation.

use std::collections::{BTreeMap, HashMap};

use crate::value::TypedValue;

/// A tabular row as parsed from the input source, before typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 0-based position of the row in the source.
    pub row_index: usize,
    /// Column name to raw cell text.
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    /// Create a raw record from column/value pairs.
    pub fn new<K, V>(row_index: usize, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            row_index,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a field, treating whitespace-only cells as absent.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// A row that passed validation, with every declared field typed.
///
/// Only the validator constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub row_index: usize,
    pub typed_fields: BTreeMap<String, TypedValue>,
}

impl ValidatedRecord {
    pub fn new(row_index: usize, typed_fields: BTreeMap<String, TypedValue>) -> Self {
        Self {
            row_index,
            typed_fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&TypedValue> {
        self.typed_fields.get(field)
    }
}
