//! Tabular records as consumed by the grouping engine and the attack simulator

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a suppressed value is rendered for display.
pub const MASK_TOKEN: &str = "**";

/// A single cell of a record.
///
/// Suppression is its own variant so a legitimate value that happens to read
/// `"**"` is never confused with a masked one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldValue {
    Value(String),
    Missing,
    Suppressed,
}

impl FieldValue {
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }

    /// The underlying text, if the cell holds real data
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::Suppressed => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.write_str(value),
            Self::Missing => Ok(()),
            Self::Suppressed => f.write_str(MASK_TOKEN),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Missing)
    }
}

/// An ordered mapping from attribute name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `field`, or `None` when the record has no such column
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Value of `field`, treating an absent column as missing
    pub fn get_or_missing(&self, field: &str) -> &FieldValue {
        static MISSING: FieldValue = FieldValue::Missing;
        self.get(field).unwrap_or(&MISSING)
    }

    /// Overwrite `field` in place, or append it if the record lacks it
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A copy with every field replaced by the suppression mask
    pub fn suppressed(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|(name, _)| (name.clone(), FieldValue::Suppressed))
                .collect(),
        }
    }

    /// True when every field is masked
    pub fn is_suppressed(&self) -> bool {
        !self.fields.is_empty() && self.fields.iter().all(|(_, value)| value.is_suppressed())
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.set(field, value);
        }
        record
    }
}
