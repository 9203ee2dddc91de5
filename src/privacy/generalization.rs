//! Field generalization applied before grouping
//!
//! - Ages are binned into fixed textual band labels
//! - Postal codes are cut to a digit prefix followed by `***`
//! - Direct identifiers are blanked with the suppression mask
//!
//! These are stateless per-record transforms. Their output is what the
//! grouping engine keys on.

use serde::{Deserialize, Serialize};

use crate::config::AnonymizationConfig;
use crate::error::{AppError, Result};
use crate::privacy::record::{FieldValue, Record};

/// Half-open age bins `[bounds[i], bounds[i + 1])`, one label per bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBands {
    bounds: Vec<i64>,
    labels: Vec<String>,
}

impl Default for AgeBands {
    fn default() -> Self {
        Self {
            bounds: vec![0, 20, 26, 32, 39, 45, 61, 70, 100],
            labels: ["0–19", "20–25", "26–31", "32–38", "39-45", "46-60", "61-69", "70+"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl AgeBands {
    pub fn new(bounds: Vec<i64>, labels: Vec<String>) -> Result<Self> {
        if bounds.len() < 2 || labels.len() != bounds.len() - 1 {
            return Err(AppError::validation(format!(
                "{} bounds need {} labels, got {}",
                bounds.len(),
                bounds.len().saturating_sub(1),
                labels.len()
            )));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AppError::validation("age band bounds must be strictly increasing"));
        }
        Ok(Self { bounds, labels })
    }

    /// Band label for `age`, `None` outside the covered range
    pub fn label_for(&self, age: i64) -> Option<&str> {
        self.bounds
            .windows(2)
            .position(|w| w[0] <= age && age < w[1])
            .map(|i| self.labels[i].as_str())
    }

    /// Generalize a raw age cell; unparsable or out-of-range ages become missing
    pub fn generalize(&self, raw: &FieldValue) -> FieldValue {
        match raw {
            FieldValue::Value(age) => age
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|age| self.label_for(age))
                .map(FieldValue::value)
                .unwrap_or(FieldValue::Missing),
            other => other.clone(),
        }
    }
}

/// Keep the first `prefix_len` digits of `raw` and pad with `***`
pub fn mask_postal_code(raw: &str, prefix_len: usize) -> String {
    let prefix: String = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(prefix_len)
        .collect();
    format!("{prefix}***")
}

/// Replace each listed field that the record carries with the suppression mask
pub fn blank_direct_identifiers(record: &mut Record, fields: &[String]) {
    for field in fields {
        if record.get(field).is_some() {
            record.set(field.clone(), FieldValue::Suppressed);
        }
    }
}

/// Produces the generalized quasi-identifiers the engine consumes
#[derive(Debug, Clone)]
pub struct FieldGeneralizer {
    age_field: String,
    postal_field: String,
    direct_identifiers: Vec<String>,
    postal_prefix_len: usize,
    bands: AgeBands,
}

impl FieldGeneralizer {
    pub fn new(config: &AnonymizationConfig) -> Self {
        Self {
            age_field: config.age_field.clone(),
            postal_field: config.postal_field.clone(),
            direct_identifiers: config.direct_identifiers.clone(),
            postal_prefix_len: config.postal_prefix_len,
            bands: AgeBands::default(),
        }
    }

    pub fn with_bands(mut self, bands: AgeBands) -> Self {
        self.bands = bands;
        self
    }

    /// A generalized copy of `record`; the input is left untouched
    pub fn generalize(&self, record: &Record) -> Record {
        let mut out = record.clone();
        blank_direct_identifiers(&mut out, &self.direct_identifiers);

        if let Some(age) = record.get(&self.age_field) {
            out.set(self.age_field.clone(), self.bands.generalize(age));
        }
        if let Some(postal) = record.get(&self.postal_field) {
            let masked = match postal {
                FieldValue::Value(raw) => {
                    FieldValue::Value(mask_postal_code(raw, self.postal_prefix_len))
                }
                other => other.clone(),
            };
            out.set(self.postal_field.clone(), masked);
        }
        out
    }

    pub fn generalize_all(&self, records: &[Record]) -> Vec<Record> {
        records.iter().map(|record| self.generalize(record)).collect()
    }
}
