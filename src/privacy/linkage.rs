//! Linkage (re-identification) attack simulation
//!
//! Each original record is compared against every anonymized row. A row is a
//! candidate when all comparison fields agree under their rule:
//!
//! - age quasi-identifier: the original number lies inside the row's band
//! - postal quasi-identifier: the original digits start with the row's prefix
//! - anything else: exact equality
//!
//! Masked or missing anonymized cells never agree with anything. Malformed
//! band labels count as disagreement and are never reported as errors.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::AnonymizationConfig;
use crate::error::{AppError, Result};
use crate::log_operation_with_correlation;
use crate::privacy::record::{FieldValue, Record};

/// When an original record counts as re-identified.
///
/// `AnyMatch` is the optimistic attack model: a record is counted even when
/// many anonymized rows are equally plausible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// At least one candidate row
    #[default]
    AnyMatch,
    /// Exactly one candidate row
    UniqueMatch,
}

impl MatchPolicy {
    pub fn is_reidentified(self, candidates: usize) -> bool {
        match self {
            Self::AnyMatch => candidates >= 1,
            Self::UniqueMatch => candidates == 1,
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyMatch => f.write_str("any_match"),
            Self::UniqueMatch => f.write_str("unique_match"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "any" | "any_match" => Ok(Self::AnyMatch),
            "unique" | "unique_match" => Ok(Self::UniqueMatch),
            other => Err(AppError::validation(format!("unknown match policy: {other}"))),
        }
    }
}

/// How one comparison field is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Original number within the inclusive bounds of a band label
    Interval,
    /// Original digits start with the leading characters of a masked prefix
    Prefix { digits: usize },
    Exact,
}

impl MatchRule {
    /// Whether `original` agrees with the anonymized cell `anonymized`
    pub fn matches(self, original: &FieldValue, anonymized: &FieldValue) -> bool {
        let (Some(original), Some(anonymized)) = (original.as_str(), anonymized.as_str()) else {
            return false;
        };
        match self {
            Self::Interval => !anonymized.starts_with("**") && value_in_interval(original, anonymized),
            Self::Prefix { digits } => {
                !anonymized.starts_with("***") && postal_prefix_matches(original, anonymized, digits)
            }
            Self::Exact => original == anonymized,
        }
    }
}

/// Inclusive bounds of a band label such as `20–25` or `10000-20000`
pub fn parse_interval(label: &str) -> Option<(i64, i64)> {
    let normalized = label.replace('–', "-");
    let mut parts = normalized.split('-');
    let (Some(low), Some(high), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    Some((low.trim().parse().ok()?, high.trim().parse().ok()?))
}

/// True when `value` parses as an integer inside the band `label`
pub fn value_in_interval(value: &str, label: &str) -> bool {
    match (value.trim().parse::<i64>(), parse_interval(label)) {
        (Ok(value), Some((low, high))) => low <= value && value <= high,
        _ => false,
    }
}

/// True when the digits of `original` start with the first `digits`
/// characters of `masked` once its `*` are removed. An empty prefix matches
/// nothing.
pub fn postal_prefix_matches(original: &str, masked: &str, digits: usize) -> bool {
    let prefix: String = masked.chars().filter(|c| *c != '*').take(digits).collect();
    if prefix.is_empty() {
        return false;
    }
    let original_digits: String = original.chars().filter(char::is_ascii_digit).collect();
    original_digits.starts_with(&prefix)
}

/// An original record with at least one candidate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkageMatch {
    pub record: Record,
    pub match_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkageReport {
    /// Re-identified records, in original record order
    pub matches: Vec<LinkageMatch>,
    pub original_records: usize,
    pub policy: MatchPolicy,
    /// `matches.len() / original_records`, 0 for an empty original set
    pub rate: f64,
}

impl LinkageReport {
    pub fn reidentified(&self) -> usize {
        self.matches.len()
    }
}

/// A configured linkage attack
#[derive(Debug, Clone)]
pub struct LinkageAttack {
    rules: Vec<(String, MatchRule)>,
    policy: MatchPolicy,
    parallel: bool,
}

impl LinkageAttack {
    pub fn new(config: &AnonymizationConfig) -> Result<Self> {
        if config.comparison_fields.is_empty() {
            return Err(AppError::configuration("comparison_fields must not be empty"));
        }
        let rules = config
            .comparison_fields
            .iter()
            .map(|field| {
                let is_qi = config.quasi_identifiers.contains(field);
                let rule = if is_qi && *field == config.age_field {
                    MatchRule::Interval
                } else if is_qi && *field == config.postal_field {
                    MatchRule::Prefix {
                        digits: config.postal_prefix_len,
                    }
                } else {
                    MatchRule::Exact
                };
                (field.clone(), rule)
            })
            .collect();

        Ok(Self {
            rules,
            policy: config.match_policy,
            parallel: config.parallel_attack,
        })
    }

    pub fn rules(&self) -> &[(String, MatchRule)] {
        &self.rules
    }

    /// Whether `row` is a candidate for `original`
    pub fn is_candidate(&self, original: &Record, row: &Record) -> bool {
        self.rules
            .iter()
            .all(|(field, rule)| rule.matches(original.get_or_missing(field), row.get_or_missing(field)))
    }

    pub fn count_candidates(&self, original: &Record, anonymized: &[Record]) -> usize {
        anonymized
            .iter()
            .filter(|row| self.is_candidate(original, row))
            .count()
    }

    pub fn run(&self, original: &[Record], anonymized: &[Record]) -> LinkageReport {
        log_operation_with_correlation!("linkage_attack", logger, {
            logger.record("original_records", original.len());
            logger.record("anonymized_records", anonymized.len());
            logger.record("policy", self.policy);

            let counts: Vec<usize> = if self.parallel {
                original
                    .par_iter()
                    .map(|record| self.count_candidates(record, anonymized))
                    .collect()
            } else {
                original
                    .iter()
                    .map(|record| self.count_candidates(record, anonymized))
                    .collect()
            };

            let matches: Vec<LinkageMatch> = original
                .iter()
                .zip(counts)
                .filter(|(_, count)| self.policy.is_reidentified(*count))
                .map(|(record, match_count)| LinkageMatch {
                    record: record.clone(),
                    match_count,
                })
                .collect();

            let rate = if original.is_empty() {
                0.0
            } else {
                matches.len() as f64 / original.len() as f64
            };
            logger.record("reidentified", matches.len());
            logger.info(&format!("Re-identification rate: {:.2}%", rate * 100.0));

            LinkageReport {
                matches,
                original_records: original.len(),
                policy: self.policy,
                rate,
            }
        })
    }
}

/// Run the attack with the default field layout and the given quasi-identifiers
pub fn simulate_attack(
    original: &[Record],
    anonymized: &[Record],
    quasi_identifier_fields: &[String],
) -> Result<LinkageReport> {
    let config = AnonymizationConfig::default()
        .with_quasi_identifiers(quasi_identifier_fields.iter().cloned());
    Ok(LinkageAttack::new(&config)?.run(original, anonymized))
}
