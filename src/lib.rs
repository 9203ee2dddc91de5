//! k-anonymity anonymization with a simulated linkage attack.
//!
//! Raw records go through [`privacy::FieldGeneralizer`], are grouped and
//! suppressed by [`privacy::Anonymizer`], and the release is then attacked
//! with [`privacy::LinkageAttack`] to measure the re-identification rate.

pub mod config;
pub mod error;
pub mod logging;
pub mod privacy;

#[cfg(test)]
mod tests;

pub use config::AnonymizationConfig;
pub use error::{AppError, Result};
pub use privacy::{
    AnonymizedDataset, Anonymizer, FieldGeneralizer, FieldValue, LinkageAttack, LinkageReport,
    MatchPolicy, Record,
};

/// Generalize raw records, anonymize them and attack the release with the
/// raw records as auxiliary data.
pub fn run(config: &AnonymizationConfig, raw: &[Record]) -> Result<(AnonymizedDataset, LinkageReport)> {
    let generalized = FieldGeneralizer::new(config).generalize_all(raw);
    let dataset = Anonymizer::new(config.clone())
        .and_then(|anonymizer| anonymizer.anonymize(&generalized))
        .map_err(|e| {
            crate::log_error!(e, .with_operation("anonymize")
                .with_context("k", config.k.to_string())
                .with_context("input_records", raw.len().to_string()))
        })?;
    let report = LinkageAttack::new(config)
        .map_err(|e| crate::log_error!(e, .with_operation("linkage_attack")))?
        .run(raw, &dataset.records);
    Ok((dataset, report))
}
