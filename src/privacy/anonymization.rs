//! k-anonymity engine
//!
//! Runs the grouper over generalized records, harmonizes every retained
//! subgroup and assembles the released dataset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AnonymizationConfig;
use crate::error::Result;
use crate::log_operation_with_correlation;
use crate::privacy::grouping::{GroupingOutcome, group_and_suppress};
use crate::privacy::harmonization::harmonize;
use crate::privacy::record::Record;

/// Counts describing one anonymization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationSummary {
    pub run_id: Uuid,
    pub k: usize,
    pub input_records: usize,
    /// Sizes of the retained subgroups, in output order
    pub retained_subgroup_sizes: Vec<usize>,
    pub suppressed_records: usize,
    pub completed_at: DateTime<Utc>,
}

impl AnonymizationSummary {
    pub fn retained_records(&self) -> usize {
        self.retained_subgroup_sizes.iter().sum()
    }
}

/// The released dataset.
///
/// `records` holds every retained subgroup first, in grouping order, then
/// every suppressed record. Input row order is not preserved, so row `i` of
/// the output has no relation to row `i` of the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizedDataset {
    pub records: Vec<Record>,
    pub summary: AnonymizationSummary,
}

impl AnonymizedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The retained subgroups as slices of `records`.
    ///
    /// Stops at the first size that runs past the end of `records`.
    pub fn retained_subgroups(&self) -> impl Iterator<Item = &[Record]> {
        let mut offset = 0;
        self.summary.retained_subgroup_sizes.iter().map_while(move |&size| {
            let subgroup = self.records.get(offset..offset + size)?;
            offset += size;
            Some(subgroup)
        })
    }

    /// The suppressed tail of `records`, empty if the summary overruns it
    pub fn suppressed(&self) -> &[Record] {
        self.records
            .get(self.summary.retained_records()..)
            .unwrap_or_default()
    }
}

/// Applies k-anonymity with the configured field names
#[derive(Debug, Clone)]
pub struct Anonymizer {
    config: AnonymizationConfig,
}

impl Anonymizer {
    /// Validates the configuration up front so a bad k never reaches grouping
    pub fn new(config: AnonymizationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }

    /// Anonymize already-generalized records. The input is not modified.
    pub fn anonymize(&self, records: &[Record]) -> Result<AnonymizedDataset> {
        log_operation_with_correlation!("anonymize", logger, {
            logger.record("k", self.config.k);
            logger.record("input_records", records.len());

            let GroupingOutcome { kept, suppressed } =
                group_and_suppress(records, self.config.k, &self.config.group_key_fields)?;

            let retained_subgroup_sizes: Vec<usize> = kept.iter().map(Vec::len).collect();
            let mut output = Vec::with_capacity(records.len());
            for subgroup in kept {
                output.extend(harmonize(subgroup, &self.config.harmonized_field));
            }
            output.extend(suppressed.into_iter().flatten());

            let summary = AnonymizationSummary {
                run_id: Uuid::new_v4(),
                k: self.config.k,
                input_records: records.len(),
                suppressed_records: output.len() - retained_subgroup_sizes.iter().sum::<usize>(),
                retained_subgroup_sizes,
                completed_at: Utc::now(),
            };
            logger.record("retained_subgroups", summary.retained_subgroup_sizes.len());
            logger.record("suppressed_records", summary.suppressed_records);
            logger.info("Anonymization finished");

            Ok(AnonymizedDataset {
                records: output,
                summary,
            })
        })
    }
}

/// Anonymize with the default field layout and the given k
pub fn anonymize(records: &[Record], k: usize) -> Result<AnonymizedDataset> {
    Anonymizer::new(AnonymizationConfig::default().with_k(k))?.anonymize(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::privacy::record::FieldValue;

    fn person(band: &str, cep: &str, status: &str) -> Record {
        Record::new()
            .with("Nome", FieldValue::Suppressed)
            .with("Idade", band)
            .with("CEP", cep)
            .with("Estado_Civil", status)
    }

    #[test]
    fn test_zero_k_fails_before_grouping() {
        let err = Anonymizer::new(AnonymizationConfig::default().with_k(0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidK(0)));
        assert!(anonymize(&[], 0).is_err());
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let dataset = anonymize(&[], 3).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.summary.input_records, 0);
        assert_eq!(dataset.retained_subgroups().count(), 0);
    }

    #[test]
    fn test_retained_records_come_before_suppressed() {
        let mut records = vec![person("70+", "900***", "Single")];
        records.extend((0..3).map(|_| person("20–25", "501***", "Married")));

        let dataset = anonymize(&records, 3).unwrap();

        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.summary.retained_subgroup_sizes, vec![3]);
        assert_eq!(dataset.summary.suppressed_records, 1);
        assert!(dataset.records[..3].iter().all(|r| !r.is_suppressed()));
        assert!(dataset.suppressed().iter().all(Record::is_suppressed));
    }

    #[test]
    fn test_summary_larger_than_records_does_not_panic() {
        let records: Vec<Record> = (0..3).map(|_| person("20–25", "501***", "Married")).collect();
        let mut dataset = anonymize(&records, 3).unwrap();
        dataset.summary.retained_subgroup_sizes = vec![2, 5];

        let subgroups: Vec<usize> = dataset.retained_subgroups().map(<[Record]>::len).collect();
        assert_eq!(subgroups, vec![2]);
        assert!(dataset.suppressed().is_empty());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let records = vec![
            person("20–25", "501***", "Single"),
            person("20–25", "501***", "Married"),
            person("20–25", "501***", "Married"),
        ];
        let before = records.clone();
        let _ = anonymize(&records, 3).unwrap();
        assert_eq!(records, before);
    }
}
