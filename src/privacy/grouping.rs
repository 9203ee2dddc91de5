//! Equivalence grouping with suppression
//!
//! Records are partitioned by their generalization key. Groups smaller than
//! k are suppressed whole. Larger groups are cut into consecutive chunks of k
//! records; a short trailing chunk is folded into the chunk before it, so
//! every retained subgroup holds between k and 2k - 1 records.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::error::{AppError, Result};
use crate::privacy::record::{FieldValue, Record};

/// Values of the generalization key fields, in key-field order.
///
/// Ordering is lexicographic over the values, with missing values sorting
/// after present ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeneralizationKey(pub Vec<FieldValue>);

impl GeneralizationKey {
    pub fn of(record: &Record, key_fields: &[String]) -> Self {
        Self(
            key_fields
                .iter()
                .map(|field| record.get_or_missing(field).clone())
                .collect(),
        )
    }
}

/// Output of [`group_and_suppress`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingOutcome {
    /// Retained subgroups, each with at least k records, in key order
    pub kept: Vec<Vec<Record>>,
    /// Fully masked groups, in key order
    pub suppressed: Vec<Vec<Record>>,
}

impl GroupingOutcome {
    pub fn kept_records(&self) -> usize {
        self.kept.iter().map(Vec::len).sum()
    }

    pub fn suppressed_records(&self) -> usize {
        self.suppressed.iter().map(Vec::len).sum()
    }
}

/// Partition records by exact equality of their generalization key.
///
/// Input order is kept inside each group.
pub fn partition(
    records: &[Record],
    key_fields: &[String],
) -> BTreeMap<GeneralizationKey, Vec<Record>> {
    let mut groups: BTreeMap<GeneralizationKey, Vec<Record>> = BTreeMap::new();
    for record in records {
        groups
            .entry(GeneralizationKey::of(record, key_fields))
            .or_default()
            .push(record.clone());
    }
    groups
}

/// Mask every field of every record. Suppressing twice changes nothing.
pub fn suppress_group(group: &[Record]) -> Vec<Record> {
    group.iter().map(Record::suppressed).collect()
}

fn split_into_chunks(group: Vec<Record>, k: usize) -> Vec<Vec<Record>> {
    let mut chunks = Vec::with_capacity(group.len().div_ceil(k));
    let mut iter = group.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(k).collect());
    }
    chunks
}

fn band_of<'a>(chunk: &'a [Record], band_field: &str) -> Option<&'a FieldValue> {
    chunk.first().map(|record| record.get_or_missing(band_field))
}

/// Fold a short trailing chunk into the previous one when both carry the
/// same age band; otherwise suppress the trailing chunk.
///
/// Chunks cut from one equivalence group always share the band, so the
/// suppression path only fires for hand-built input.
pub(crate) fn merge_or_suppress_remainder(
    chunks: &mut Vec<Vec<Record>>,
    k: usize,
    band_field: &str,
    suppressed: &mut Vec<Vec<Record>>,
) {
    let n = chunks.len();
    if n < 2 || chunks[n - 1].len() >= k {
        return;
    }

    let Some(remainder) = chunks.pop() else {
        return;
    };
    let previous = &mut chunks[n - 2];
    if band_of(&remainder, band_field) == band_of(previous.as_slice(), band_field) {
        trace!(remainder = remainder.len(), "Merging remainder into previous subgroup");
        previous.extend(remainder);
    } else {
        warn!(
            remainder = remainder.len(),
            "Remainder band differs from previous subgroup, suppressing it"
        );
        suppressed.push(suppress_group(&remainder));
    }
}

/// Split records into retained subgroups of at least `k` records and
/// suppressed groups.
///
/// The first key field is taken as the age band field for the remainder
/// merge check.
pub fn group_and_suppress(
    records: &[Record],
    k: usize,
    group_key_fields: &[String],
) -> Result<GroupingOutcome> {
    if k == 0 {
        return Err(AppError::InvalidK(k));
    }
    let Some(band_field) = group_key_fields.first() else {
        return Err(AppError::configuration("group_key_fields must not be empty"));
    };

    let mut outcome = GroupingOutcome::default();

    for (key, group) in partition(records, group_key_fields) {
        let size = group.len();
        if size < k {
            debug!(?key, size, k, "Group below k, suppressing");
            outcome.suppressed.push(suppress_group(&group));
            continue;
        }

        let mut chunks = split_into_chunks(group, k);
        merge_or_suppress_remainder(&mut chunks, k, band_field, &mut outcome.suppressed);

        for chunk in chunks {
            if chunk.len() < k {
                // a short chunk is never kept
                outcome.suppressed.push(suppress_group(&chunk));
                continue;
            }
            debug!(?key, size = chunk.len(), "Retaining subgroup");
            outcome.kept.push(chunk);
        }
    }

    Ok(outcome)
}
