//! Collapse one categorical attribute to a single value per subgroup

use std::collections::BTreeMap;

use tracing::trace;

use crate::privacy::record::{FieldValue, Record};

/// Most frequent present value of `attribute` across `records`.
///
/// Ties go to the smallest value in ascending order. Missing and suppressed
/// cells are not counted; `None` when nothing is present.
pub fn mode<'a>(records: &'a [Record], attribute: &str) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in records
        .iter()
        .filter_map(|record| record.get(attribute).and_then(FieldValue::as_str))
    {
        *counts.entry(value).or_insert(0) += 1;
    }

    // BTreeMap iterates ascending, so keeping the first maximum breaks ties low
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}

/// Overwrite `attribute` on every record with the subgroup's mode.
///
/// No other field is touched. A subgroup with no present value is returned
/// unchanged.
pub fn harmonize(subgroup: Vec<Record>, attribute: &str) -> Vec<Record> {
    let Some(representative) = mode(&subgroup, attribute).map(str::to_owned) else {
        return subgroup;
    };
    trace!(attribute, %representative, size = subgroup.len(), "Harmonizing subgroup");

    subgroup
        .into_iter()
        .map(|record| record.with(attribute, representative.clone()))
        .collect()
}
