//! k-anonymity engine and linkage attack simulator
//!
//! Field generalization feeds the grouping engine, whose output is attacked
//! by the linkage simulator to measure how much identity leaks through.

pub mod anonymization;
pub mod generalization;
pub mod grouping;
pub mod harmonization;
pub mod linkage;
pub mod record;

// Re-export commonly used items for convenience
pub use anonymization::{AnonymizationSummary, AnonymizedDataset, Anonymizer, anonymize};
pub use generalization::{AgeBands, FieldGeneralizer};
pub use grouping::{GeneralizationKey, GroupingOutcome, group_and_suppress, suppress_group};
pub use harmonization::harmonize;
pub use linkage::{LinkageAttack, LinkageMatch, LinkageReport, MatchPolicy, MatchRule, simulate_attack};
pub use record::{FieldValue, MASK_TOKEN, Record};
