//! Run configuration for the anonymization engine and the linkage attack
//!
//! Field names are never hard-coded in the engine; they all come from here.
//! The defaults reproduce the reference dataset layout (`Idade`, `CEP`,
//! `Estado_Civil`) with k = 10.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::privacy::linkage::MatchPolicy;

pub const ENV_K: &str = "KANON_K";
pub const ENV_MATCH_POLICY: &str = "KANON_MATCH_POLICY";
pub const ENV_PARALLEL_ATTACK: &str = "KANON_PARALLEL_ATTACK";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizationConfig {
    /// Minimum size of every retained group
    pub k: usize,
    /// Fields whose generalized values form the generalization key
    pub group_key_fields: Vec<String>,
    /// Field holding the age band label (interval matching in the attack)
    pub age_field: String,
    /// Field holding the masked postal prefix (prefix matching in the attack)
    pub postal_field: String,
    /// Categorical field collapsed to one value per retained subgroup
    pub harmonized_field: String,
    /// Fields compared with generalized-match semantics in the attack
    pub quasi_identifiers: Vec<String>,
    /// Every field the attack compares
    pub comparison_fields: Vec<String>,
    /// Direct identifiers blanked by the field generalizer
    pub direct_identifiers: Vec<String>,
    /// Number of leading postal digits kept by the generalizer and the attack
    pub postal_prefix_len: usize,
    pub match_policy: MatchPolicy,
    /// Run the attack's outer loop on the rayon pool
    pub parallel_attack: bool,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        let age = "Idade".to_string();
        let postal = "CEP".to_string();
        let marital = "Estado_Civil".to_string();
        let fields = vec![age.clone(), postal.clone(), marital.clone()];

        Self {
            k: 10,
            group_key_fields: vec![age.clone(), postal.clone()],
            age_field: age,
            postal_field: postal,
            harmonized_field: marital,
            quasi_identifiers: fields.clone(),
            comparison_fields: fields,
            direct_identifiers: vec![
                "Nome".to_string(),
                "Sexo".to_string(),
                "Escolaridade".to_string(),
            ],
            postal_prefix_len: 3,
            match_policy: MatchPolicy::AnyMatch,
            parallel_attack: false,
        }
    }
}

impl AnonymizationConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    pub fn with_quasi_identifiers<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quasi_identifiers = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parallel_attack(mut self, parallel: bool) -> Self {
        self.parallel_attack = parallel;
        self
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(AppError::InvalidK(self.k));
        }
        if self.group_key_fields.is_empty() {
            return Err(AppError::configuration("group_key_fields must not be empty"));
        }
        if self.group_key_fields[0] != self.age_field {
            return Err(AppError::configuration(format!(
                "group_key_fields must start with the age field {}",
                self.age_field
            )));
        }
        if self.harmonized_field.is_empty() {
            return Err(AppError::configuration("harmonized_field must be set"));
        }
        if self.group_key_fields.contains(&self.harmonized_field) {
            return Err(AppError::configuration(format!(
                "harmonized field {} is part of the generalization key",
                self.harmonized_field
            )));
        }
        if self.comparison_fields.is_empty() {
            return Err(AppError::configuration("comparison_fields must not be empty"));
        }
        if let Some(field) = self
            .quasi_identifiers
            .iter()
            .find(|field| !self.comparison_fields.contains(field))
        {
            return Err(AppError::configuration(format!(
                "quasi-identifier {field} is not a comparison field"
            )));
        }
        if self.postal_prefix_len == 0 {
            return Err(AppError::configuration("postal_prefix_len must be positive"));
        }
        Ok(())
    }

    /// Parse a JSON config document; absent keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `KANON_*` environment variables (and `.env`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(k) = read_env::<usize>(ENV_K)? {
            config.k = k;
        }
        if let Some(policy) = read_env::<MatchPolicy>(ENV_MATCH_POLICY)? {
            config.match_policy = policy;
        }
        if let Some(parallel) = read_env::<bool>(ENV_PARALLEL_ATTACK)? {
            config.parallel_attack = parallel;
        }

        debug!(k = config.k, policy = ?config.match_policy, "Loaded configuration from environment");
        config.validate()?;
        Ok(config)
    }
}

fn read_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::configuration(format!("{key}={raw}: {e}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(AppError::configuration(format!("{key}: {e}"))),
    }
}
