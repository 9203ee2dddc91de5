//! Fixtures shared by the scenario and property tests

use crate::config::AnonymizationConfig;
use crate::privacy::record::{FieldValue, Record};
use crate::privacy::generalization::FieldGeneralizer;

pub const MARITAL_STATUSES: [&str; 4] = ["Divorced", "Married", "Single", "Widowed"];

/// A raw (identified) person as found in the public dataset
pub fn raw_person(name: &str, age: u32, cep: &str, status: &str) -> Record {
    Record::new()
        .with("Nome", name)
        .with("Idade", age.to_string())
        .with("CEP", cep)
        .with("Estado_Civil", status)
        .with("Sexo", "F")
        .with("Escolaridade", "Superior")
}

/// An already-generalized person as handed to the engine
pub fn generalized_person(band: &str, cep: &str, status: &str) -> Record {
    Record::new()
        .with("Nome", FieldValue::Suppressed)
        .with("Idade", band)
        .with("CEP", cep)
        .with("Estado_Civil", status)
}

/// `n` generalized people sharing one generalization key
pub fn group(band: &str, cep: &str, n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| generalized_person(band, cep, MARITAL_STATUSES[i % MARITAL_STATUSES.len()]))
        .collect()
}

/// Deterministic population of raw people aged 20 to 44 over four postal areas
pub fn population(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let age = 20 + (i * 7) % 25;
            let cep = format!("{}{:02}-{:03}", 500 + (i % 4), i % 100, i % 1000);
            raw_person(
                &format!("Person {i}"),
                age as u32,
                &cep,
                MARITAL_STATUSES[(i / 3) % MARITAL_STATUSES.len()],
            )
        })
        .collect()
}

pub fn generalize(records: &[Record]) -> Vec<Record> {
    FieldGeneralizer::new(&AnonymizationConfig::default()).generalize_all(records)
}
