//! Scenario tests for the linkage attack

#[cfg(test)]
mod tests {
    use crate::config::AnonymizationConfig;
    use crate::error::{AppError, ErrorSeverity};
    use crate::privacy::anonymization::anonymize;
    use crate::privacy::grouping::suppress_group;
    use crate::privacy::linkage::{LinkageAttack, MatchPolicy, simulate_attack};
    use crate::privacy::record::{FieldValue, Record};
    use crate::tests::framework::{generalize, generalized_person, population, raw_person};

    fn quasi_identifiers() -> Vec<String> {
        AnonymizationConfig::default().quasi_identifiers
    }

    #[test]
    fn test_generalized_row_is_a_candidate() {
        let original = vec![raw_person("Ana", 22, "50100-123", "Single")];
        let anonymized = vec![generalized_person("20–25", "501***", "Single")];

        let report = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();

        assert_eq!(report.reidentified(), 1);
        assert_eq!(report.matches[0].match_count, 1);
        assert_eq!(report.matches[0].record, original[0]);
        assert_eq!(report.rate, 1.0);
    }

    #[test]
    fn test_suppressed_row_is_never_a_candidate() {
        let original = vec![raw_person("Ana", 22, "50100-123", "Single")];
        let anonymized = suppress_group(&[generalized_person("20–25", "501***", "Single")]);

        let report = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();

        assert!(report.matches.is_empty());
        assert_eq!(report.rate, 0.0);
    }

    #[test]
    fn test_literal_mask_glyph_in_age_band_never_matches() {
        let original = vec![raw_person("Ana", 22, "50100-123", "Single")];
        let anonymized = vec![generalized_person("**", "501***", "Single")];

        let report = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();
        assert!(report.matches.is_empty());
    }

    #[test]
    fn test_malformed_band_is_a_non_match() {
        let original = vec![raw_person("Ana", 22, "50100-123", "Single")];
        let anonymized = vec![
            generalized_person("unknown", "501***", "Single"),
            generalized_person("70+", "501***", "Single"),
            generalized_person("20–25", "501***", "Single"),
        ];

        let report = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();

        assert_eq!(report.reidentified(), 1);
        assert_eq!(report.matches[0].match_count, 1);
    }

    #[test]
    fn test_ambiguous_matches_count_under_any_match_only() {
        let original = vec![raw_person("Ana", 22, "50100-123", "Single")];
        let anonymized = vec![
            generalized_person("20–25", "501***", "Single"),
            generalized_person("20–25", "501***", "Single"),
        ];

        let any = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();
        assert_eq!(any.reidentified(), 1);
        assert_eq!(any.matches[0].match_count, 2);

        let config = AnonymizationConfig::default().with_match_policy(MatchPolicy::UniqueMatch);
        let unique = LinkageAttack::new(&config).unwrap().run(&original, &anonymized);
        assert!(unique.matches.is_empty());
        assert_eq!(unique.policy, MatchPolicy::UniqueMatch);
    }

    #[test]
    fn test_non_quasi_identifier_uses_exact_match() {
        let original = vec![raw_person("Ana", 22, "50100-123", "Single")];
        let anonymized = vec![generalized_person("20–25", "501***", "Single")];

        // age compared verbatim: "22" never equals "20–25"
        let qis = vec!["CEP".to_string(), "Estado_Civil".to_string()];
        let report = simulate_attack(&original, &anonymized, &qis).unwrap();
        assert!(report.matches.is_empty());
    }

    #[test]
    fn test_missing_anonymized_cell_is_a_non_match() {
        let original = vec![raw_person("Ana", 22, "50100-123", "Single")];
        let anonymized = vec![
            generalized_person("20–25", "501***", "Single").with("Estado_Civil", FieldValue::Missing),
        ];

        let report = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();
        assert!(report.matches.is_empty());
    }

    #[test]
    fn test_matches_follow_original_order() {
        let original = vec![
            raw_person("Bia", 40, "60000-000", "Married"),
            raw_person("Ana", 22, "50100-123", "Single"),
            raw_person("Caio", 23, "50199-000", "Single"),
        ];
        let anonymized = vec![generalized_person("20–25", "501***", "Single")];

        let report = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();

        let names: Vec<String> = report
            .matches
            .iter()
            .map(|m| m.record.get_or_missing("Nome").to_string())
            .collect();
        assert_eq!(names, vec!["Ana", "Caio"]);
        assert!((report.rate - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parallel_attack_matches_serial() {
        let original = population(120);
        let anonymized = anonymize(&generalize(&original), 3).unwrap().records;

        let serial = LinkageAttack::new(&AnonymizationConfig::default())
            .unwrap()
            .run(&original, &anonymized);
        let parallel = LinkageAttack::new(&AnonymizationConfig::default().with_parallel_attack(true))
            .unwrap()
            .run(&original, &anonymized);

        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_rate_falls_as_suppression_grows() {
        let original = population(240);
        let generalized = generalize(&original);
        let qis = quasi_identifiers();

        let rates: Vec<f64> = [1, 5, 1000]
            .into_iter()
            .map(|k| {
                let anonymized = anonymize(&generalized, k).unwrap().records;
                simulate_attack(&original, &anonymized, &qis).unwrap().rate
            })
            .collect();

        assert_eq!(rates[0], 1.0);
        assert!(rates[1] <= rates[0]);
        assert_eq!(rates[2], 0.0);
        assert!(rates.iter().all(|rate| (0.0..=1.0).contains(rate)));
    }

    #[test]
    fn test_pipeline_run() {
        let config = AnonymizationConfig::default().with_k(5);
        let raw = population(100);

        let (dataset, report) = crate::run(&config, &raw).unwrap();

        assert_eq!(dataset.len(), raw.len());
        assert_eq!(report.original_records, raw.len());
        assert!(dataset.records.iter().all(|r| r.get("Nome") == Some(&FieldValue::Suppressed)));
        assert!(report.matches.iter().all(|m| m.match_count >= 5));
    }

    #[test]
    fn test_pipeline_run_reports_invalid_k_with_run_context() {
        let config = AnonymizationConfig::default().with_k(0);
        let raw = population(12);

        let err = crate::run(&config, &raw).unwrap_err();

        match err {
            AppError::ContextualError { message, context } => {
                assert!(message.contains("Invalid k: 0"));
                assert_eq!(context.operation.as_deref(), Some("anonymize"));
                assert_eq!(context.severity, ErrorSeverity::Fatal);
                assert_eq!(context.additional_context.get("k").map(String::as_str), Some("0"));
                assert_eq!(
                    context.additional_context.get("input_records").map(String::as_str),
                    Some("12")
                );
            }
            other => panic!("expected contextual error, got {other:?}"),
        }
    }

    #[test]
    fn test_end_to_end_run_with_fully_suppressed_release() {
        let original = population(30);
        let anonymized: Vec<Record> = anonymize(&generalize(&original), 31).unwrap().records;

        assert!(anonymized.iter().all(Record::is_suppressed));
        let report = simulate_attack(&original, &anonymized, &quasi_identifiers()).unwrap();
        assert_eq!(report.rate, 0.0);
        assert_eq!(report.original_records, 30);
    }
}
