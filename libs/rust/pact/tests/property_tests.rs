//! Property-based tests for the matching core.
//!
//! Tests validate:
//! - Comparing a plain value against itself never fails
//! - Mapping key order never matters, sequence order does
//! - Equality is always the equality marker in V3 and always rejected in V2
//! - Path rendering never prefixes the first segment
//! - Structured header comparison ignores charset case

use pact_verifier::result::LoggedResult;
use pact_verifier::{
    Expected, MatcherError, MatcherValue, Path, PathSegment, ResultSink, RuleVersion, compare,
    format_path,
};
use pact_verifier::compare::header_values_match;
use proptest::prelude::*;
use serde_json::{Value, json};
use test_utils::{
    charset_strategy, json_key_strategy, json_object_strategy, json_scalar_strategy,
    json_value_strategy, media_type_strategy, path_segments_strategy,
};

fn passes(expected: &Expected, actual: &Value) -> bool {
    let mut sink = LoggedResult::default();
    compare(expected, actual, &Path::root("body"), &mut sink);
    sink.success()
}

fn reversed_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.reverse();
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), reversed_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(reversed_keys).collect()),
        other => other.clone(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_compare_is_reflexive(value in json_value_strategy()) {
        prop_assert!(passes(&Expected::from(value.clone()), &value));
    }

    #[test]
    fn prop_mapping_key_order_irrelevant(value in json_object_strategy()) {
        prop_assert!(passes(&Expected::from(value.clone()), &reversed_keys(&value)));
    }

    #[test]
    fn prop_sequence_order_matters(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(a != b);
        let expected = Expected::from(json!([a, b]));
        prop_assert!(!passes(&expected, &json!([b, a])));
    }

    #[test]
    fn prop_extra_actual_keys_ignored(value in json_object_strategy(), extra in any::<i64>()) {
        let mut actual = value.clone();
        if let Value::Object(map) = &mut actual {
            map.insert("__extra__".to_string(), json!(extra));
        }
        prop_assert!(passes(&Expected::from(value), &actual));
    }

    #[test]
    fn prop_type_match_accepts_itself(
        map in prop::collection::btree_map(json_key_strategy(), json_scalar_strategy(), 0..6)
    ) {
        let value = Value::Object(map.into_iter().collect());
        let matcher: Expected = MatcherValue::like(value.clone()).unwrap().into();
        prop_assert!(passes(&matcher, &value));
    }

    #[test]
    fn prop_equality_v3_marker(value in json_value_strategy()) {
        let rule = MatcherValue::equality(value)
            .unwrap()
            .generate_rule(RuleVersion::V3)
            .unwrap();
        prop_assert_eq!(rule.to_json(), json!({"matchers": [{"match": "equality"}]}));
    }

    #[test]
    fn prop_equality_v2_not_allowed(value in json_value_strategy()) {
        let err = MatcherValue::equality(value)
            .unwrap()
            .generate_rule(RuleVersion::V2)
            .unwrap_err();
        let is_not_allowed = matches!(err, MatcherError::NotAllowed { .. });
        prop_assert!(is_not_allowed);
    }

    #[test]
    fn prop_non_finite_floats_rejected(f in prop_oneof![
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]) {
        let err = MatcherValue::like(f).unwrap_err();
        prop_assert!(err.to_string().contains("matcher must be one of "));
    }

    #[test]
    fn prop_format_path_first_segment_bare(segments in path_segments_strategy()) {
        let rendered = format_path(&segments);
        let PathSegment::Key(first) = &segments[0] else {
            unreachable!("first segment is always a key");
        };
        prop_assert!(rendered.starts_with(first.as_str()));
        prop_assert_eq!(
            rendered.matches('[').count(),
            segments.iter().filter(|s| matches!(s, PathSegment::Index(_))).count()
        );
    }

    #[test]
    fn prop_charset_case_insensitive(media in media_type_strategy(), charset in charset_strategy()) {
        let expected = format!("{media}; charset={}", charset.to_lowercase());
        let actual = format!("{media};charset={charset}");
        prop_assert!(header_values_match(&expected, &actual));
    }
}

#[test]
fn test_format_path_examples() {
    let segments = vec![
        PathSegment::from("a"),
        PathSegment::from("b"),
        PathSegment::from(2_usize),
        PathSegment::from("c"),
    ];
    assert_eq!(format_path(&segments), "a.b[2].c");
    assert_eq!(format_path(&[PathSegment::from("x")]), "x");
}
