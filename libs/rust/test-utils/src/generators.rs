//! Shared proptest generators.
//!
//! This module provides reusable generators for the values the verifier
//! compares: JSON documents, diagnostic paths and structured header values.

use pact_verifier::PathSegment;
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Generate object keys, including some that need bracket quoting.
pub fn json_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z][a-z0-9_]{0,8}",
        1 => "[a-z]{1,4} [a-z]{1,4}",
    ]
}

/// Generate JSON scalars: null, booleans, integers, finite floats, strings.
pub fn json_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e6..1.0e6f64).prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

/// Generate nested JSON documents.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    json_scalar_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map(json_key_strategy(), inner, 0..5)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Generate JSON objects only.
pub fn json_object_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(json_key_strategy(), json_value_strategy(), 0..6)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

/// Generate a single path segment.
pub fn path_segment_strategy() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,8}".prop_map(PathSegment::Key),
        (0usize..100).prop_map(PathSegment::Index),
    ]
}

/// Generate a path whose first segment is a key.
pub fn path_segments_strategy() -> impl Strategy<Value = Vec<PathSegment>> {
    (
        "[a-z][a-z0-9_]{0,8}",
        prop::collection::vec(path_segment_strategy(), 0..6),
    )
        .prop_map(|(root, rest)| {
            let mut segments = vec![PathSegment::Key(root)];
            segments.extend(rest);
            segments
        })
}

/// Generate media types.
pub fn media_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("application/json".to_string()),
        Just("application/hal+json".to_string()),
        Just("text/plain".to_string()),
        Just("text/html".to_string()),
    ]
}

/// Generate charset values in mixed case.
pub fn charset_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("utf-8"), Just("iso-8859-1"), Just("us-ascii")],
        any::<bool>(),
    )
        .prop_map(|(charset, upper)| {
            if upper {
                charset.to_uppercase()
            } else {
                charset.to_string()
            }
        })
}

/// Generate valid HTTP status codes.
pub fn http_status_code_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(200u16),
        Just(201u16),
        Just(204u16),
        Just(400u16),
        Just(404u16),
        Just(409u16),
        Just(500u16),
        Just(503u16),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn test_paths_start_with_key() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let segments = path_segments_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(matches!(segments[0], PathSegment::Key(_)));
        }
    }

    #[test]
    fn test_json_objects_are_objects() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let value = json_object_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            assert!(value.is_object());
        }
    }

    #[test]
    fn test_floats_are_finite() {
        let mut runner = TestRunner::default();
        for _ in 0..50 {
            let value = json_scalar_strategy()
                .new_tree(&mut runner)
                .unwrap()
                .current();
            if let Some(f) = value.as_f64() {
                assert!(f.is_finite());
            }
        }
    }
}
