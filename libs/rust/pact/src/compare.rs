//! Structural comparator.
//!
//! Walks an expected tree against actual JSON and reports every divergence
//! to the sink at its path. Matchers anywhere in the expected tree take over
//! the subtree they sit on.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::expected::{Expected, json_eq, kind_of};
use crate::header::parse_header;
use crate::path::Path;
use crate::result::ResultSink;

/// Headers compared parameter-wise instead of as opaque strings.
pub const STRUCTURED_HEADERS: &[&str] = &["content-type", "accept", "content-disposition"];

/// Parameters whose values compare case-insensitively.
const CASE_INSENSITIVE_PARAMS: &[&str] = &["charset"];

/// Compare `expected` against `actual`, reporting to `sink` under `path`.
///
/// - mappings: every expected key must be present; extra actual keys are
///   ignored; a missing key fails even when the expected value is null
/// - sequences: same length and element-wise comparison
/// - scalars: equal type and value, except that integers and floats share
///   the number type, so `1` matches `1.0`; an integer only matches a float
///   holding exactly that integer
pub fn compare(expected: &Expected, actual: &Value, path: &Path, sink: &mut dyn ResultSink) {
    match expected {
        Expected::Matcher(m) => {
            m.matches(actual, path, sink);
        }
        Expected::Object(map) => {
            let Value::Object(actual_map) = actual else {
                sink.fail(
                    &format!("expected an object but got {}", kind_of(actual)),
                    Some(path),
                );
                return;
            };
            for (key, value) in map {
                let child = path.key(key.clone());
                match actual_map.get(key) {
                    Some(found) => compare(value, found, &child, sink),
                    None => {
                        sink.fail(&format!("missing key {key:?}"), Some(&child));
                    }
                }
            }
        }
        Expected::Array(items) => {
            let Value::Array(actual_items) = actual else {
                sink.fail(
                    &format!("expected an array but got {}", kind_of(actual)),
                    Some(path),
                );
                return;
            };
            if items.len() != actual_items.len() {
                sink.fail(
                    &format!(
                        "expected {} elements but got {}",
                        items.len(),
                        actual_items.len()
                    ),
                    Some(path),
                );
            }
            for (i, (item, found)) in items.iter().zip(actual_items).enumerate() {
                compare(item, found, &path.index(i), sink);
            }
        }
        scalar => {
            let expected = scalar.to_example();
            if !json_eq(&expected, actual) {
                sink.fail(&format!("expected {expected} but got {actual}"), Some(path));
            }
        }
    }
}

/// Compare expected headers against actual `(name, value)` pairs.
///
/// Names match case-insensitively; repeated actual headers are joined with
/// `, `. Extra actual headers are ignored.
pub fn compare_headers(
    expected: &BTreeMap<String, Expected>,
    actual: &[(String, String)],
    path: &Path,
    sink: &mut dyn ResultSink,
) {
    for (name, expected_value) in expected {
        let child = path.key(name.clone());
        let values: Vec<&str> = actual
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect();
        if values.is_empty() {
            sink.fail(&format!("missing header {name:?}"), Some(&child));
            continue;
        }
        let actual_value = values.join(", ");

        if let Expected::Matcher(m) = expected_value {
            m.matches(&Value::String(actual_value), &child, sink);
            continue;
        }

        let expected_text = match expected_value.to_example() {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let matched = if is_structured(name) {
            header_values_match(&expected_text, &actual_value)
        } else {
            expected_text.trim() == actual_value.trim()
        };
        if !matched {
            sink.fail(
                &format!("expected header value {expected_text:?} but got {actual_value:?}"),
                Some(&child),
            );
        }
    }
}

fn is_structured(name: &str) -> bool {
    STRUCTURED_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Parameter-wise comparison of two structured header values.
///
/// Bare values (media types) must agree as a set, case-insensitively. Every
/// expected parameter must appear in the actual value; extra actual
/// parameters are tolerated.
#[must_use]
pub fn header_values_match(expected: &str, actual: &str) -> bool {
    let expected = parse_header(expected);
    let actual = parse_header(actual);

    let bare = |parts: &[crate::header::Part]| {
        let mut values: Vec<String> = parts
            .iter()
            .flat_map(|p| p.value.iter())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_lowercase())
            .collect();
        values.sort();
        values
    };
    if bare(&expected) != bare(&actual) {
        return false;
    }

    let actual_params: Vec<&(String, String)> =
        actual.iter().flat_map(|p| p.params.iter()).collect();
    expected.iter().flat_map(|p| p.params.iter()).all(|(k, v)| {
        actual_params.iter().any(|(ak, av)| {
            ak == k
                && if CASE_INSENSITIVE_PARAMS.contains(&k.as_str()) {
                    av.eq_ignore_ascii_case(v)
                } else {
                    av == v
                }
        })
    })
}
