//! Matcher values and their per-node checks.

use regex::Regex;
use serde_json::Value;
use std::fmt;

use crate::error::MatcherError;
use crate::expected::{Expected, IntoExample, json_eq, kind_of};
use crate::path::Path;
use crate::result::ResultSink;

/// A rule describing a class of acceptable values.
///
/// Built through the constructors below, which validate the example
/// eagerly; a `MatcherValue` that exists is always well formed.
#[derive(Debug, Clone, PartialEq)]
pub enum MatcherValue {
    /// Actual must deep-equal the example
    Equality(Expected),
    /// Actual must have the example's shape and type classes
    TypeMatch(Expected),
    /// Actual, as a string, must match a pattern from its start
    Regex(RegexMatcher),
    /// Actual must be an array of at least `min_count` elements, each
    /// matching `element`
    ArrayTemplate {
        /// Template every element is checked against
        element: Expected,
        /// Minimum accepted length
        min_count: usize,
    },
}

/// Compiled pattern plus its documentation example.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: String,
    example: String,
    anchored: Regex,
}

impl RegexMatcher {
    /// The pattern as written.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The example value.
    #[must_use]
    pub fn example(&self) -> &str {
        &self.example
    }

    /// Whether `text` matches starting at its first character.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }
}

impl PartialEq for RegexMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.example == other.example
    }
}

impl MatcherValue {
    /// Exact equality with `example`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::UnsupportedValue`] if the example is outside
    /// the allow-list.
    pub fn equality(example: impl IntoExample) -> Result<Self, MatcherError> {
        Ok(Self::Equality(example.into_example()?))
    }

    /// Type match against `example`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::UnsupportedValue`] if the example is outside
    /// the allow-list.
    pub fn like(example: impl IntoExample) -> Result<Self, MatcherError> {
        Ok(Self::TypeMatch(example.into_example()?))
    }

    /// Regex match; `example` documents a matching value.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn term(pattern: &str, example: impl Into<String>) -> Result<Self, MatcherError> {
        let anchored =
            Regex::new(&format!("^(?:{pattern})")).map_err(|e| MatcherError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::Regex(RegexMatcher {
            pattern: pattern.to_string(),
            example: example.into(),
            anchored,
        }))
    }

    /// Array of at least `min_count` elements shaped like `element`.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::UnsupportedValue`] if the element is outside
    /// the allow-list.
    pub fn each_like(element: impl IntoExample, min_count: usize) -> Result<Self, MatcherError> {
        Ok(Self::ArrayTemplate {
            element: element.into_example()?,
            min_count,
        })
    }

    /// Short name of the matcher kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Equality(_) => "equality",
            Self::TypeMatch(_) => "type",
            Self::Regex(_) => "regex",
            Self::ArrayTemplate { .. } => "array template",
        }
    }

    /// Example JSON this matcher stands for.
    #[must_use]
    pub fn example(&self) -> Value {
        match self {
            Self::Equality(example) | Self::TypeMatch(example) => example.to_example(),
            Self::Regex(re) => Value::String(re.example.clone()),
            Self::ArrayTemplate { element, min_count } => {
                Value::Array(vec![element.to_example(); (*min_count).max(1)])
            }
        }
    }

    /// Check `actual` against this matcher, reporting mismatches to `sink`
    /// at `path`. Every mismatch is reported; the walk does not stop at the
    /// first one.
    pub fn matches(&self, actual: &Value, path: &Path, sink: &mut dyn ResultSink) -> bool {
        match self {
            Self::Equality(example) => {
                let expected = example.to_example();
                if json_eq(&expected, actual) {
                    true
                } else {
                    sink.fail(&format!("expected {expected} but got {actual}"), Some(path))
                }
            }
            Self::TypeMatch(example) => match_type(example, actual, path, sink),
            Self::Regex(re) => {
                let text = match actual {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if re.is_match(&text) {
                    true
                } else {
                    sink.fail(
                        &format!("value {text:?} does not match regex '{}'", re.pattern),
                        Some(path),
                    )
                }
            }
            Self::ArrayTemplate { element, min_count } => {
                let Value::Array(items) = actual else {
                    return sink.fail(
                        &format!("expected an array but got {}", kind_of(actual)),
                        Some(path),
                    );
                };
                if items.len() < *min_count {
                    return sink.fail(
                        &format!(
                            "expected at least {min_count} elements but got {}",
                            items.len()
                        ),
                        Some(path),
                    );
                }
                let mut ok = true;
                for (i, item) in items.iter().enumerate() {
                    ok &= match_type(element, item, &path.index(i), sink);
                }
                ok
            }
        }
    }
}

impl fmt::Display for MatcherValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => write!(f, "regex({:?})", re.pattern),
            Self::ArrayTemplate { min_count, .. } => write!(f, "each_like(min={min_count})"),
            other => write!(f, "{}({})", other.name(), other.example()),
        }
    }
}

/// Type-mode walk: scalars match on type class, mappings on the example's
/// keys, sequences on the first example element.
fn match_type(example: &Expected, actual: &Value, path: &Path, sink: &mut dyn ResultSink) -> bool {
    match example {
        Expected::Matcher(m) => m.matches(actual, path, sink),
        Expected::Object(map) => {
            let Value::Object(actual_map) = actual else {
                return sink.fail(
                    &format!("expected an object but got {}", kind_of(actual)),
                    Some(path),
                );
            };
            let mut ok = true;
            for (key, value) in map {
                let child = path.key(key.clone());
                ok &= match actual_map.get(key) {
                    Some(found) => match_type(value, found, &child, sink),
                    None => sink.fail(&format!("missing key {key:?}"), Some(&child)),
                };
            }
            ok
        }
        Expected::Array(template) => {
            let Value::Array(items) = actual else {
                return sink.fail(
                    &format!("expected an array but got {}", kind_of(actual)),
                    Some(path),
                );
            };
            let Some(first) = template.first() else {
                return true;
            };
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                ok &= match_type(first, item, &path.index(i), sink);
            }
            ok
        }
        scalar => {
            if scalar.kind() == kind_of(actual) {
                true
            } else {
                sink.fail(
                    &format!(
                        "expected type {} but got {} ({actual})",
                        scalar.kind(),
                        kind_of(actual)
                    ),
                    Some(path),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::CollectingResult;
    use serde_json::json;

    fn check(matcher: &MatcherValue, actual: &Value) -> (bool, Vec<String>) {
        let mut sink = CollectingResult::default();
        let ok = matcher.matches(actual, &Path::root("body"), &mut sink);
        (ok, sink.failures)
    }

    #[test]
    fn test_construction_accepts_allowed_kinds() {
        assert!(MatcherValue::equality(()).is_ok());
        assert!(MatcherValue::equality(Vec::<Expected>::new()).is_ok());
        assert!(MatcherValue::equality(std::collections::BTreeMap::<String, i32>::new()).is_ok());
        assert!(MatcherValue::equality(1_i64).is_ok());
        assert!(MatcherValue::equality(1.0_f64).is_ok());
        assert!(MatcherValue::equality("string").is_ok());
    }

    #[test]
    fn test_construction_rejects_non_finite() {
        let err = MatcherValue::equality(f64::NAN).unwrap_err();
        assert!(err.to_string().contains("matcher must be one of "));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = MatcherValue::term("(unclosed", "x").unwrap_err();
        assert!(matches!(err, MatcherError::InvalidPattern { .. }));
    }

    #[test]
    fn test_equality_mismatch_message() {
        let m = MatcherValue::equality("bee").unwrap();
        assert!(check(&m, &json!("bee")).0);

        let (ok, failures) = check(&m, &json!("wasp"));
        assert!(!ok);
        assert_eq!(failures, vec![r#"expected "bee" but got "wasp" at body"#.to_string()]);
    }

    #[test]
    fn test_equality_large_integer_not_rounded() {
        let m = MatcherValue::equality(9_007_199_254_740_993_i64).unwrap();
        assert!(!check(&m, &json!(9_007_199_254_740_992.0)).0);
        assert!(check(&m, &json!(9_007_199_254_740_993_u64)).0);
    }

    #[test]
    fn test_type_match_scalars() {
        let m = MatcherValue::like("spam").unwrap();
        assert!(check(&m, &json!("ham")).0);
        assert!(!check(&m, &json!(12)).0);

        let n = MatcherValue::like(1_i64).unwrap();
        assert!(check(&n, &json!(2.5)).0);
    }

    #[test]
    fn test_type_match_mapping_ignores_extra_keys() {
        let m = MatcherValue::like(json!({"a": "spam", "b": 1})).unwrap();
        assert!(check(&m, &json!({"a": "x", "b": 2, "c": true})).0);

        let (ok, failures) = check(&m, &json!({"a": "x"}));
        assert!(!ok);
        assert_eq!(failures, vec![r#"missing key "b" at body.b"#.to_string()]);
    }

    #[test]
    fn test_type_match_sequence_uses_first_element() {
        let m = MatcherValue::like(json!([{"id": 1}])).unwrap();
        assert!(check(&m, &json!([])).0);
        assert!(check(&m, &json!([{"id": 2}, {"id": 3}])).0);

        let (ok, failures) = check(&m, &json!([{"id": 2}, {"id": "3"}]));
        assert!(!ok);
        assert!(failures[0].ends_with("at body[1].id"));
    }

    #[test]
    fn test_regex_matches_from_start() {
        let m = MatcherValue::term(r"\d+", "123").unwrap();
        assert!(check(&m, &json!("42abc")).0);
        assert!(check(&m, &json!(42)).0);

        let (ok, failures) = check(&m, &json!("abc42"));
        assert!(!ok);
        assert!(failures[0].contains(r"regex '\d+'"));
        assert!(failures[0].contains("abc42"));
    }

    #[test]
    fn test_array_template_min_count() {
        let m = MatcherValue::each_like(MatcherValue::like("x").unwrap(), 2).unwrap();
        assert!(!check(&m, &json!(["a"])).0);
        assert!(check(&m, &json!(["a", "b", "c"])).0);
        assert!(!check(&m, &json!("abc")).0);

        let (ok, failures) = check(&m, &json!(["a", 1, "c", false]));
        assert!(!ok);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].ends_with("at body[1]"));
        assert!(failures[1].ends_with("at body[3]"));
    }

    #[test]
    fn test_array_template_zero_min_accepts_empty() {
        let m = MatcherValue::each_like("x", 0).unwrap();
        assert!(check(&m, &json!([])).0);
    }

    #[test]
    fn test_example_rendering() {
        let m = MatcherValue::each_like(json!({"a": 1}), 2).unwrap();
        assert_eq!(m.example(), json!([{"a": 1}, {"a": 1}]));
        assert_eq!(MatcherValue::term("a+", "aaa").unwrap().example(), json!("aaa"));
    }
}
