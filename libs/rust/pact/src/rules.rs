//! Version-specific matching rule encodings.
//!
//! V3 attaches `{"matchers": [...]}` inline at the value's position. V2 keeps
//! the body as plain example data and collects rules in a flat map keyed by
//! a JSON-path-like string such as `$.body.items[*].id`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::MatcherError;
use crate::expected::Expected;
use crate::matcher::MatcherValue;

/// Matching rule wire version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleVersion {
    /// Legacy path-indexed rules
    V2,
    /// Inline rules
    V3,
}

impl fmt::Display for RuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2 => f.write_str("V2"),
            Self::V3 => f.write_str("V3"),
        }
    }
}

impl FromStr for RuleVersion {
    type Err = MatcherError;

    /// Parse a pact specification version such as `2.0.0` or `3.0.0`.
    /// Version 4 documents use the inline encoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let major = s.trim().trim_start_matches(['v', 'V']).split('.').next();
        match major {
            Some("2") => Ok(Self::V2),
            Some("3" | "4") => Ok(Self::V3),
            _ => Err(MatcherError::UnknownSpecification(s.to_string())),
        }
    }
}

/// A single rule as written on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    /// Rule kind: `equality`, `type` or `regex`
    #[serde(rename = "match")]
    pub kind: String,
    /// Pattern for `regex` rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Minimum length for array templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
}

impl RuleDescriptor {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            regex: None,
            min: None,
        }
    }

    /// `{"match": "equality"}`
    #[must_use]
    pub fn equality() -> Self {
        Self::new("equality")
    }

    /// `{"match": "type"}`
    #[must_use]
    pub fn type_match() -> Self {
        Self::new("type")
    }

    /// `{"match": "regex", "regex": pattern}`
    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            regex: Some(pattern.into()),
            ..Self::new("regex")
        }
    }

    /// `{"match": "type", "min": min}`
    #[must_use]
    pub fn min_type(min: usize) -> Self {
        Self {
            min: Some(min),
            ..Self::new("type")
        }
    }
}

/// Flat V2 rule table: path string to the rules at that path.
pub type RuleTable = BTreeMap<String, Vec<RuleDescriptor>>;

/// The version-specific wire form of a matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GeneratedRule {
    /// V3 descriptor attached at the value's position
    Inline {
        /// Rules for this node
        matchers: Vec<RuleDescriptor>,
    },
    /// V2 rules keyed by path, independent of the example's position
    PathIndexed(RuleTable),
}

impl GeneratedRule {
    /// The wire JSON of this rule.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Inline { matchers } => {
                serde_json::json!({ "matchers": matchers.iter().map(descriptor_json).collect::<Vec<_>>() })
            }
            Self::PathIndexed(table) => rule_table_json(table),
        }
    }
}

fn descriptor_json(descriptor: &RuleDescriptor) -> Value {
    let mut map = Map::new();
    map.insert("match".to_string(), Value::String(descriptor.kind.clone()));
    if let Some(regex) = &descriptor.regex {
        map.insert("regex".to_string(), Value::String(regex.clone()));
    }
    if let Some(min) = descriptor.min {
        map.insert("min".to_string(), Value::from(min));
    }
    Value::Object(map)
}

/// Render a V2 table the way legacy pact files store it: one merged
/// descriptor object per path.
#[must_use]
pub fn rule_table_json(table: &RuleTable) -> Value {
    Value::Object(
        table
            .iter()
            .map(|(path, rules)| {
                let mut merged = Map::new();
                for rule in rules {
                    if let Value::Object(fields) = descriptor_json(rule) {
                        merged.extend(fields);
                    }
                }
                (path.clone(), Value::Object(merged))
            })
            .collect(),
    )
}

/// Append an object key to a V2 rule path.
///
/// Plain identifiers use dot notation; anything else is bracket-quoted.
#[must_use]
pub fn v2_key(path: &str, key: &str) -> String {
    let plain = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        format!("{path}.{key}")
    } else {
        format!("{path}['{}']", key.replace('\'', "\\'"))
    }
}

impl MatcherValue {
    /// The descriptor for this node alone.
    #[must_use]
    pub fn descriptor(&self) -> RuleDescriptor {
        match self {
            Self::Equality(_) => RuleDescriptor::equality(),
            Self::TypeMatch(_) => RuleDescriptor::type_match(),
            Self::Regex(re) => RuleDescriptor::regex(re.pattern()),
            Self::ArrayTemplate { min_count, .. } => RuleDescriptor::min_type(*min_count),
        }
    }

    /// Serialize this matcher for `version`.
    ///
    /// V2 rules are rooted at `$` and include every nested matcher.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::NotAllowed`] when this matcher, or one nested
    /// in its example, has no encoding in `version`.
    pub fn generate_rule(&self, version: RuleVersion) -> Result<GeneratedRule, MatcherError> {
        match version {
            RuleVersion::V3 => Ok(GeneratedRule::Inline {
                matchers: vec![self.descriptor()],
            }),
            RuleVersion::V2 => {
                let mut table = RuleTable::new();
                collect_matcher_v2(self, "$", &mut table)?;
                Ok(GeneratedRule::PathIndexed(table))
            }
        }
    }
}

fn collect_matcher_v2(
    matcher: &MatcherValue,
    path: &str,
    table: &mut RuleTable,
) -> Result<(), MatcherError> {
    match matcher {
        MatcherValue::Equality(_) => Err(MatcherError::NotAllowed {
            matcher: matcher.name(),
            version: RuleVersion::V2,
        }),
        MatcherValue::TypeMatch(example) => {
            table
                .entry(path.to_string())
                .or_default()
                .push(matcher.descriptor());
            collect_expected_v2(example, path, table)
        }
        MatcherValue::Regex(_) => {
            table
                .entry(path.to_string())
                .or_default()
                .push(matcher.descriptor());
            Ok(())
        }
        MatcherValue::ArrayTemplate { element, .. } => {
            table
                .entry(path.to_string())
                .or_default()
                .push(matcher.descriptor());
            collect_expected_v2(element, &format!("{path}[*]"), table)
        }
    }
}

fn collect_expected_v2(
    expected: &Expected,
    path: &str,
    table: &mut RuleTable,
) -> Result<(), MatcherError> {
    match expected {
        Expected::Matcher(m) => collect_matcher_v2(m, path, table),
        Expected::Object(map) => map
            .iter()
            .try_for_each(|(k, v)| collect_expected_v2(v, &v2_key(path, k), table)),
        Expected::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, v)| collect_expected_v2(v, &format!("{path}[{i}]"), table)),
        Expected::Null | Expected::Bool(_) | Expected::Number(_) | Expected::String(_) => Ok(()),
    }
}

/// Collect V2 rules for every matcher in `expected`, rooted at `root`
/// (e.g. `$.body`).
///
/// # Errors
///
/// Returns [`MatcherError::NotAllowed`] if any matcher in the tree is
/// V3-only.
pub fn generate_matching_rule_v2(
    expected: &Expected,
    root: &str,
) -> Result<RuleTable, MatcherError> {
    let mut table = RuleTable::new();
    collect_expected_v2(expected, root, &mut table)?;
    Ok(table)
}

/// Render `expected` with V3 inline rules: every matcher node becomes
/// `{"value": <example>, "matchers": [...]}`.
#[must_use]
pub fn generate_matching_rule_v3(expected: &Expected) -> Value {
    match expected {
        Expected::Matcher(m) => {
            let value = match m.as_ref() {
                MatcherValue::Equality(example) | MatcherValue::TypeMatch(example) => {
                    generate_matching_rule_v3(example)
                }
                MatcherValue::Regex(re) => Value::String(re.example().to_string()),
                MatcherValue::ArrayTemplate { element, min_count } => {
                    let item = generate_matching_rule_v3(element);
                    Value::Array(vec![item; (*min_count).max(1)])
                }
            };
            serde_json::json!({
                "value": value,
                "matchers": [descriptor_json(&m.descriptor())],
            })
        }
        Expected::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), generate_matching_rule_v3(v)))
                .collect(),
        ),
        Expected::Array(items) => {
            Value::Array(items.iter().map(generate_matching_rule_v3).collect())
        }
        plain => plain.to_example(),
    }
}
