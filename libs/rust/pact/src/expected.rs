//! Expected-value trees.
//!
//! An [`Expected`] is what a consumer declares: plain JSON-like data that may
//! embed a [`MatcherValue`] at any depth. Matcher examples are built through
//! [`IntoExample`], which is only implemented for the allowed value kinds.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::MatcherError;
use crate::matcher::MatcherValue;

/// An expected value, possibly containing matchers.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer or finite float
    Number(Number),
    /// String
    String(String),
    /// Ordered sequence
    Array(Vec<Expected>),
    /// Key-ordered mapping
    Object(BTreeMap<String, Expected>),
    /// A matcher in place of a literal
    Matcher(Box<MatcherValue>),
}

impl Expected {
    /// Build a mapping from `(key, value)` pairs.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a sequence.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Convert any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::UnsupportedValue`] when the value has no JSON
    /// representation, e.g. a map keyed by tuples.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, MatcherError> {
        serde_json::to_value(value)
            .map(Self::from)
            .map_err(|e| MatcherError::unsupported(format!("({e})")))
    }

    /// Plain example JSON with every matcher replaced by its example.
    #[must_use]
    pub fn to_example(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_example).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_example()))
                    .collect::<Map<_, _>>(),
            ),
            Self::Matcher(m) => m.example(),
        }
    }

    /// The matcher at this node, if any.
    #[must_use]
    pub fn as_matcher(&self) -> Option<&MatcherValue> {
        match self {
            Self::Matcher(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this node or any descendant is a matcher.
    #[must_use]
    pub fn contains_matcher(&self) -> bool {
        match self {
            Self::Matcher(_) => true,
            Self::Array(items) => items.iter().any(Self::contains_matcher),
            Self::Object(map) => map.values().any(Self::contains_matcher),
            _ => false,
        }
    }

    /// Type class name used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Matcher(_) => "matcher",
        }
    }
}

/// Type class name of an actual value.
#[must_use]
pub const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deep equality where numbers compare by value (`1 == 1.0`).
#[must_use]
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

#[allow(clippy::float_cmp)]
fn numbers_eq(x: &Number, y: &Number) -> bool {
    match (integer(x), integer(y)) {
        (Some(a), Some(b)) => a == b,
        (Some(i), None) => y.as_f64().is_some_and(|f| float_is_integer(f, i)),
        (None, Some(i)) => x.as_f64().is_some_and(|f| float_is_integer(f, i)),
        (None, None) => match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Exact check of a float against an integer, never widening the integer
/// to `f64`. Floats beyond the `i128` range saturate and cannot equal a
/// JSON integer.
#[allow(clippy::cast_possible_truncation)]
fn float_is_integer(f: f64, i: i128) -> bool {
    f.is_finite() && f.fract() == 0.0 && f as i128 == i
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<MatcherValue> for Expected {
    fn from(matcher: MatcherValue) -> Self {
        Self::Matcher(Box::new(matcher))
    }
}

impl From<&str> for Expected {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Expected {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Expected {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Self>> for Expected {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl From<BTreeMap<String, Self>> for Expected {
    fn from(map: BTreeMap<String, Self>) -> Self {
        Self::Object(map)
    }
}

macro_rules! integer_expected {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expected {
                fn from(n: $t) -> Self {
                    Self::Number(Number::from(n))
                }
            }

            impl IntoExample for $t {
                fn into_example(self) -> Result<Expected, MatcherError> {
                    Ok(Expected::from(self))
                }
            }
        )*
    };
}

integer_expected!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Conversion into a matcher example.
///
/// Implemented only for null, booleans, integers, floats, strings,
/// sequences, string-keyed mappings, JSON values, [`Expected`] trees and
/// matchers. Anything else does not compile; finite-ness of floats is
/// checked at runtime.
pub trait IntoExample {
    /// Validate and convert.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::UnsupportedValue`] for values outside the
    /// allow-list that the type system cannot exclude.
    fn into_example(self) -> Result<Expected, MatcherError>;
}

impl IntoExample for Expected {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Ok(self)
    }
}

impl IntoExample for MatcherValue {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Ok(Expected::from(self))
    }
}

impl IntoExample for Value {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Ok(Expected::from(self))
    }
}

impl IntoExample for () {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Ok(Expected::Null)
    }
}

impl IntoExample for bool {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Ok(Expected::Bool(self))
    }
}

impl IntoExample for &str {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Ok(Expected::from(self))
    }
}

impl IntoExample for String {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Ok(Expected::String(self))
    }
}

impl IntoExample for f64 {
    fn into_example(self) -> Result<Expected, MatcherError> {
        Number::from_f64(self)
            .map(Expected::Number)
            .ok_or_else(|| MatcherError::unsupported(format!("non-finite float ({self})")))
    }
}

impl IntoExample for f32 {
    fn into_example(self) -> Result<Expected, MatcherError> {
        f64::from(self).into_example()
    }
}

impl<T: IntoExample> IntoExample for Option<T> {
    fn into_example(self) -> Result<Expected, MatcherError> {
        self.map_or(Ok(Expected::Null), IntoExample::into_example)
    }
}

impl<T: IntoExample> IntoExample for Vec<T> {
    fn into_example(self) -> Result<Expected, MatcherError> {
        self.into_iter()
            .map(IntoExample::into_example)
            .collect::<Result<Vec<_>, _>>()
            .map(Expected::Array)
    }
}

impl<T: IntoExample> IntoExample for BTreeMap<String, T> {
    fn into_example(self) -> Result<Expected, MatcherError> {
        self.into_iter()
            .map(|(k, v)| v.into_example().map(|v| (k, v)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Expected::Object)
    }
}

impl<T: IntoExample, S: BuildHasher> IntoExample for HashMap<String, T, S> {
    fn into_example(self) -> Result<Expected, MatcherError> {
        self.into_iter().collect::<BTreeMap<_, _>>().into_example()
    }
}
