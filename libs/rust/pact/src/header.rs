//! RFC-822 style header value tokenizer.
//!
//! `parse_header("audio/*; q=0.2, audio/basic")` yields
//! `[Part(["audio/*"], []), Part(["audio/basic"], [("q", "0.2")])]`:
//! the value is split on unquoted `;`, each piece on unquoted `,`, and
//! every `name=value` option becomes a parameter of its piece.

use std::fmt;

/// One `;`-separated piece of a header value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Part {
    /// Bare (non `name=value`) options, in order
    pub value: Vec<String>,
    /// `(name, value)` parameters; names are lowercased, values unquoted
    pub params: Vec<(String, String)>,
}

impl Part {
    /// Whether a parameter with this (lowercase) name is present.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k == name)
    }

    /// Value of the named parameter, if present.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self
            .value
            .iter()
            .cloned()
            .chain(self.params.iter().map(|(k, v)| format!("{k}={v}")))
            .collect();
        write!(f, "<Part {}>", items.join(", "))
    }
}

/// Split `s` on `marker`, ignoring markers inside double quotes.
///
/// `s` is expected to start with `marker`; each yielded item is trimmed.
fn split_params(s: &str, marker: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = s;
    while let Some(stripped) = rest.strip_prefix(marker) {
        rest = stripped;
        let mut end = rest.find(marker);
        while let Some(e) = end {
            if e == 0 || unescaped_quotes(&rest[..e]) % 2 == 0 {
                break;
            }
            end = rest[e + 1..].find(marker).map(|n| n + e + 1);
        }
        let end = end.unwrap_or(rest.len());
        out.push(rest[..end].trim().to_string());
        rest = &rest[end..];
    }
    out
}

fn unescaped_quotes(s: &str) -> usize {
    s.matches('"').count() - s.matches("\\\"").count()
}

/// Parse a header value into its parts.
#[must_use]
pub fn parse_header(line: &str) -> Vec<Part> {
    split_params(&format!(";{line}"), ';')
        .into_iter()
        .map(|part| {
            let mut value = Vec::new();
            let mut params = Vec::new();
            for option in split_params(&format!(",{part}"), ',') {
                if let Some((name, raw)) = option.split_once('=') {
                    params.push((name.trim().to_lowercase(), unquote(raw.trim())));
                } else {
                    value.push(option);
                }
            }
            Part { value, params }
        })
        .collect()
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1]
            .replace("\\\\", "\\")
            .replace("\\\"", "\"")
    } else {
        value.to_string()
    }
}

/// Find the first parameter called `name` anywhere in the header.
///
/// ```
/// use pact_verifier::header::get_header_param;
///
/// let charset = get_header_param("text/html; charset=UTF-8", "charset");
/// assert_eq!(charset.as_deref(), Some("UTF-8"));
/// ```
#[must_use]
pub fn get_header_param(header: &str, name: &str) -> Option<String> {
    parse_header(header)
        .into_iter()
        .flat_map(|part| part.params)
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
}
