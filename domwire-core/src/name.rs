//! Hierarchical class names.
//!
//! Server types are addressed from the client by a dotted or underscored path
//! (`App.Ajax.Sample`, `App_Ajax_Sample`). Internally a name is an ordered list
//! of identifier segments whose canonical form joins them with `::`.

use crate::error::{RequestError, SetupError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns `true` if `name` matches the identifier grammar.
///
/// The first character is an ASCII letter, an underscore or any character at or
/// above U+007F; the following ones may also be ASCII digits.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let head = |c: char| c.is_ascii_alphabetic() || c == '_' || c as u32 >= 0x7f;
    head(first) && chars.all(|c| head(c) || c.is_ascii_digit())
}

/// The separator used to write a class path on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Separator {
    /// `App.Ajax.Sample`
    #[default]
    #[serde(rename = ".")]
    Dot,
    /// `App_Ajax_Sample`
    #[serde(rename = "_")]
    Underscore,
}

impl Separator {
    /// The separator character.
    pub const fn as_char(self) -> char {
        match self {
            Separator::Dot => '.',
            Separator::Underscore => '_',
        }
    }

    /// Parses a separator from its textual form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "." => Some(Separator::Dot),
            "_" => Some(Separator::Underscore),
            _ => None,
        }
    }
}

/// A class name made of ordered path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName {
    segments: Vec<String>,
}

impl ClassName {
    /// Parses a canonical name (`App::Ajax::Sample`) given at registration time.
    pub fn parse(name: &str) -> Result<Self, SetupError> {
        let trimmed = name.trim().trim_matches(':');
        let segments: Vec<String> = trimmed.split("::").map(str::to_string).collect();
        if trimmed.is_empty() || !segments.iter().all(|s| is_identifier(s)) {
            return Err(SetupError::InvalidName(name.to_string()));
        }
        Ok(Self { segments })
    }

    /// Parses a name sent by the client.
    ///
    /// Both `.` and `_` are accepted as separators, as are `::` and `\`.
    /// Leading and trailing separators are trimmed.
    pub fn from_client(name: &str) -> Result<Self, RequestError> {
        let normalized = name.trim().replace("::", ".").replace(['_', '\\'], ".");
        let trimmed = normalized.trim_matches('.');
        let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if trimmed.is_empty() || !segments.iter().all(|s| is_identifier(s)) {
            return Err(RequestError::InvalidClassName(name.to_string()));
        }
        Ok(Self { segments })
    }

    /// Builds a name from already validated segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, SetupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || !segments.iter().all(|s| is_identifier(s)) {
            return Err(SetupError::InvalidName(segments.join("::")));
        }
        Ok(Self { segments })
    }

    /// The path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment, i.e. the bare type name.
    pub fn short_name(&self) -> &str {
        // Construction guarantees at least one segment.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The segments before the type name, joined canonically.
    pub fn namespace(&self) -> String {
        self.segments[..self.segments.len() - 1].join("::")
    }

    /// The canonical `::`-joined form.
    pub fn canonical(&self) -> String {
        self.segments.join("::")
    }

    /// The client-side form using `separator`.
    pub fn to_js(&self, separator: Separator) -> String {
        let mut buf = [0u8; 4];
        let sep: &str = separator.as_char().encode_utf8(&mut buf);
        self.segments.join(sep)
    }

    /// Returns `true` if this name lives under `namespace` (a canonical prefix).
    pub fn is_in_namespace(&self, namespace: &str) -> bool {
        let prefix: Vec<&str> = namespace
            .trim_matches(':')
            .split("::")
            .filter(|s| !s.is_empty())
            .collect();
        !prefix.is_empty()
            && prefix.len() < self.segments.len()
            && prefix.iter().zip(&self.segments).all(|(a, b)| *a == b.as_str())
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_grammar() {
        assert!(is_identifier("hello"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("é2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("with-dash"));
        assert!(!is_identifier("with space"));
    }

    #[test]
    fn test_client_name_normalization() {
        let dotted = ClassName::from_client(".App.Ajax.Sample.").unwrap();
        let underscored = ClassName::from_client("App_Ajax_Sample").unwrap();
        assert_eq!(dotted, underscored);
        assert_eq!(dotted.canonical(), "App::Ajax::Sample");
        assert_eq!(dotted.short_name(), "Sample");
        assert_eq!(dotted.namespace(), "App::Ajax");
    }

    #[test]
    fn test_client_name_rejects_garbage() {
        assert!(ClassName::from_client("").is_err());
        assert!(ClassName::from_client("App..Sample").is_err());
        assert!(ClassName::from_client("App.9lives").is_err());
    }

    #[test]
    fn test_js_forms() {
        let name = ClassName::parse("App::Ajax::Sample").unwrap();
        assert_eq!(name.to_js(Separator::Dot), "App.Ajax.Sample");
        assert_eq!(name.to_js(Separator::Underscore), "App_Ajax_Sample");
    }

    #[test]
    fn test_namespace_prefix() {
        let name = ClassName::parse("App::Ajax::Sample").unwrap();
        assert!(name.is_in_namespace("App"));
        assert!(name.is_in_namespace("App::Ajax"));
        assert!(!name.is_in_namespace("App::Ajax::Sample"));
        assert!(!name.is_in_namespace("Ajax"));
        assert!(!name.is_in_namespace(""));
    }
}
