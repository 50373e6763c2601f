//! Parameter name matching implementation.

use super::{Matcher, MatcherError};
use regex::bytes::Regex;

/// Compiled parameter name matcher.
#[derive(Debug, Clone)]
pub enum NameMatcherImpl {
    /// Exact name match
    Exact(Vec<u8>),
    /// Regex search over the name (unanchored unless the pattern anchors itself)
    Regex(Regex),
}

impl NameMatcherImpl {
    /// Matcher for an exact parameter name.
    pub fn exact(name: impl Into<Vec<u8>>) -> Self {
        Self::Exact(name.into())
    }

    /// Compile a name pattern.
    pub fn compile(pattern: &str) -> Result<Self, MatcherError> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|source| MatcherError::InvalidRegex {
                field: "paramNameRegex",
                source,
            })
    }

    /// Check a parameter name.
    pub fn matches_name(&self, name: &[u8]) -> bool {
        match self {
            Self::Exact(expected) => name == expected.as_slice(),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

impl Matcher for NameMatcherImpl {
    fn matches(&self, name: &[u8], _values: &[Vec<u8>]) -> bool {
        self.matches_name(name)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "param_name",
            Self::Regex(_) => "param_name_regex",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        let matcher = NameMatcherImpl::exact("page");
        assert!(matcher.matches_name(b"page"));
        assert!(!matcher.matches_name(b"pages"));
        assert!(!matcher.matches_name(b"Page"));
        assert_eq!(matcher.name(), "param_name");
    }

    #[test]
    fn test_regex_anchored() {
        let matcher = NameMatcherImpl::compile("^[abc]$").unwrap();
        assert!(matcher.matches_name(b"a"));
        assert!(matcher.matches_name(b"c"));
        assert!(!matcher.matches_name(b"e"));
        assert!(!matcher.matches_name(b"ab"));
        assert_eq!(matcher.name(), "param_name_regex");
    }

    #[test]
    fn test_regex_unanchored_searches() {
        let matcher = NameMatcherImpl::compile("token").unwrap();
        assert!(matcher.matches_name(b"access_token"));
        assert!(matcher.matches_name(b"token_type"));
        assert!(!matcher.matches_name(b"tok"));
    }

    #[test]
    fn test_regex_on_non_utf8_name() {
        let matcher = NameMatcherImpl::compile("^caf").unwrap();
        assert!(matcher.matches_name(b"caf\xE9"));
    }

    #[test]
    fn test_invalid_regex() {
        let err = NameMatcherImpl::compile("([a-z").unwrap_err();
        assert!(matches!(
            err,
            MatcherError::InvalidRegex {
                field: "paramNameRegex",
                ..
            }
        ));
    }
}
