//! Parameter value matching implementation.

use super::{Matcher, MatcherError};
use regex::bytes::Regex;

/// Compiled value pattern, optionally paired with a replacement template.
///
/// The template uses the pattern's capture groups (`$1`, `${name}`), so it
/// only exists together with the pattern it refers to.
#[derive(Debug, Clone)]
pub struct ValueMatcherImpl {
    pattern: Regex,
    replacement: Option<Vec<u8>>,
}

impl ValueMatcherImpl {
    /// Compile a value pattern and its optional replacement template.
    pub fn compile(pattern: &str, replacement: Option<&str>) -> Result<Self, MatcherError> {
        let pattern = Regex::new(pattern).map_err(|source| MatcherError::InvalidRegex {
            field: "paramValueRegex",
            source,
        })?;

        Ok(Self {
            pattern,
            replacement: replacement.map(|r| r.as_bytes().to_vec()),
        })
    }

    /// Check a single value.
    pub fn is_match(&self, value: &[u8]) -> bool {
        self.pattern.is_match(value)
    }

    /// Check whether any of the values matches.
    pub fn matches_any(&self, values: &[Vec<u8>]) -> bool {
        values.iter().any(|v| self.is_match(v))
    }

    pub fn has_replacement(&self) -> bool {
        self.replacement.is_some()
    }

    /// Rewrite a value with the replacement template.
    ///
    /// Every match of the pattern is substituted. Returns `None` when no
    /// template is configured.
    pub fn replace(&self, value: &[u8]) -> Option<Vec<u8>> {
        self.replacement
            .as_deref()
            .map(|template| self.pattern.replace_all(value, template).into_owned())
    }
}

impl Matcher for ValueMatcherImpl {
    fn matches(&self, _name: &[u8], values: &[Vec<u8>]) -> bool {
        self.matches_any(values)
    }

    fn name(&self) -> &'static str {
        "param_value_regex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(vs: &[&str]) -> Vec<Vec<u8>> {
        vs.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_matches_any() {
        let matcher = ValueMatcherImpl::compile("^secretpassword$", None).unwrap();
        assert!(matcher.matches_any(&values(&["other", "secretpassword"])));
        assert!(!matcher.matches_any(&values(&["secretpassword2", "other"])));
        assert!(!matcher.matches_any(&[]));
    }

    #[test]
    fn test_replace_with_capture_group() {
        let matcher = ValueMatcherImpl::compile("^.*(p..sword)$", Some("no-$1")).unwrap();
        assert_eq!(
            matcher.replace(b"secretpassword"),
            Some(b"no-password".to_vec())
        );
    }

    #[test]
    fn test_replace_named_group() {
        let matcher =
            ValueMatcherImpl::compile(r"(?P<user>\w+)@example\.com", Some("${user}@redacted"))
                .unwrap();
        assert_eq!(
            matcher.replace(b"bob@example.com"),
            Some(b"bob@redacted".to_vec())
        );
    }

    #[test]
    fn test_replace_all_occurrences() {
        let matcher = ValueMatcherImpl::compile(r"\d", Some("#")).unwrap();
        assert_eq!(matcher.replace(b"a1b22"), Some(b"a#b##".to_vec()));
    }

    #[test]
    fn test_replace_keeps_non_utf8_bytes() {
        let matcher = ValueMatcherImpl::compile("^caf", Some("tea")).unwrap();
        assert_eq!(matcher.replace(b"caf\xE9"), Some(b"tea\xE9".to_vec()));
    }

    #[test]
    fn test_replace_without_template() {
        let matcher = ValueMatcherImpl::compile("x", None).unwrap();
        assert!(!matcher.has_replacement());
        assert_eq!(matcher.replace(b"x"), None);
    }

    #[test]
    fn test_invalid_regex() {
        let err = ValueMatcherImpl::compile("(unclosed", Some("$1")).unwrap_err();
        assert!(matches!(
            err,
            MatcherError::InvalidRegex {
                field: "paramValueRegex",
                ..
            }
        ));
    }
}
