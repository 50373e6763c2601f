//! Query parameter matchers.

mod name;
mod value;

pub use name::NameMatcherImpl;
pub use value::ValueMatcherImpl;

use crate::query::QueryParams;
use std::collections::HashSet;
use tracing::trace;

/// Trait for selecting query parameters.
pub trait Matcher: Send + Sync {
    /// Check whether a parameter, given its name and all its values, is selected.
    fn matches(&self, name: &[u8], values: &[Vec<u8>]) -> bool;

    /// Get the matcher name for debugging.
    fn name(&self) -> &'static str;
}

/// Compiled matcher combining every configured condition.
///
/// A parameter is affected when any condition selects it.
#[derive(Debug, Clone, Default)]
pub struct CompiledMatcher {
    /// Exact name and name pattern matchers
    names: Vec<NameMatcherImpl>,
    /// Value pattern (and its replacement template)
    value: Option<ValueMatcherImpl>,
}

impl CompiledMatcher {
    /// Compile matchers from the raw configuration fields. Empty fields are
    /// treated as unset.
    ///
    /// A replacement template needs a value pattern to refer to; setting
    /// `new_value_regex` alone is rejected.
    pub fn compile(
        param_name: &str,
        param_name_regex: &str,
        param_value_regex: &str,
        new_value_regex: &str,
    ) -> Result<Self, MatcherError> {
        let mut names = Vec::new();
        if !param_name.is_empty() {
            names.push(NameMatcherImpl::exact(param_name));
        }
        if !param_name_regex.is_empty() {
            names.push(NameMatcherImpl::compile(param_name_regex)?);
        }

        let replacement = non_empty(new_value_regex);
        let value = match non_empty(param_value_regex) {
            Some(pattern) => Some(ValueMatcherImpl::compile(pattern, replacement)?),
            None if replacement.is_some() => return Err(MatcherError::ReplacementWithoutPattern),
            None => None,
        };

        Ok(Self { names, value })
    }

    /// The value pattern, if configured.
    pub fn value_matcher(&self) -> Option<&ValueMatcherImpl> {
        self.value.as_ref()
    }

    /// The first condition that selects a parameter.
    pub fn selecting(&self, name: &[u8], values: &[Vec<u8>]) -> Option<&dyn Matcher> {
        self.names
            .iter()
            .map(|m| m as &dyn Matcher)
            .chain(self.value.as_ref().map(|m| m as &dyn Matcher))
            .find(|m| m.matches(name, values))
    }

    /// Names of all parameters selected in `params`.
    ///
    /// Evaluated against the mapping as given; callers pass the original
    /// request parameters so rewritten values are never re-scanned.
    pub fn affected_params(&self, params: &QueryParams) -> HashSet<Vec<u8>> {
        let mut affected = HashSet::new();

        for (name, values) in params.iter() {
            if let Some(matcher) = self.selecting(name, values) {
                trace!(
                    param = %String::from_utf8_lossy(name),
                    matcher = matcher.name(),
                    "Parameter selected"
                );
                affected.insert(name.to_vec());
            }
        }

        affected
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// Errors that can occur during matcher compilation.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid regex pattern in {field}: {source}")]
    InvalidRegex {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("newValueRegex can only be used together with paramValueRegex")]
    ReplacementWithoutPattern,
}
