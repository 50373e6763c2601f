//! Configuration types for the query modification middleware.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw configuration for a query modification instance.
///
/// Empty strings and absent fields are equivalent. The configuration is
/// validated and compiled by [`QueryModification::new`](crate::QueryModification::new).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryModificationConfig {
    /// Operation keyword: `add`, `modify` or `delete`
    #[serde(rename = "type")]
    pub modification_type: String,
    /// Exact parameter name to match (or to add)
    pub param_name: String,
    /// Regex matched against parameter names
    pub param_name_regex: String,
    /// Regex matched against parameter values
    pub param_value_regex: String,
    /// New value; when modifying, `$1` is replaced with the original value
    pub new_value: String,
    /// Replacement template applied through `param_value_regex`
    pub new_value_regex: String,
}

impl QueryModificationConfig {
    /// Config for an `add` operation.
    pub fn add(param_name: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            modification_type: ModificationType::Add.to_string(),
            param_name: param_name.into(),
            new_value: new_value.into(),
            ..Default::default()
        }
    }

    /// Config for a `modify` operation with no matcher set yet.
    pub fn modify(new_value: impl Into<String>) -> Self {
        Self {
            modification_type: ModificationType::Modify.to_string(),
            new_value: new_value.into(),
            ..Default::default()
        }
    }

    /// Config for a `delete` operation with no matcher set yet.
    pub fn delete() -> Self {
        Self {
            modification_type: ModificationType::Delete.to_string(),
            ..Default::default()
        }
    }

    pub fn with_param_name(mut self, name: impl Into<String>) -> Self {
        self.param_name = name.into();
        self
    }

    pub fn with_param_name_regex(mut self, pattern: impl Into<String>) -> Self {
        self.param_name_regex = pattern.into();
        self
    }

    pub fn with_param_value_regex(mut self, pattern: impl Into<String>) -> Self {
        self.param_value_regex = pattern.into();
        self
    }

    pub fn with_new_value_regex(mut self, template: impl Into<String>) -> Self {
        self.new_value_regex = template.into();
        self
    }

    /// Number of matcher kinds that are populated.
    pub fn matcher_count(&self) -> usize {
        [
            &self.param_name,
            &self.param_name_regex,
            &self.param_value_regex,
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .count()
    }
}

/// Modification operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModificationType {
    /// Append a value to a parameter
    Add,
    /// Rewrite values of matching parameters
    Modify,
    /// Remove matching parameters
    Delete,
}

impl ModificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }

    /// Parse an operation keyword. The empty keyword is valid and means
    /// "no operation".
    pub fn parse_keyword(keyword: &str) -> Result<Option<Self>, UnknownModificationType> {
        if keyword.is_empty() {
            return Ok(None);
        }
        keyword.parse().map(Some)
    }
}

impl fmt::Display for ModificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModificationType {
    type Err = UnknownModificationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "modify" => Ok(Self::Modify),
            "delete" => Ok(Self::Delete),
            other => Err(UnknownModificationType(other.to_string())),
        }
    }
}

/// An operation keyword that is not `add`, `modify` or `delete`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid modification type '{0}', expected add / modify / delete")]
pub struct UnknownModificationType(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryModificationConfig::default();
        assert!(config.modification_type.is_empty());
        assert_eq!(config.matcher_count(), 0);
    }

    #[test]
    fn test_config_parsing_yaml() {
        let yaml = r#"
type: modify
paramValueRegex: "^.*(p..sword)$"
newValueRegex: "no-$1"
"#;
        let config: QueryModificationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.modification_type, "modify");
        assert_eq!(config.param_value_regex, "^.*(p..sword)$");
        assert_eq!(config.new_value_regex, "no-$1");
        assert!(config.param_name.is_empty());
        assert_eq!(config.matcher_count(), 1);
    }

    #[test]
    fn test_config_parsing_json() {
        let json = r#"{"type": "add", "paramName": "newparam", "newValue": "newvalue"}"#;
        let config: QueryModificationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config, QueryModificationConfig::add("newparam", "newvalue"));
    }

    #[test]
    fn test_builders() {
        let config = QueryModificationConfig::delete()
            .with_param_name("a")
            .with_param_name_regex("^b");
        assert_eq!(config.modification_type, "delete");
        assert_eq!(config.matcher_count(), 2);
    }

    #[test]
    fn test_modification_type_keywords() {
        assert_eq!(
            ModificationType::parse_keyword("add"),
            Ok(Some(ModificationType::Add))
        );
        assert_eq!(
            ModificationType::parse_keyword("modify"),
            Ok(Some(ModificationType::Modify))
        );
        assert_eq!(
            ModificationType::parse_keyword("delete"),
            Ok(Some(ModificationType::Delete))
        );
        assert_eq!(ModificationType::parse_keyword(""), Ok(None));
        assert!(ModificationType::parse_keyword("Add").is_err());
        assert!(ModificationType::parse_keyword("bla").is_err());
    }
}
