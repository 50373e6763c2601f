//! Query modification engine.

use crate::config::{ModificationType, QueryModificationConfig, UnknownModificationType};
use crate::matcher::{CompiledMatcher, MatcherError};
use crate::query::QueryParams;
use crate::transformer;
use http::uri::PathAndQuery;
use http::{Request, Uri};
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Compiled, immutable query modification.
///
/// Built once from a [`QueryModificationConfig`] and then shared read-only
/// between concurrent requests. All per-request state lives on the caller's
/// stack.
#[derive(Debug, Clone)]
pub struct QueryModification {
    /// Instance name (for logging)
    name: String,
    /// Operation; `None` passes the query through unchanged
    operation: Option<ModificationType>,
    /// Parameter targeted by `add`
    param_name: String,
    /// Literal new value
    new_value: String,
    /// Parameter selection for `modify` and `delete`
    matcher: CompiledMatcher,
}

impl QueryModification {
    /// Validate a configuration and compile it.
    pub fn new(
        name: impl Into<String>,
        config: &QueryModificationConfig,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let operation = ModificationType::parse_keyword(&config.modification_type)?;
        let matchers = config.matcher_count();

        match operation {
            Some(ModificationType::Add) => {
                if config.param_name.is_empty() {
                    return Err(ConfigError::MissingParamName);
                }
            }
            Some(ModificationType::Modify) | Some(ModificationType::Delete) | None => {
                if matchers == 0 {
                    return Err(ConfigError::MissingMatcher);
                }
            }
        }

        if matchers > 1 {
            warn!(
                name = %name,
                "It is discouraged to use multiple param matchers at once. Please proceed with caution"
            );
        }

        let matcher = CompiledMatcher::compile(
            &config.param_name,
            &config.param_name_regex,
            &config.param_value_regex,
            &config.new_value_regex,
        )?;

        info!(
            name = %name,
            operation = operation.map(|o| o.as_str()).unwrap_or("none"),
            "Query modification initialized"
        );

        Ok(Self {
            name,
            operation,
            param_name: config.param_name.clone(),
            new_value: config.new_value.clone(),
            matcher,
        })
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(name: impl Into<String>, yaml: &str) -> Result<Self, QueryModificationError> {
        let config: QueryModificationConfig = serde_yaml::from_str(yaml)?;
        Self::new(name, &config).map_err(QueryModificationError::from)
    }

    /// Create from a JSON configuration string.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, QueryModificationError> {
        let config: QueryModificationConfig = serde_json::from_str(json)?;
        Self::new(name, &config).map_err(QueryModificationError::from)
    }

    /// Load a configuration file. `.yaml` and `.yml` files are read as YAML,
    /// anything else as JSON.
    pub fn from_file(
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, QueryModificationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            Self::from_yaml(name, &content)
        } else {
            Self::from_json(name, &content)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> Option<ModificationType> {
        self.operation
    }

    /// Apply the modification to parsed parameters.
    pub fn modify_params(&self, params: QueryParams) -> QueryParams {
        match self.operation {
            Some(ModificationType::Add) => {
                transformer::add(params, self.param_name.as_bytes(), self.new_value.as_bytes())
            }
            Some(ModificationType::Delete) => {
                let affected = self.matcher.affected_params(&params);
                debug!(name = %self.name, affected = affected.len(), "Deleting query parameters");
                transformer::delete(params, &affected)
            }
            Some(ModificationType::Modify) => {
                let affected = self.matcher.affected_params(&params);
                debug!(name = %self.name, affected = affected.len(), "Modifying query parameters");
                transformer::modify(
                    params,
                    &affected,
                    self.new_value.as_bytes(),
                    self.matcher.value_matcher(),
                )
            }
            None => params,
        }
    }

    /// Apply the modification to a raw query string and return the canonical
    /// result.
    pub fn modify_query(&self, query: Option<&str>) -> String {
        self.modify_params(QueryParams::parse_opt(query)).encode()
    }

    /// Rewrite the query component of a URI, keeping scheme, authority and
    /// path. An empty result drops the `?`.
    pub fn apply_to_uri(&self, uri: &Uri) -> Uri {
        let query = self.modify_query(uri.query());

        if uri.query().unwrap_or("") == query {
            trace!(name = %self.name, "Query unchanged");
            return uri.clone();
        }

        match replace_query(uri, &query) {
            Ok(new_uri) => new_uri,
            Err(e) => {
                warn!(
                    name = %self.name,
                    uri = %uri,
                    error = %e,
                    "Could not rebuild request URI, leaving it unchanged"
                );
                uri.clone()
            }
        }
    }

    /// Rewrite the query string of a request in place.
    pub fn apply<B>(&self, req: &mut Request<B>) {
        let uri = self.apply_to_uri(req.uri());
        *req.uri_mut() = uri;
    }
}

fn replace_query(uri: &Uri, query: &str) -> Result<Uri, http::Error> {
    let path = uri.path();
    let path_and_query = if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidType(#[from] UnknownModificationType),

    #[error("either paramNameRegex or paramName or paramValueRegex must be set")]
    MissingMatcher,

    #[error("paramName must be set for add")]
    MissingParamName,

    #[error(transparent)]
    Matcher(#[from] MatcherError),
}

/// Errors loading a query modification from serialized configuration.
#[derive(Debug, thiserror::Error)]
pub enum QueryModificationError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
