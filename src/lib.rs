//! Query Modification middleware for Zentinel.
//!
//! Rewrites URL query parameters before a request reaches the next service:
//!
//! - `add` appends a value to a parameter
//! - `delete` removes every matching parameter
//! - `modify` rewrites the values of matching parameters, either with a
//!   literal value (`$1` stands for the original value) or through a regex
//!   replacement template using the value pattern's capture groups
//!
//! Parameters are selected by exact name, name pattern or value pattern.
//! The resulting query string is re-serialized with keys in sorted order.
//!
//! ## Configuration Example
//!
//! ```yaml
//! type: modify
//! paramValueRegex: "^.*(p..sword)$"
//! newValueRegex: "no-$1"
//! ```

pub mod config;
pub mod matcher;
pub mod modification;
pub mod query;
pub mod service;
pub mod transformer;

pub use config::{ModificationType, QueryModificationConfig};
pub use modification::{ConfigError, QueryModification, QueryModificationError};
pub use query::QueryParams;
pub use service::{QueryModificationLayer, QueryModificationService};
