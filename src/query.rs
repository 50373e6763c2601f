//! Query string parsing and canonical serialization.
//!
//! Names and values are stored as decoded bytes, so escapes that do not form
//! valid UTF-8 (for example `%E9` from a Latin-1 client) come back out of
//! [`QueryParams::encode`] exactly as they went in.

use std::collections::BTreeMap;

/// Parsed query parameters.
///
/// Keys are kept sorted byte-wise so serialization is deterministic; values
/// keep the order in which they appeared in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
}

impl QueryParams {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    ///
    /// Parsing never fails. Empty segments are skipped, a segment without
    /// `=` yields an empty value, `+` decodes to a space and malformed
    /// escapes are kept verbatim. Segments containing `;` are dropped.
    pub fn parse(query: &str) -> Self {
        let mut params: BTreeMap<Vec<u8>, Vec<Vec<u8>>> = BTreeMap::new();

        for part in query.split('&') {
            if part.is_empty() || part.contains(';') {
                continue;
            }

            let (k, v) = part.split_once('=').unwrap_or((part, ""));
            params.entry(decode(k)).or_default().push(decode(v));
        }

        Self { params }
    }

    /// Parse an optional query string, treating `None` as empty.
    pub fn parse_opt(query: Option<&str>) -> Self {
        query.map(Self::parse).unwrap_or_default()
    }

    /// Values for a parameter.
    pub fn get(&self, name: &[u8]) -> Option<&[Vec<u8>]> {
        self.params.get(name).map(|v| v.as_slice())
    }

    /// Mutable values for a parameter.
    pub fn get_mut(&mut self, name: &[u8]) -> Option<&mut Vec<Vec<u8>>> {
        self.params.get_mut(name)
    }

    /// Whether the parameter is present.
    pub fn contains(&self, name: &[u8]) -> bool {
        self.params.contains_key(name)
    }

    /// Append a value to a parameter, creating it if needed.
    pub fn append(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.params.entry(name.into()).or_default().push(value.into());
    }

    /// Remove a parameter and all its values.
    pub fn remove(&mut self, name: &[u8]) -> Option<Vec<Vec<u8>>> {
        self.params.remove(name)
    }

    /// Iterate over parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[Vec<u8>])> {
        self.params.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Number of distinct parameter names.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Serialize into a canonical query string.
    ///
    /// Keys are emitted in sorted order, one `key=value` pair per value.
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .flat_map(|(k, values)| {
                values
                    .iter()
                    .map(move |v| format!("{}={}", encode(k), encode(v)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Query-escape a component: unreserved bytes stay, space becomes `+`.
fn encode(bytes: &[u8]) -> String {
    // urlencoding only emits '%' as part of an escape, so "%20" is always a space
    urlencoding::encode_binary(bytes).replace("%20", "+")
}

/// Decode `+` and percent escapes. Malformed escapes pass through as text.
fn decode(s: &str) -> Vec<u8> {
    let s = s.replace('+', " ");
    urlencoding::decode_binary(s.as_bytes()).into_owned()
}
