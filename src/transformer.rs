//! Query parameter transformations: add, delete and modify.

use crate::matcher::ValueMatcherImpl;
use crate::query::QueryParams;
use memchr::memmem;
use std::collections::HashSet;

/// Placeholder in a literal new value that stands for the original value.
pub const ORIGINAL_VALUE_TOKEN: &str = "$1";

/// Append `value` to `name`, keeping any existing values.
pub fn add(mut params: QueryParams, name: &[u8], value: &[u8]) -> QueryParams {
    params.append(name, value);
    params
}

/// Remove every affected parameter with all its values.
pub fn delete(mut params: QueryParams, affected: &HashSet<Vec<u8>>) -> QueryParams {
    for name in affected {
        params.remove(name);
    }
    params
}

/// Rewrite the values of every affected parameter, keeping their order.
pub fn modify(
    mut params: QueryParams,
    affected: &HashSet<Vec<u8>>,
    new_value: &[u8],
    value_matcher: Option<&ValueMatcherImpl>,
) -> QueryParams {
    for name in affected {
        if let Some(values) = params.get_mut(name) {
            for value in values.iter_mut() {
                *value = rewrite_value(value, new_value, value_matcher);
            }
        }
    }
    params
}

/// Compute the new value for a single original value.
///
/// Values that fail the value pattern are returned unchanged. Matching
/// values go through the pattern's replacement template when there is one,
/// otherwise through the literal `new_value`.
pub fn rewrite_value(
    value: &[u8],
    new_value: &[u8],
    value_matcher: Option<&ValueMatcherImpl>,
) -> Vec<u8> {
    match value_matcher {
        Some(matcher) if !matcher.is_match(value) => value.to_vec(),
        Some(matcher) => matcher
            .replace(value)
            .unwrap_or_else(|| substitute_original(new_value, value)),
        None => substitute_original(new_value, value),
    }
}

/// Replace every literal `$1` in `template` with `original`.
///
/// This is a plain token substitution, not a regex capture reference; `$2`
/// and friends are left as they are.
pub fn substitute_original(template: &[u8], original: &[u8]) -> Vec<u8> {
    let token = ORIGINAL_VALUE_TOKEN.as_bytes();
    let mut out = Vec::with_capacity(template.len());
    let mut last = 0;

    for pos in memmem::find_iter(template, token) {
        out.extend_from_slice(&template[last..pos]);
        out.extend_from_slice(original);
        last = pos + token.len();
    }
    out.extend_from_slice(&template[last..]);

    out
}
