//! Variable interpolation for strings
//!
//! This module replaces `${NAME}` references in argv elements, working
//! directories and condition string literals.

use crate::error::{InterpolationError, InterpolationResult};
use regex::Regex;
use std::collections::BTreeMap;
use std::env;
use std::sync::OnceLock;

/// Maximum nesting of variables whose values reference other variables
const MAX_DEPTH: usize = 16;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is valid"))
}

/// Where `${NAME}` values may come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// The given map, then the host environment
    WithHost,
    /// The given map only
    MapOnly,
}

/// Interpolate `${NAME}` references, failing on undefined variables
///
/// Names are looked up in `vars` first and then in the host environment.
pub fn interpolate_strict(
    s: &str,
    vars: &BTreeMap<String, String>,
) -> InterpolationResult<String> {
    expand(s, vars, Lookup::WithHost, 0)
}

/// Interpolate using `vars` alone; the host environment is never consulted
pub fn interpolate_context(
    s: &str,
    vars: &BTreeMap<String, String>,
) -> InterpolationResult<String> {
    expand(s, vars, Lookup::MapOnly, 0)
}

/// Strictly interpolate a list of strings, failing on the first undefined variable
pub fn interpolate_list(
    list: &[String],
    vars: &BTreeMap<String, String>,
) -> InterpolationResult<Vec<String>> {
    list.iter()
        .map(|s| interpolate_strict(s, vars))
        .collect::<InterpolationResult<Vec<String>>>()
}

fn expand(
    s: &str,
    vars: &BTreeMap<String, String>,
    lookup: Lookup,
    depth: usize,
) -> InterpolationResult<String> {
    if depth > MAX_DEPTH {
        return Err(InterpolationError::RecursiveInterpolation);
    }

    let mut result = String::with_capacity(s.len());
    let mut last = 0;

    for caps in var_pattern().captures_iter(s) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();

        result.push_str(&s[last..whole.start()]);
        last = whole.end();

        let value = match (vars.get(name), lookup) {
            (Some(value), _) => value.clone(),
            (None, Lookup::WithHost) => env::var(name)
                .map_err(|_| InterpolationError::UndefinedVariable(name.to_string()))?,
            (None, Lookup::MapOnly) => {
                return Err(InterpolationError::UndefinedVariable(name.to_string()))
            }
        };

        result.push_str(&expand(&value, vars, lookup, depth + 1)?);
    }

    result.push_str(&s[last..]);
    Ok(result)
}
