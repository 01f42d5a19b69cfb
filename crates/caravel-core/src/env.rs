//! Environment variable parsing.
//!
//! Statically configured environment variables arrive as raw
//! `KEY=VALUE` strings and are validated before any remote call is
//! made.

use std::collections::HashMap;

use thiserror::Error;

/// A configured environment variable entry is not a `KEY=VALUE` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid environment variable [{entry}], expected KEY=VALUE")]
pub struct InvalidEnvironmentVariable {
    pub entry: String,
}

/// Parse `KEY=VALUE` entries into a map.
///
/// The key must be non-empty; the value may be empty (`KEY=`). The
/// value keeps any further `=` characters verbatim.
pub fn parse_env_entries(
    entries: &[String],
) -> Result<HashMap<String, String>, InvalidEnvironmentVariable> {
    let mut env = HashMap::with_capacity(entries.len());
    for entry in entries {
        let (key, value) = entry.split_once('=').ok_or_else(|| InvalidEnvironmentVariable {
            entry: entry.clone(),
        })?;
        if key.is_empty() {
            return Err(InvalidEnvironmentVariable {
                entry: entry.clone(),
            });
        }
        env.insert(key.to_string(), value.to_string());
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_key_value_pairs() {
        let env = parse_env_entries(&entries(&["FOO=bar", "BAZ=qux"])).unwrap();
        assert_eq!(env.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(env.get("BAZ").map(String::as_str), Some("qux"));
    }

    #[test]
    fn empty_value_is_allowed() {
        let env = parse_env_entries(&entries(&["FOO="])).unwrap();
        assert_eq!(env.get("FOO").map(String::as_str), Some(""));
    }

    #[test]
    fn value_keeps_embedded_equals() {
        let env = parse_env_entries(&entries(&["JAVA_OPTS=-Da=b"])).unwrap();
        assert_eq!(env.get("JAVA_OPTS").map(String::as_str), Some("-Da=b"));
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = parse_env_entries(&entries(&["FOO"])).unwrap_err();
        assert_eq!(err.entry, "FOO");
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(parse_env_entries(&entries(&["=bar"])).is_err());
    }

    #[test]
    fn later_entries_win() {
        let env = parse_env_entries(&entries(&["FOO=a", "FOO=b"])).unwrap();
        assert_eq!(env.get("FOO").map(String::as_str), Some("b"));
    }
}
