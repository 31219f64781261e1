//! # Name Rules
//!
//! Feed, column and file names end up as storage path segments, so they are
//! restricted to a conservative character set.

use regex::Regex;
use std::sync::OnceLock;

use super::errors::{LoaderError, LoaderResult};

const MAX_NAME_LEN: usize = 255;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("name pattern is a valid regex")
    })
}

/// Check that a name is usable as a single path segment
pub fn validate_name(name: &str) -> LoaderResult<()> {
    if name.len() > MAX_NAME_LEN || name == "." || name == ".." || !name_pattern().is_match(name) {
        return Err(LoaderError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        assert!(validate_name("test_feed").is_ok());
        assert!(validate_name("data.csv").is_ok());
        assert!(validate_name("2024-sales.v2.tsv").is_ok());
    }

    #[test]
    fn test_rejects_path_tricks() {
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", ".hidden", "with space"] {
            assert!(
                matches!(validate_name(bad), Err(LoaderError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_overlong_names() {
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name(&long).is_err());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
    }
}
