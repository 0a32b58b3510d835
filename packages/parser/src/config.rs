//! Configuration constants and validation functions for the parser.

use regex::Regex;
use std::sync::LazyLock;

/// Namespace of executable WS-BPEL 2.0 process definitions.
pub const BPEL_NAMESPACE: &str = "http://docs.oasis-open.org/wsbpel/2.0/process/executable";

/// File extension of process definition sources.
pub const PROCESS_FILE_EXTENSION: &str = "bpel";

/// File extension of compiled process envelopes.
pub const COMPILED_FILE_EXTENSION: &str = "cbp";

/// Separator of list-valued attributes such as `properties`.
pub const LIST_SEPARATOR: &[char] = &[' ', '\t', '\n', '\r', '\x0c'];

/// NCName pattern over Unicode letters and digits. Combining marks are not accepted.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NCNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-\x{B7}]*$").expect("valid regex")
});

/// Check whether a declaration name is a valid NCName.
///
/// # Examples
/// ```
/// use orkest_parser::config::is_ncname;
///
/// assert!(is_ncname("orderCorrelation"));
/// assert!(is_ncname("_cs-1.a"));
/// assert!(!is_ncname("1abc"));
/// assert!(!is_ncname("a:b"));
/// assert!(!is_ncname(""));
/// ```
#[must_use]
pub fn is_ncname(name: &str) -> bool {
    NCNAME_PATTERN.is_match(name)
}

/// Split a list-valued attribute into its tokens.
pub fn tokenize(value: &str) -> impl Iterator<Item = &str> {
    value.split(LIST_SEPARATOR).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ncname_accepts_unicode_letters() {
        assert!(is_ncname("bestelling"));
        assert!(is_ncname("éénheid"));
    }

    #[test]
    fn test_ncname_rejects_whitespace() {
        assert!(!is_ncname("a b"));
        assert!(!is_ncname(" a"));
    }

    #[test]
    fn test_tokenize_collapses_runs() {
        let tokens: Vec<_> = tokenize("  a\t\tb\n c  ").collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
        assert_eq!(tokenize("").count(), 0);
    }
}
