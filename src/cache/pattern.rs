//! Wildcard key patterns.
//!
//! `*` matches any run of characters (including none); every other character
//! matches itself. Patterns are anchored to the whole key.

use glob::{MatchOptions, Pattern};
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled `*`-only wildcard pattern.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    inner: Pattern,
}

impl WildcardPattern {
    /// Compiles `pattern`, returning `None` for the empty pattern (which
    /// matches nothing).
    pub fn compile(pattern: &str) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }

        // glob gives `?` and `[..]` meaning and rejects `**` outside a path
        // component, so literal runs are escaped and star runs collapsed.
        let mut source = String::with_capacity(pattern.len() * 2);
        for (i, literal) in pattern.split('*').enumerate() {
            // Escaped literals never end in a bare `*`
            if i > 0 && !source.ends_with('*') {
                source.push('*');
            }
            source.push_str(&Pattern::escape(literal));
        }

        match Pattern::new(&source) {
            Ok(inner) => Some(Self { inner }),
            Err(e) => {
                debug!("Wildcard pattern {:?} failed to compile: {}", pattern, e);
                None
            }
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.inner.matches_with(key, MATCH_OPTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, key: &str) -> bool {
        WildcardPattern::compile(pattern).is_some_and(|p| p.matches(key))
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        assert!(WildcardPattern::compile("").is_none());
        assert!(!matches("", ""));
    }

    #[test]
    fn test_star_matches_everything() {
        assert!(matches("*", ""));
        assert!(matches("*", "anything/at:all"));
    }

    #[test]
    fn test_pattern_is_anchored() {
        assert!(matches("user:*", "user:42"));
        assert!(!matches("user:*", "admin:user:42"));
        assert!(matches("*:42", "user:42"));
        assert!(!matches("*:42", "user:420"));
        assert!(!matches("user", "user:42"));
    }

    #[test]
    fn test_inner_wildcards() {
        assert!(matches("api:*:v*", "api:users:v2"));
        assert!(matches("a*b*c", "abc"));
        assert!(!matches("a*b*c", "acb"));
    }

    #[test]
    fn test_consecutive_stars_collapse() {
        assert!(matches("a**b", "a-x-b"));
        assert!(matches("***", "x"));
        assert!(matches("a***", "a"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        assert!(matches("a.b", "a.b"));
        assert!(!matches("a.b", "a+b"));
        assert!(matches("q?", "q?"));
        assert!(!matches("q?", "qx"));
        assert!(matches("[x]", "[x]"));
        assert!(!matches("[x]", "x"));
        assert!(matches("a\\b", "a\\b"));
        assert!(matches("^(a|b)$+{1}", "^(a|b)$+{1}"));
        assert!(matches("list[*]", "list[3]"));
    }

    #[test]
    fn test_separators_are_plain_characters() {
        assert!(matches("*", "a/b/c"));
        assert!(matches("a*c", "a/b/c"));
        assert!(matches("*", ".hidden"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches("User:*", "user:1"));
    }
}
