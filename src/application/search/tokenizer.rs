//! Lowercased alphanumeric tokenization shared by indexing and querying.
//!
//! Both sides must agree on token boundaries: index tokens are matched by
//! query-token prefixes, so a divergence here would silently break recall.

/// Split `text` into lowercase alphanumeric tokens, dropping everything
/// else. Order follows the input; duplicates are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_non_alphanumeric() {
        assert_eq!(
            tokenize("Async Rust: pin & send"),
            vec!["async", "rust", "pin", "send"]
        );
    }

    #[test]
    fn keeps_digits_inside_tokens() {
        assert_eq!(tokenize("http2 push"), vec!["http2", "push"]);
    }

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
        assert!(tokenize("--- ///").is_empty());
    }

    #[test]
    fn lowercases_everything() {
        assert_eq!(tokenize("WebGL Aquarium"), vec!["webgl", "aquarium"]);
    }
}
