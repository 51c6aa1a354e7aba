//! Session token generation.

use rand::rngs::OsRng;
use rand::Rng;
use uuid::Uuid;
use warden_core::id::Token;
use warden_core::utils::TokenStyle;

/// URL-safe alphabet used by the random token styles.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generates unguessable session tokens.
///
/// Random styles draw every character from the operating system's CSPRNG.
/// UUID styles rely on `uuid`'s v4 generator, which is backed by the same
/// source.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator {
    style: TokenStyle,
}

impl TokenGenerator {
    /// Create a generator for the given style.
    pub fn new(style: TokenStyle) -> Self {
        Self { style }
    }

    /// Get the generator's style.
    pub fn style(&self) -> TokenStyle {
        self.style
    }

    /// Generate a fresh token.
    pub fn generate(&self) -> Token {
        let value = match self.style {
            TokenStyle::Uuid => Uuid::new_v4().hyphenated().to_string(),
            TokenStyle::SimpleUuid => Uuid::new_v4().simple().to_string(),
            TokenStyle::Random32 => random_string(32),
            TokenStyle::Random64 => random_string(64),
            TokenStyle::Random128 => random_string(128),
        };
        Token::new(value)
    }
}

fn random_string(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_lengths() {
        let cases = [
            (TokenStyle::Uuid, 36),
            (TokenStyle::SimpleUuid, 32),
            (TokenStyle::Random32, 32),
            (TokenStyle::Random64, 64),
            (TokenStyle::Random128, 128),
        ];
        for (style, len) in cases {
            let token = TokenGenerator::new(style).generate();
            assert_eq!(token.as_str().len(), len, "style {}", style);
        }
    }

    #[test]
    fn test_random_tokens_are_url_safe() {
        let token = TokenGenerator::new(TokenStyle::Random128).generate();
        assert!(token
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let generator = TokenGenerator::new(TokenStyle::Random32);
        let tokens: HashSet<_> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_simple_uuid_has_no_hyphens() {
        let token = TokenGenerator::new(TokenStyle::SimpleUuid).generate();
        assert!(!token.as_str().contains('-'));
    }
}
