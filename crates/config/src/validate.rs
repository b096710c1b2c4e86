//! Startup validation of the bot credential.
//!
//! A credential that cannot work is a fatal startup error; the process must
//! not begin accepting requests with it.

use std::sync::LazyLock;

use regex::Regex;

/// Example credential shipped in `.env.example`. Accepted only in
/// development mode.
pub const PLACEHOLDER_TOKEN: &str = "123456789:EXAMPLE_TOKEN_FOR_DEVELOPMENT_ONLY";

/// `<numeric bot id>:<alnum, underscore, hyphen>`.
static TOKEN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d+:[A-Za-z0-9_-]+$").ok());

/// Why a credential was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("bot token is not set (configure [bot].token or BOT_TOKEN)")]
    Missing,

    #[error("the example bot token cannot be used outside development mode")]
    PlaceholderOutsideDevelopment,

    #[error("invalid bot token format (expected something like 1234567890:ABCDefGhIJKlmnOPQrsTUVwxyZ)")]
    Malformed,
}

/// A credential that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    /// The placeholder, tolerated because development mode is on.
    DevelopmentPlaceholder,
}

/// Check a bot credential syntactically.
///
/// Surrounding whitespace is ignored. The placeholder is checked before the
/// pattern so that it is rejected with a specific reason in production.
pub fn check_token(token: &str, development: bool) -> Result<TokenStatus, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }

    if token == PLACEHOLDER_TOKEN {
        return if development {
            Ok(TokenStatus::DevelopmentPlaceholder)
        } else {
            Err(TokenError::PlaceholderOutsideDevelopment)
        };
    }

    let matches = TOKEN_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(token));
    if !matches {
        return Err(TokenError::Malformed);
    }

    Ok(TokenStatus::Valid)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("1234567890:ABCDefGhIJKlmnOPQrsTUVwxyZ")]
    #[case("42:a_b-c")]
    #[case("  7:abc  ")]
    fn accepts_well_formed(#[case] token: &str) {
        assert_eq!(check_token(token, false), Ok(TokenStatus::Valid));
    }

    #[rstest]
    #[case("abc:def")]
    #[case("123456")]
    #[case("123:")]
    #[case(":abc")]
    #[case("123:abc def")]
    #[case("123:abc!")]
    fn rejects_malformed(#[case] token: &str) {
        assert_eq!(check_token(token, false), Err(TokenError::Malformed));
    }

    #[test]
    fn empty_is_missing() {
        assert_eq!(check_token("", true), Err(TokenError::Missing));
        assert_eq!(check_token("   ", false), Err(TokenError::Missing));
    }

    #[test]
    fn placeholder_only_in_development() {
        assert_eq!(
            check_token(PLACEHOLDER_TOKEN, true),
            Ok(TokenStatus::DevelopmentPlaceholder)
        );
        assert_eq!(
            check_token(PLACEHOLDER_TOKEN, false),
            Err(TokenError::PlaceholderOutsideDevelopment)
        );
    }
}
