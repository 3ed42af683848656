use std::{fmt, ops::Deref, sync::Arc};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Number of random bytes behind every token.
pub const TOKEN_BYTES: usize = 32;

/// Opaque identifier of a persisted session payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(Arc<str>);

impl Token {
    pub fn new<K: Into<Arc<str>>>(token: K) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Token {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Token {
    fn from(val: String) -> Self {
        Token::new(val)
    }
}

impl From<&str> for Token {
    fn from(val: &str) -> Self {
        Token::new(val)
    }
}

impl From<Token> for String {
    fn from(val: Token) -> Self {
        val.0.to_string()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token: &str = self.0.as_ref();
        let count = token.chars().count();
        if count > 24 {
            let head: String = token.chars().take(8).collect();
            let tail: String = token.chars().skip(count - 8).collect();
            write!(f, "{head}...{tail}")
        } else {
            f.write_str(token)
        }
    }
}

/// Generates a fresh token from the operating system's random source.
///
/// The token is the unpadded URL-safe base64 encoding of [`TOKEN_BYTES`]
/// random bytes, so it is always 43 cookie-safe characters long.
///
/// [OWASP recommends](https://cheatsheetseries.owasp.org/cheatsheets/Session_Management_Cheat_Sheet.html#session-id-entropy)
pub fn generate_token() -> Result<Token, rand::Error> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(Token::new(URL_SAFE_NO_PAD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<_> = (0..64).map(|_| generate_token().unwrap()).collect();
        assert_eq!(tokens.len(), 64);
    }

    #[test]
    fn test_display_shortens_long_tokens() {
        let token = Token::from("abcdefgh0123456789012345ZYXWVUTS");
        assert_eq!(token.to_string(), "abcdefgh...ZYXWVUTS");

        let short = Token::from("short");
        assert_eq!(short.to_string(), "short");
    }

    #[test]
    fn test_display_multibyte_token() {
        let token = Token::from("aéééééééééééééééééé");
        assert_eq!(token.to_string(), "aéééééééééééééééééé");

        let long = Token::from("äöüäöüäöüäöüäöüäöüäöüäöüß");
        assert_eq!(long.to_string(), "äöüäöüäö...üäöüäöüß");
    }
}
