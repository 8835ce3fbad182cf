//! Account credentials for the update service.
//!
//! Read from the environment once at startup and validated against the
//! fixed upstream formats, so everything downstream can assume they are
//! well-formed. The token ends up embedded in link-resolution URLs; it is a
//! secret and must never reach logs or debug output.

use std::env;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Environment variable holding the account name.
pub const USERNAME_VAR: &str = "FACTORIO_USERNAME";
/// Environment variable holding the service token.
pub const TOKEN_VAR: &str = "FACTORIO_TOKEN";

static USERNAME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());
static TOKEN_FORMAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{30}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("FACTORIO_USERNAME is not a valid username (letters, digits, '_' and '-' only)")]
    InvalidUsername,
    #[error("FACTORIO_TOKEN is not a valid token (30 lowercase hex characters)")]
    InvalidToken,
}

/// A validated username/token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    username: String,
    token: String,
}

impl ServiceCredentials {
    pub fn new(username: &str, token: &str) -> Result<Self, CredentialsError> {
        if !USERNAME_FORMAT.is_match(username) {
            return Err(CredentialsError::InvalidUsername);
        }
        if !TOKEN_FORMAT.is_match(token) {
            return Err(CredentialsError::InvalidToken);
        }
        Ok(Self {
            username: username.to_string(),
            token: token.to_string(),
        })
    }

    /// Read and validate credentials from `FACTORIO_USERNAME` and
    /// `FACTORIO_TOKEN`.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let username = env::var(USERNAME_VAR).map_err(|_| CredentialsError::Missing(USERNAME_VAR))?;
        let token = env::var(TOKEN_VAR).map_err(|_| CredentialsError::Missing(TOKEN_VAR))?;
        Self::new(&username, &token)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The raw token, for embedding in request URLs. Never log the result.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_TOKEN: &str = "123456789012345678901234567890";

    #[test]
    fn accepts_well_formed_credentials() {
        let credentials = ServiceCredentials::new("AZaz09_-", GOOD_TOKEN).unwrap();
        assert_eq!(credentials.username(), "AZaz09_-");
        assert_eq!(credentials.token(), GOOD_TOKEN);
    }

    #[test]
    fn rejects_bad_usernames() {
        for bad in ["", "with space", "with.dot", "héllo"] {
            assert_eq!(
                ServiceCredentials::new(bad, GOOD_TOKEN),
                Err(CredentialsError::InvalidUsername),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_tokens() {
        for bad in [
            "",
            "12345678901234567890123456789",   // 29 chars
            "1234567890123456789012345678901", // 31 chars
            "12345678901234567890123456789G",  // not hex
            "12345678901234567890123456789F",  // uppercase hex
        ] {
            assert_eq!(
                ServiceCredentials::new("user", bad),
                Err(CredentialsError::InvalidToken),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let credentials = ServiceCredentials::new("user", GOOD_TOKEN).unwrap();
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("user"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(GOOD_TOKEN));
    }

    #[test]
    fn from_env_reads_both_variables() {
        env::set_var(USERNAME_VAR, "envuser");
        env::set_var(TOKEN_VAR, GOOD_TOKEN);
        let credentials = ServiceCredentials::from_env().unwrap();
        assert_eq!(credentials.username(), "envuser");
        env::remove_var(USERNAME_VAR);
        env::remove_var(TOKEN_VAR);
        assert_eq!(
            ServiceCredentials::from_env(),
            Err(CredentialsError::Missing(USERNAME_VAR))
        );
    }
}
