//! Destination credentials for the OAuth2 password grant.
//!
//! Credentials are supplied once at construction and never change for the
//! lifetime of the destination that owns them. Every token cache is keyed
//! by the credential set it was fetched with, so two destinations
//! configured with different accounts never share a bearer token.
//!
//! # Usage
//!
//! ```
//! use relay::credentials::Credentials;
//!
//! let creds = Credentials::new("client-id", "client-secret", "user@example.com", "hunter2");
//! creds.validate().unwrap();
//!
//! // Secrets never appear in debug output
//! assert!(!format!("{:?}", creds).contains("hunter2"));
//! ```

use crate::config::ConfigError;
use std::fmt;

/// Password-grant credentials for a destination account.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    /// Connected app consumer key
    pub client_id: String,

    /// Connected app consumer secret
    pub client_secret: String,

    /// API user login
    pub username: String,

    /// API user password (with security token appended, if the org needs one)
    pub password: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Fails with the first missing setting, checked in declaration order.
    ///
    /// Whitespace-only values count as missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingSetting(name));
            }
        }
        Ok(())
    }

    /// Form body for the password grant, in the order the token endpoint
    /// documents it.
    pub fn password_grant_form(&self) -> [(&'static str, &str); 5] {
        [
            ("grant_type", "password"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
