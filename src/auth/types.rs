// Authentication types

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// Proactive refresh window subtracted from the server-declared expiry
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// IAM grant type for exchanging an API key
pub const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Opaque bearer token. The raw value only leaves through `secret()`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Short prefix suitable for logs
    pub fn preview(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({}...)", self.preview())
    }
}

/// Cached credential. Token and expiry are always replaced together.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: AccessToken,
    /// Server-declared expiry (issue time + expires_in)
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Usable while `now` is strictly before `expires_at - SAFETY_MARGIN_SECS`
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(SAFETY_MARGIN_SECS)
    }

    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now())
    }
}

/// IAM token endpoint success body
#[derive(Deserialize)]
pub struct IamTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}
