use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::Mutex;

use super::refresh;
use super::types::{AccessToken, Credential};
use crate::error::AuthError;

/// Credential manager
/// Owns the IAM bearer token and refreshes it under a single lock
pub struct CredentialManager {
    /// Cached credential; `None` until the first exchange
    credential: Mutex<Option<Credential>>,

    /// API key exchanged for tokens
    api_key: String,

    /// IAM token endpoint
    iam_url: String,

    /// HTTP client for token exchanges
    client: Client,
}

impl CredentialManager {
    /// Create a manager with no cached credential. No network call is made.
    pub fn new(client: Client, iam_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            credential: Mutex::new(None),
            api_key: api_key.into(),
            iam_url: iam_url.into(),
            client,
        }
    }

    /// Return a usable token, refreshing first if the cached one is missing,
    /// expired or inside the safety margin.
    ///
    /// The lock is held across the check and the exchange, so concurrent
    /// callers that find the token stale trigger a single exchange and all
    /// observe its result. It is released before this returns.
    pub async fn ensure_valid(&self) -> Result<AccessToken, AuthError> {
        let mut guard = self.credential.lock().await;

        if let Some(credential) = guard.as_ref() {
            if credential.is_usable() {
                return Ok(credential.token.clone());
            }
            tracing::debug!(
                expires_at = %credential.expires_at.to_rfc3339(),
                "Access token expired or expiring soon"
            );
        }

        let credential =
            refresh::exchange_api_key(&self.client, &self.iam_url, &self.api_key).await?;
        let token = credential.token.clone();
        *guard = Some(credential);
        Ok(token)
    }

    /// Exchange the API key for a new token regardless of the cached one
    pub async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let mut guard = self.credential.lock().await;

        let credential =
            refresh::exchange_api_key(&self.client, &self.iam_url, &self.api_key).await?;
        let token = credential.token.clone();
        *guard = Some(credential);
        Ok(token)
    }

    /// Expiry of the cached credential, if any
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.credential
            .lock()
            .await
            .as_ref()
            .map(|credential| credential.expires_at)
    }

    #[cfg(test)]
    async fn seed(&self, credential: Credential) {
        *self.credential.lock().await = Some(credential);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn token_body(token: &str) -> String {
        format!(r#"{{"access_token":"{}","expires_in":3600}}"#, token)
    }

    fn manager_for(server: &mockito::ServerGuard) -> CredentialManager {
        CredentialManager::new(
            Client::new(),
            format!("{}/identity/token", server.url()),
            "test-api-key",
        )
    }

    #[tokio::test]
    async fn test_fresh_token_needs_no_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/identity/token")
            .expect(0)
            .create_async()
            .await;

        let manager = manager_for(&server);
        manager
            .seed(Credential {
                token: AccessToken::new("cached"),
                expires_at: Utc::now() + Duration::seconds(600),
            })
            .await;

        let token = manager.ensure_valid().await.unwrap();
        assert_eq!(token.secret(), "cached");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_inside_margin_is_refreshed_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/identity/token")
            .with_status(200)
            .with_body(token_body("fresh"))
            .expect(1)
            .create_async()
            .await;

        let manager = manager_for(&server);
        manager
            .seed(Credential {
                token: AccessToken::new("stale"),
                expires_at: Utc::now() + Duration::seconds(30),
            })
            .await;

        assert_eq!(manager.ensure_valid().await.unwrap().secret(), "fresh");
        // Immediate second call uses the cached token
        assert_eq!(manager.ensure_valid().await.unwrap().secret(), "fresh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/identity/token")
            .with_status(200)
            .with_body(token_body("renewed"))
            .expect(1)
            .create_async()
            .await;

        let manager = manager_for(&server);
        manager
            .seed(Credential {
                token: AccessToken::new("old"),
                expires_at: Utc::now() - Duration::seconds(60),
            })
            .await;

        assert_eq!(manager.ensure_valid().await.unwrap().secret(), "renewed");
        assert!(manager.expires_at().await.unwrap() > Utc::now());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/identity/token")
            .with_status(200)
            .with_body(token_body("shared"))
            .expect(1)
            .create_async()
            .await;

        let manager = Arc::new(manager_for(&server));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.ensure_valid().await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.secret(), "shared");
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_is_unconditional() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/identity/token")
            .with_status(200)
            .with_body(token_body("forced"))
            .expect(1)
            .create_async()
            .await;

        let manager = manager_for(&server);
        manager
            .seed(Credential {
                token: AccessToken::new("still-good"),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await;

        assert_eq!(manager.refresh().await.unwrap().secret(), "forced");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_exchange_keeps_previous_state() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/identity/token")
            .with_status(401)
            .create_async()
            .await;

        let manager = manager_for(&server);
        let err = manager.ensure_valid().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(manager.expires_at().await.is_none());
    }
}
