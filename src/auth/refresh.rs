// IAM token exchange

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

use super::types::{AccessToken, Credential, IamTokenResponse, APIKEY_GRANT_TYPE};
use crate::error::AuthError;

/// Exchange an API key for a bearer token. One POST, no retries.
pub async fn exchange_api_key(
    client: &Client,
    iam_url: &str,
    api_key: &str,
) -> Result<Credential, AuthError> {
    tracing::info!("Requesting IAM access token...");

    let form = [("grant_type", APIKEY_GRANT_TYPE), ("apikey", api_key)];

    let response = client
        .post(iam_url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(url = %iam_url, error = %e, "IAM token request failed");
            AuthError::Network(e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %body,
            "IAM token exchange rejected"
        );
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await.map_err(AuthError::Network)?;
    let data: IamTokenResponse =
        serde_json::from_slice(&bytes).map_err(|e| AuthError::Decode(e.to_string()))?;

    if data.access_token.is_empty() {
        return Err(AuthError::Decode(
            "IAM response does not contain access_token".to_string(),
        ));
    }

    let expires_at = expiry_after(data.expires_in)?;

    tracing::info!(
        "IAM access token obtained, expires: {}",
        expires_at.to_rfc3339()
    );

    Ok(Credential {
        token: AccessToken::new(data.access_token),
        expires_at,
    })
}

/// Absolute expiry for a token valid for `expires_in` seconds from now
fn expiry_after(expires_in: i64) -> Result<DateTime<Utc>, AuthError> {
    if expires_in <= 0 {
        return Err(AuthError::Decode(format!(
            "IAM response has non-positive expires_in: {}",
            expires_in
        )));
    }

    Duration::try_seconds(expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| {
            AuthError::Decode(format!("IAM response expires_in out of range: {}", expires_in))
        })
}
