//! Reqwest client for the upstream identity provider.

use crate::profile::{FetchError, MeResponse, Profile};
use anyhow::{Context, Result};
use reqwest::{header::ACCEPT, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Bearer-authenticated client for `GET {base}/auth/me/`.
///
/// The request timeout doubles as the fetch bound required by the cache: a
/// stalled upstream turns into [`FetchError::Timeout`] instead of leaving the
/// key in-flight forever.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: reqwest::Client,
    me_url: Url,
}

impl ProfileClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the URL is invalid.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build the upstream HTTP client")?;
        let me_url = base_url
            .join("auth/me/")
            .with_context(|| format!("Invalid upstream base URL: {base_url}"))?;
        Ok(Self { client, me_url })
    }

    /// Fetch the identity record for a credential.
    ///
    /// # Errors
    /// Maps upstream outcomes onto the fetch taxonomy: 401 → `Unauthorized`,
    /// 403 → `Forbidden`, timeouts → `Timeout`, everything else that is not a
    /// well-formed success → `Upstream`.
    pub async fn fetch(&self, token: &SecretString) -> Result<Profile, FetchError> {
        let response = self
            .client
            .get(self.me_url.clone())
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        classify_status(response.status())?;

        let payload: MeResponse = response.json().await.map_err(|err| {
            debug!("Malformed identity payload: {err}");
            FetchError::Upstream(format!("malformed identity payload: {err}"))
        })?;

        Ok(Profile::from(payload))
    }
}

fn classify_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(FetchError::Unauthorized),
        StatusCode::FORBIDDEN => Err(FetchError::Forbidden),
        _ => Err(FetchError::Upstream(format!(
            "unexpected upstream status {status}"
        ))),
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK), Ok(()));
        assert_eq!(classify_status(StatusCode::CREATED), Ok(()));
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            Err(FetchError::Unauthorized)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            Err(FetchError::Forbidden)
        );
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(FetchError::Upstream(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            Err(FetchError::Upstream(_))
        ));
    }

    #[test]
    fn test_me_url_joins_base_path() {
        let client = ProfileClient::new(
            &Url::parse("https://api.example.com/v1/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.me_url.as_str(), "https://api.example.com/v1/auth/me/");
    }
}
