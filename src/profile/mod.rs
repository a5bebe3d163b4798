//! Identity/subscription records and the upstream fetch that produces them.

use serde::{Deserialize, Serialize};

pub mod client;
mod key;

pub use client::ProfileClient;
pub use key::cache_key;

/// Identity record cached per credential. Immutable once cached; a re-fetch
/// supersedes the whole record, it is never merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub is_subscribed: bool,
    pub plan_name: Option<String>,
    pub is_trial: Option<bool>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub permissions: Vec<String>,
}

/// Why an identity fetch failed. `Clone` so the cache can hand the same
/// failure to every caller that joined the fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The upstream authority rejected the credential.
    #[error("unauthorized")]
    Unauthorized,
    /// Valid credential, insufficient entitlement.
    #[error("forbidden")]
    Forbidden,
    /// Network or parse failure talking to the identity provider.
    #[error("upstream identity fetch failed: {0}")]
    Upstream(String),
    /// The fetch did not settle within the configured bound.
    #[error("identity fetch timed out")]
    Timeout,
}

/// Wire shape of the upstream `/auth/me/` payload. Parsed strictly at the
/// boundary; anything that does not fit becomes [`FetchError::Upstream`].
#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    data: MeData,
    #[serde(default)]
    is_subscribed: bool,
    current_subscription: Option<MeSubscription>,
}

#[derive(Debug, Deserialize)]
struct MeData {
    id: u64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeSubscription {
    plan_name: Option<String>,
    is_trial: Option<bool>,
    status: Option<String>,
    is_active: Option<bool>,
}

impl From<MeResponse> for Profile {
    fn from(payload: MeResponse) -> Self {
        let subscription = payload.current_subscription;
        let (plan_name, is_trial, status, is_active) = match subscription {
            Some(sub) => (sub.plan_name, sub.is_trial, sub.status, sub.is_active),
            None => (None, None, None, None),
        };
        Self {
            id: payload.data.id,
            name: payload.data.first_name,
            email: payload.data.email,
            profile_picture: payload.data.profile_picture,
            is_subscribed: payload.is_subscribed,
            plan_name,
            is_trial,
            status,
            is_active,
            // The upstream does not report per-user permissions yet.
            permissions: vec!["read".to_string(), "write".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_me_payload_maps_to_profile() {
        let payload: MeResponse = serde_json::from_str(
            r#"{
                "data": {
                    "id": 42,
                    "first_name": "Ada",
                    "email": "ada@example.com",
                    "profile_picture": null
                },
                "is_subscribed": true,
                "current_subscription": {
                    "plan_name": "EXPLORE",
                    "is_trial": false,
                    "status": "active",
                    "is_active": true
                }
            }"#,
        )
        .unwrap();

        let profile = Profile::from(payload);
        assert_eq!(profile.id, 42);
        assert_eq!(profile.name, "Ada");
        assert!(profile.is_subscribed);
        assert_eq!(profile.plan_name.as_deref(), Some("EXPLORE"));
        assert_eq!(profile.is_trial, Some(false));
        assert_eq!(profile.status.as_deref(), Some("active"));
        assert_eq!(profile.is_active, Some(true));
    }

    #[test]
    fn test_missing_subscription_yields_nulls() {
        let payload: MeResponse = serde_json::from_str(
            r#"{"data": {"id": 7, "email": "x@example.com"}}"#,
        )
        .unwrap();

        let profile = Profile::from(payload);
        assert!(!profile.is_subscribed);
        assert_eq!(profile.plan_name, None);
        assert_eq!(profile.is_trial, None);
        assert_eq!(profile.status, None);
        assert_eq!(profile.is_active, None);
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        // `data` is required; untyped payloads never flow past the boundary.
        let result: Result<MeResponse, _> = serde_json::from_str(r#"{"is_subscribed": true}"#);
        assert!(result.is_err());
    }
}
