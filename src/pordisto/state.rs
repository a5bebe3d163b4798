use crate::access::{normalize, AccessPolicy};
use crate::cache::SingleFlightCache;
use crate::profile::{FetchError, Profile, ProfileClient};
use anyhow::Result;
use std::time::Duration;
use url::Url;

/// Everything the gateway needs to boot, assembled by the CLI layer.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub upstream_url: Url,
    pub token_cookie: String,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub public_routes: Vec<String>,
    pub login_route: String,
    pub home_route: String,
    pub denied_route: String,
}

/// Shared per-process gateway state: one cache instance, one upstream client,
/// one policy. Constructed once at startup and threaded through the router;
/// there are no globals to tear down beyond process exit.
pub struct GatewayState {
    pub cache: SingleFlightCache<Profile, FetchError>,
    pub client: ProfileClient,
    pub policy: AccessPolicy,
    pub token_cookie: String,
    pub cache_ttl: Duration,
    pub login_route: String,
    pub home_route: String,
    pub denied_route: String,
}

impl GatewayState {
    /// # Errors
    /// Returns an error if the upstream client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            cache: SingleFlightCache::new(),
            client: ProfileClient::new(&config.upstream_url, config.fetch_timeout)?,
            policy: AccessPolicy::new(&config.public_routes, &config.denied_route),
            token_cookie: config.token_cookie.clone(),
            cache_ttl: config.cache_ttl,
            // Redirect targets are path segments, not URLs; normalize them the
            // same way the policy does so `--login-route /login` cannot produce
            // a protocol-relative `Location: //login`.
            login_route: normalize(&config.login_route),
            home_route: normalize(&config.home_route),
            denied_route: normalize(&config.denied_route),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> GatewayConfig {
    GatewayConfig {
        port: 0,
        // Reserved discard port: connections fail fast, nothing listens here.
        upstream_url: Url::parse("http://127.0.0.1:9/").unwrap(),
        token_cookie: "access_token".to_string(),
        cache_ttl: Duration::from_secs(10),
        fetch_timeout: Duration::from_secs(1),
        public_routes: vec!["login".to_string(), "register".to_string()],
        login_route: "login".to_string(),
        home_route: "dashboard".to_string(),
        denied_route: "access-not-allowed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_config() {
        let state = GatewayState::new(&test_config()).unwrap();
        assert!(state.policy.is_public("/login"));
        assert!(!state.policy.is_public("/dashboard"));
        assert_eq!(state.token_cookie, "access_token");
    }

    #[test]
    fn test_redirect_routes_are_normalized() {
        let config = GatewayConfig {
            login_route: "/login".to_string(),
            home_route: " /Dashboard/ ".to_string(),
            denied_route: "//access-not-allowed".to_string(),
            ..test_config()
        };
        let state = GatewayState::new(&config).unwrap();
        assert_eq!(state.login_route, "login");
        assert_eq!(state.home_route, "dashboard");
        assert_eq!(state.denied_route, "access-not-allowed");
    }
}
