use crate::cli::actions::Action;
use crate::pordisto::{self, GatewayConfig};
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            upstream_url,
            token_cookie,
            cache_ttl_seconds,
            fetch_timeout_seconds,
            public_routes,
            login_route,
            home_route,
            denied_route,
        } => {
            let upstream_url = Url::parse(&upstream_url)
                .with_context(|| format!("Invalid upstream URL: {upstream_url}"))?;

            let config = GatewayConfig {
                port,
                upstream_url,
                token_cookie,
                cache_ttl: Duration::from_secs(cache_ttl_seconds),
                fetch_timeout: Duration::from_secs(fetch_timeout_seconds),
                public_routes,
                login_route,
                home_route,
                denied_route,
            };

            pordisto::new(config).await?;
        }
    }

    Ok(())
}
