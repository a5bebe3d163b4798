use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        upstream_url: matches
            .get_one("upstream-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --upstream-url"))?,
        token_cookie: matches
            .get_one("token-cookie")
            .map_or_else(|| "access_token".to_string(), |s: &String| s.to_string()),
        cache_ttl_seconds: matches.get_one::<u64>("cache-ttl").copied().unwrap_or(10),
        fetch_timeout_seconds: matches
            .get_one::<u64>("fetch-timeout")
            .copied()
            .unwrap_or(5),
        public_routes: matches
            .get_one("public-routes")
            .map(|s: &String| split_routes(s))
            .unwrap_or_default(),
        login_route: matches
            .get_one("login-route")
            .map_or_else(|| "login".to_string(), |s: &String| s.to_string()),
        home_route: matches
            .get_one("home-route")
            .map_or_else(|| "dashboard".to_string(), |s: &String| s.to_string()),
        denied_route: matches
            .get_one("denied-route")
            .map_or_else(|| "access-not-allowed".to_string(), |s: &String| s.to_string()),
    })
}

fn split_routes(routes: &str) -> Vec<String> {
    routes
        .split(',')
        .map(str::trim)
        .filter(|route| !route.is_empty())
        .map(str::to_string)
        .collect()
}
