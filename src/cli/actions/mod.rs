pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        upstream_url: String,
        token_cookie: String,
        cache_ttl_seconds: u64,
        fetch_timeout_seconds: u64,
        public_routes: Vec<String>,
        login_route: String,
        home_route: String,
        denied_route: String,
    },
}
