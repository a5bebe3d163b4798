use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("pordisto")
        .about("Authentication gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PORDISTO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("upstream-url")
                .short('u')
                .long("upstream-url")
                .help("Base URL of the upstream identity provider, example: https://api.tld/v1/")
                .env("PORDISTO_UPSTREAM_URL")
                .required(true),
        )
        .arg(
            Arg::new("token-cookie")
                .long("token-cookie")
                .help("Name of the cookie carrying the bearer credential")
                .default_value("access_token")
                .env("PORDISTO_TOKEN_COOKIE"),
        )
        .arg(
            Arg::new("cache-ttl")
                .long("cache-ttl")
                .help("Identity cache TTL in seconds")
                .default_value("10")
                .env("PORDISTO_CACHE_TTL")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("fetch-timeout")
                .long("fetch-timeout")
                .help("Upstream identity fetch timeout in seconds")
                .default_value("5")
                .env("PORDISTO_FETCH_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("public-routes")
                .long("public-routes")
                .help("Comma-separated routes reachable without a credential")
                .default_value("login,register")
                .env("PORDISTO_PUBLIC_ROUTES"),
        )
        .arg(
            Arg::new("login-route")
                .long("login-route")
                .help("Route unauthenticated requests are redirected to")
                .default_value("login")
                .env("PORDISTO_LOGIN_ROUTE"),
        )
        .arg(
            Arg::new("home-route")
                .long("home-route")
                .help("Route authenticated requests on public routes are redirected to")
                .default_value("dashboard")
                .env("PORDISTO_HOME_ROUTE"),
        )
        .arg(
            Arg::new("denied-route")
                .long("denied-route")
                .help("Route requests denied by the capability rule are redirected to")
                .default_value("access-not-allowed")
                .env("PORDISTO_DENIED_ROUTE"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PORDISTO_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "pordisto");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Authentication gateway"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_port_and_upstream() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "pordisto",
            "--port",
            "8080",
            "--upstream-url",
            "https://api.example.com/v1/",
            "--cache-ttl",
            "30",
        ]);

        assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(8080));
        assert_eq!(
            matches
                .get_one::<String>("upstream-url")
                .map(|s| s.to_string()),
            Some("https://api.example.com/v1/".to_string())
        );
        assert_eq!(matches.get_one::<u64>("cache-ttl").map(|s| *s), Some(30));
        assert_eq!(
            matches
                .get_one::<String>("token-cookie")
                .map(|s| s.to_string()),
            Some("access_token".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("denied-route")
                .map(|s| s.to_string()),
            Some("access-not-allowed".to_string())
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("PORDISTO_UPSTREAM_URL", Some("https://api.example.com")),
                ("PORDISTO_PORT", Some("443")),
                ("PORDISTO_TOKEN_COOKIE", Some("session")),
                ("PORDISTO_PUBLIC_ROUTES", Some("login,register,pricing")),
                ("PORDISTO_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["pordisto"]);
                assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(443));
                assert_eq!(
                    matches
                        .get_one::<String>("upstream-url")
                        .map(|s| s.to_string()),
                    Some("https://api.example.com".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>("token-cookie")
                        .map(|s| s.to_string()),
                    Some("session".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>("public-routes")
                        .map(|s| s.to_string()),
                    Some("login,register,pricing".to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("PORDISTO_LOG_LEVEL", Some(level)),
                    ("PORDISTO_UPSTREAM_URL", Some("https://api.example.com")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["pordisto"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").map(|s| *s),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("PORDISTO_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "pordisto".to_string(),
                    "--upstream-url".to_string(),
                    "https://api.example.com".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
