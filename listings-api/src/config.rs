#[derive(Debug, Clone)]
pub struct Config {
    /// Interface the API binds to
    pub bind: String,
    /// Port the API listens on
    pub port: u16,
    /// SQLite database holding the listings table
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind: env_str("LISTINGS_BIND", "0.0.0.0"),
            port: env_parse("LISTINGS_PORT", 8080)?,
            database_url: env_str("LISTINGS_DATABASE_URL", "sqlite:./data/listings.db"),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr() {
        let config = Config {
            bind: "127.0.0.1".to_string(),
            port: 9000,
            database_url: "sqlite::memory:".to_string(),
        };
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("LISTINGS_TEST_BAD_PORT", "not-a-port");
        let parsed: anyhow::Result<u16> = env_parse("LISTINGS_TEST_BAD_PORT", 8080);
        assert!(parsed.is_err());

        let fallback: u16 = env_parse("LISTINGS_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(fallback, 8080);
    }
}
