use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    // Listener
    pub bind_address: String,
    pub port: u16,

    // Upstream status API
    pub status_api_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub upstream_timeout_secs: u64,

    // Caching and polling
    pub cache_ttl_secs: u64,
    pub poll_interval_secs: u64,
    pub proxy_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            status_api_url: "https://mcapi.us".to_string(),
            server_host: "stonemc.pl".to_string(),
            server_port: 25565,
            upstream_timeout_secs: 10,
            cache_ttl_secs: 30,
            poll_interval_secs: 30,
            proxy_url: "http://127.0.0.1:8080/api/server-status".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),

            status_api_url: env::var("STATUS_API_URL").unwrap_or(defaults.status_api_url),

            server_host: env::var("STATUS_SERVER_HOST").unwrap_or(defaults.server_host),

            server_port: env::var("STATUS_SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),

            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout_secs),

            cache_ttl_secs: env::var("STATUS_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),

            poll_interval_secs: env::var("STATUS_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.poll_interval_secs),

            proxy_url: env::var("STATUS_PROXY_URL").unwrap_or(defaults.proxy_url),
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Full upstream request for the configured server. Doubles as the cache key.
    pub fn status_query_url(&self) -> String {
        format!(
            "{}/server/status?ip={}&port={}",
            self.status_api_url.trim_end_matches('/'),
            self.server_host,
            self.server_port
        )
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
