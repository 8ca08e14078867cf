use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub bcrypt_cost: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// 是否启用读模型缓存
    pub cache_enabled: bool,
    /// 未配置时不连接 Redis，使用进程内替身
    pub redis_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub cache_op_timeout_ms: u64,
    pub cache_health_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .unwrap_or_else(|_| "24h".into())
            .trim_end_matches('h')
            .parse::<u64>()
            .unwrap_or(24);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: parse_or("SERVER_PORT", 3001),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api/v1".into()),
            cache_enabled: parse_bool_or("CACHE_ENABLED", true),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            cache_ttl_secs: parse_or("CACHE_TTL", 3600),
            cache_op_timeout_ms: parse_or("CACHE_OP_TIMEOUT_MS", 500),
            cache_health_interval_secs: parse_or("CACHE_HEALTH_INTERVAL_SECS", 5),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_op_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_op_timeout_ms)
    }

    pub fn cache_health_interval(&self) -> Duration {
        Duration::from_secs(self.cache_health_interval_secs.max(1))
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool_or(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_follow_configured_seconds() {
        let config = Config {
            database_url: "postgres://localhost/users".into(),
            jwt_secret: "secret".into(),
            jwt_expiration_secs: 7200,
            bcrypt_cost: 4,
            server_host: "127.0.0.1".into(),
            server_port: 3001,
            api_base_uri: "/api/v1".into(),
            cache_enabled: true,
            redis_url: None,
            cache_ttl_secs: 3600,
            cache_op_timeout_ms: 250,
            cache_health_interval_secs: 0,
        };

        assert_eq!(config.jwt_expiration(), Duration::from_secs(7200));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.cache_op_timeout(), Duration::from_millis(250));
        // 探活间隔至少一秒
        assert_eq!(config.cache_health_interval(), Duration::from_secs(1));
    }
}
