use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8081, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// Cache layer settings. The TTL is process-wide: every entry written by the
/// API shares the same expiry bound, which is what makes TTL a usable
/// staleness fallback when invalidation is missed.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: default_cache_ttl(), max_entries: default_cache_capacity() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; JWT_SECRET env var wins when set.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_hours")]
    pub token_expiry_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_expiry_hours: default_token_hours() }
    }
}

/// Per-principal request quotas, counted in one-minute windows.
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_staff_per_min")]
    pub staff_per_min: u32,
    #[serde(default = "default_user_per_min")]
    pub user_per_min: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            staff_per_min: default_staff_per_min(),
            user_per_min: default_user_per_min(),
        }
    }
}

impl ThrottleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && (self.staff_per_min == 0 || self.user_per_min == 0) {
            return Err(anyhow!("throttle quotas must be >= 1 when throttling is enabled"));
        }
        Ok(())
    }
}

fn default_true() -> bool { true }
fn default_staff_per_min() -> u32 { 500 }
fn default_user_per_min() -> u32 { 200 }

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_cache_ttl() -> u64 { 300 }
fn default_cache_capacity() -> u64 { 10_000 }
fn default_token_hours() -> i64 { 12 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.cache.validate()?;
        self.throttle.validate()?;
        self.auth.normalize_from_env();
        Ok(())
    }
}

impl ServerConfig {
    /// SERVER_HOST/SERVER_PORT override the compiled defaults when no
    /// config file is present.
    pub fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
    }

    fn normalize(&mut self) -> Result<()> {
        // Bind address not in TOML: fall back to the environment
        if self.host.trim().is_empty() {
            self.host = std::env::var("SERVER_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| "127.0.0.1".to_string());
        }
        if self.port == 0 {
            if let Ok(port) = std::env::var("SERVER_PORT") {
                self.port = port
                    .parse()
                    .map_err(|_| anyhow!("SERVER_PORT must be a port number"))?;
            }
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // URL not in TOML: fall back to the environment
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(anyhow!("cache.ttl_secs must be >= 1"));
        }
        if self.max_entries == 0 {
            return Err(anyhow!("cache.max_entries must be >= 1"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.trim().is_empty() {
                self.jwt_secret = secret;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.cache.ttl_secs, 300);
        assert_eq!(cfg.cache.max_entries, 10_000);
        assert_eq!(cfg.auth.token_expiry_hours, 12);
    }

    #[test]
    fn throttle_defaults_match_role_quotas() {
        let cfg = ThrottleConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.staff_per_min, 500);
        assert_eq!(cfg.user_per_min, 200);
    }

    #[test]
    fn throttle_rejects_zero_quota_when_enabled() {
        let cfg = ThrottleConfig { enabled: true, staff_per_min: 0, user_per_min: 200 };
        assert!(cfg.validate().is_err());
        let cfg = ThrottleConfig { enabled: false, staff_per_min: 0, user_per_min: 0 };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn server_bind_falls_back_to_env() {
        std::env::set_var("SERVER_HOST", "0.0.0.0");
        std::env::set_var("SERVER_PORT", "9100");
        let mut cfg = ServerConfig { host: String::new(), port: 0, worker_threads: None };
        cfg.normalize().unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9100);
        std::env::remove_var("SERVER_HOST");
        std::env::remove_var("SERVER_PORT");

        let mut cfg = ServerConfig { host: String::new(), port: 0, worker_threads: None };
        assert!(cfg.normalize().is_err());
        assert_eq!(cfg.host, "127.0.0.1");
    }

    #[test]
    fn cache_config_rejects_zero_ttl() {
        let cfg = CacheConfig { ttl_secs: 0, max_entries: 10 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_full_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@localhost:5432/nearby"

            [cache]
            ttl_secs = 120
            max_entries = 500

            [auth]
            jwt_secret = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.cache.ttl_secs, 120);
        assert_eq!(cfg.auth.jwt_secret, "secret");
    }
}
