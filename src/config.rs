use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_kiosk_per_min: u32,
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Startup
    pub auto_migrate: bool,
    pub bootstrap_admin_password: Option<String>,
    pub log_dir: String,

    // Kiosk
    pub kiosk_stdin: bool,
    pub kiosk_clear_after: Duration,
    /// `None` keeps partial tags forever
    pub tag_idle_timeout: Option<Duration>,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let idle_ms: u64 = parsed("TAG_IDLE_TIMEOUT_MS", 200)?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_kiosk_per_min: parsed("RATE_KIOSK_PER_MIN", 120)?,
            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            auto_migrate: parsed("AUTO_MIGRATE", true)?,
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .ok()
                .filter(|p| !p.is_empty()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            kiosk_stdin: parsed("KIOSK_STDIN", false)?,
            kiosk_clear_after: Duration::from_millis(parsed("KIOSK_CLEAR_AFTER_MS", 20_000)?),
            tag_idle_timeout: (idle_ms > 0).then(|| Duration::from_millis(idle_ms)),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 900,
            rate_kiosk_per_min: 1000,
            rate_login_per_min: 1000,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            auto_migrate: false,
            bootstrap_admin_password: None,
            log_dir: "logs".to_string(),
            kiosk_stdin: false,
            kiosk_clear_after: Duration::from_millis(20_000),
            tag_idle_timeout: Some(Duration::from_millis(200)),
        }
    }
}
