use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("LEADHUB_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid LEADHUB_HOST: {e}"))?;

        let port: u16 = env_or("LEADHUB_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid LEADHUB_PORT: {e}"))?;

        let base_url = env_or("LEADHUB_BASE_URL", &format!("http://{host}:{port}"));

        let log_level = env_or("LEADHUB_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("LEADHUB_SMTP_HOST").ok(),
            std::env::var("LEADHUB_SMTP_PORT").ok(),
            std::env::var("LEADHUB_SMTP_USER").ok(),
            std::env::var("LEADHUB_SMTP_PASS").ok(),
            std::env::var("LEADHUB_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid LEADHUB_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            log_level,
            smtp,
        })
    }

    /// Session cookies are marked Secure only when the site is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
