use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub admin_emails: String,
    pub enforce_coach_allowlist: bool,
    pub coach_emails: String,
    pub coach_domains: String,
    pub writes_enabled: bool,
    pub session_ttl_minutes: u64,
}

pub const DEFAULT_SESSION_TTL_MINUTES: u64 = 12 * 60;

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            admin_emails: std::env::var("ADMIN_EMAILS").unwrap_or_default(),
            enforce_coach_allowlist: env_flag("ENFORCE_COACH_ALLOWLIST", false),
            coach_emails: std::env::var("COACH_EMAILS").unwrap_or_default(),
            coach_domains: std::env::var("COACH_DOMAINS").unwrap_or_default(),
            writes_enabled: env_flag("ENTRYDESK_WRITES_ENABLED", true),
            session_ttl_minutes: match std::env::var("SESSION_TTL_MINUTES") {
                Ok(value) => value
                    .trim()
                    .parse()
                    .context("SESSION_TTL_MINUTES must be a number")?,
                Err(_) => DEFAULT_SESSION_TTL_MINUTES,
            },
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|value| parse_bool(&value))
        .unwrap_or(default)
}

/// Accepts 1/true/yes/y/on in any case; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
