use serde::Deserialize;

/// Longest session a cookie may carry; larger values overflow token expiry.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapboxConfig {
    pub token: String,
    pub api_url: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub session: SessionConfig,
    pub mapbox: MapboxConfig,
    pub enable_invite_code: bool,
    pub enable_graphiql: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "rideshare".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "rideshare-users".into()),
            ttl_days: session_ttl_days(std::env::var("SESSION_TTL_DAYS").ok().as_deref()),
        };
        let mapbox = MapboxConfig {
            token: std::env::var("MAPBOX_TOKEN").unwrap_or_default(),
            api_url: std::env::var("MAPBOX_API_URL")
                .unwrap_or_else(|_| "https://api.mapbox.com".into()),
            language: std::env::var("GEOCODING_LANGUAGE").unwrap_or_else(|_| "fr".into()),
        };
        Ok(Self {
            database_url,
            database_max_connections,
            session,
            mapbox,
            enable_invite_code: env_flag("ENABLE_INVITE_CODE"),
            enable_graphiql: env_flag("ENABLE_GRAPHIQL"),
        })
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Parses `SESSION_TTL_DAYS`, defaulting to a year and clamping to `1..=MAX_SESSION_TTL_DAYS`.
fn session_ttl_days(raw: Option<&str>) -> i64 {
    let days = raw
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(365);
    if !(1..=MAX_SESSION_TTL_DAYS).contains(&days) {
        tracing::warn!(days, "SESSION_TTL_DAYS out of range; clamping");
    }
    days.clamp(1, MAX_SESSION_TTL_DAYS)
}
