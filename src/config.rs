use std::env;

use crate::error::AppError;

/// Dispatch tunables shared with the assignment engine. Resolved once at
/// startup; a malformed value aborts the process instead of failing
/// per-request.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub search_radius_km: f64,
    pub location_freshness_secs: i64,
    pub audit_query_limit: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub search_radius_km: f64,
    pub location_freshness_secs: i64,
    pub audit_query_limit: usize,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            search_radius_km: parse_or_default("SEARCH_RADIUS_KM", 10.0)?,
            location_freshness_secs: parse_or_default("LOCATION_FRESHNESS_SECS", 600)?,
            audit_query_limit: parse_or_default("AUDIT_QUERY_LIMIT", 100)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
        };

        if config.search_radius_km <= 0.0 {
            return Err(AppError::Config("SEARCH_RADIUS_KM must be > 0".to_string()));
        }
        if config.location_freshness_secs <= 0 {
            return Err(AppError::Config(
                "LOCATION_FRESHNESS_SECS must be > 0".to_string(),
            ));
        }
        if config.audit_query_limit == 0 {
            return Err(AppError::Config("AUDIT_QUERY_LIMIT must be > 0".to_string()));
        }

        Ok(config)
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            search_radius_km: self.search_radius_km,
            location_freshness_secs: self.location_freshness_secs,
            audit_query_limit: self.audit_query_limit,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            search_radius_km: 10.0,
            location_freshness_secs: 600,
            audit_query_limit: 100,
        }
    }
}
