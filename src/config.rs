// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Supabase storage bucket holding staff photos.
pub const STAFF_PHOTO_BUCKET: &str = "staff-photos";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL (e.g. https://xyz.supabase.co)
    pub supabase_url: String,
    /// Supabase anon (public) API key
    pub supabase_anon_key: String,
    /// Local API port
    pub port: u16,
    /// Offline cache file
    pub cache_path: PathBuf,
    /// Connect/read timeout for backend calls
    pub http_timeout_secs: u64,
    /// Interval between connectivity probes
    pub network_probe_secs: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self::test_default()
    }
}

impl Config {
    /// Config pointing at an unreachable backend, for tests.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:9".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            port: 8080,
            cache_path: env::temp_dir().join("physio-roster-test-cache.json"),
            http_timeout_secs: 15,
            network_probe_secs: 10,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let supabase_url = env::var("SUPABASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(ConfigError::Invalid("SUPABASE_URL", supabase_url));
        }

        let cache_path = match env::var("CACHE_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_cache_path()?,
        };

        Ok(Self {
            supabase_url,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cache_path,
            http_timeout_secs: parse_secs("HTTP_TIMEOUT_SECS", 15),
            network_probe_secs: parse_secs("NETWORK_PROBE_SECS", 10),
        })
    }
}

fn parse_secs(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// `<platform data dir>/physio-roster/cache.json`
fn default_cache_path() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("physio-roster").join("cache.json"))
        .ok_or(ConfigError::Missing("CACHE_PATH"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("SUPABASE_URL", "https://example.supabase.co/");
        env::set_var("SUPABASE_ANON_KEY", " anon ");
        env::set_var("CACHE_PATH", "/tmp/roster-cache.json");
        env::set_var("HTTP_TIMEOUT_SECS", "0");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.supabase_url, "https://example.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon");
        assert_eq!(config.cache_path, PathBuf::from("/tmp/roster-cache.json"));
        // Zero is rejected in favour of the default
        assert_eq!(config.http_timeout_secs, 15);
        assert_eq!(config.port, 8080);
    }
}
