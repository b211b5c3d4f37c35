use anyhow::{Context, Result};
use std::env;

/// Settings for the TMDB client, passed in at construction rather than read
/// from ambient state.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub image_base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb: TmdbConfig,
    pub database_url: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let base_url = env_or("TMDB_BASE_URL", "https://api.themoviedb.org/3");
        let image_base_url = env_or("TMDB_IMAGE_BASE_URL", "https://image.tmdb.org/t/p/w500");
        let database_url = env_or("DATABASE_URL", "sqlite://moviedeck.db?mode=rwc");
        let port = env_or("PORT", "8080")
            .parse()
            .context("PORT must be a number")?;

        Ok(Self {
            tmdb: TmdbConfig {
                api_key,
                base_url,
                image_base_url,
            },
            database_url,
            port,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
