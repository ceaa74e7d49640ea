use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: String,

    // Machine translation API
    pub translate_api_url: String,
    pub translate_api_key: Option<String>,

    // Admin API key for mutating routes (unset disables the check)
    pub admin_api_key: Option<String>,

    // HTTP server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .context("DATABASE_PATH not set")?,

            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .context("TRANSLATE_API_URL not set")?,
            translate_api_key: std::env::var("TRANSLATE_API_KEY").ok(),

            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}
