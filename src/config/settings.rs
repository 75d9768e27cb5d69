use std::env;

use crate::services::token::TokenDigest;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime settings read from the process environment (after `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub token_digest: TokenDigest,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| SettingsError::Missing("DATABASE_URL"))?;

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| SettingsError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    reason: format!("expected a positive integer, got '{}'", raw),
                })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let token_digest = Self::token_digest_from_env()?;

        Ok(Settings {
            database_url,
            max_connections,
            token_digest,
        })
    }

    /// `REMEMBER_TOKEN_DIGEST` alone, for callers that never open the database.
    pub fn token_digest_from_env() -> Result<TokenDigest, SettingsError> {
        match env::var("REMEMBER_TOKEN_DIGEST") {
            Ok(raw) => raw.parse::<TokenDigest>().map_err(|e| SettingsError::Invalid {
                name: "REMEMBER_TOKEN_DIGEST",
                reason: format!("{}", e),
            }),
            Err(_) => Ok(TokenDigest::default()),
        }
    }
}
