//! # smc-configs
//!
//! Layered runtime settings: built-in defaults, then an optional `smc.toml`,
//! then environment variables (after `.env` has been loaded).
//!
//! Environment keys are the upper-case field names, e.g. `JWT_SECRET_KEY`.

use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Document store location, e.g. `sqlite:smc.db?mode=rwc`.
    pub db_connection_string: String,
    pub jwt_secret_key: SecretString,
    pub master_user: String,
    pub master_password: SecretString,
    pub turnstile_secret_key: SecretString,
    pub verdicts_discord_webhook_url: Option<String>,
    pub reports_discord_webhook_url: Option<String>,
    pub bind_addr: String,
    /// Upper bound for each captcha / webhook call.
    pub http_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Settings {
    /// Loads `.env` (if any) and then every configuration layer.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let builder = Self::defaults()?
            .add_source(File::with_name("smc").required(false))
            .add_source(Environment::default().try_parsing(false));
        Self::from_builder(builder)
    }

    /// Built-in defaults every other layer overrides.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("db_connection_string", "sqlite:smc.db?mode=rwc")?
            .set_default("bind_addr", "0.0.0.0:8000")?
            .set_default("http_timeout_secs", 5)?
            .set_default("log_format", "pretty")?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "jwt_secret_key",
                reason: "must not be empty".into(),
            });
        }
        if self.master_user.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "master_user",
                reason: "must not be empty".into(),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "http_timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> ConfigBuilder<DefaultState> {
        Settings::defaults()
            .unwrap()
            .set_override("jwt_secret_key", "jwt-secret")
            .unwrap()
            .set_override("master_user", "admin")
            .unwrap()
            .set_override("master_password", "pw")
            .unwrap()
            .set_override("turnstile_secret_key", "ts")
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_settings() {
        let s = Settings::from_builder(required()).unwrap();
        assert_eq!(s.db_connection_string, "sqlite:smc.db?mode=rwc");
        assert_eq!(s.bind_addr, "0.0.0.0:8000");
        assert_eq!(s.http_timeout(), Duration::from_secs(5));
        assert_eq!(s.log_format, LogFormat::Pretty);
        assert!(s.verdicts_discord_webhook_url.is_none());
        assert_eq!(s.master_password.expose_secret(), "pw");
    }

    #[test]
    fn test_overrides_win() {
        let builder = required()
            .set_override("log_format", "json")
            .unwrap()
            .set_override("reports_discord_webhook_url", "https://discord.example/hook")
            .unwrap();
        let s = Settings::from_builder(builder).unwrap();
        assert_eq!(s.log_format, LogFormat::Json);
        assert_eq!(s.reports_discord_webhook_url.as_deref(), Some("https://discord.example/hook"));
    }

    #[test]
    fn test_missing_secret_fails() {
        let builder = Settings::defaults()
            .unwrap()
            .set_override("master_user", "admin")
            .unwrap()
            .set_override("master_password", "pw")
            .unwrap()
            .set_override("turnstile_secret_key", "ts")
            .unwrap();
        assert!(matches!(Settings::from_builder(builder), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_blank_jwt_secret_is_invalid() {
        let builder = required().set_override("jwt_secret_key", "  ").unwrap();
        assert!(matches!(
            Settings::from_builder(builder),
            Err(ConfigError::Invalid { key: "jwt_secret_key", .. })
        ));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let s = Settings::from_builder(required()).unwrap();
        let dump = format!("{s:?}");
        assert!(!dump.contains("jwt-secret"));
        assert!(dump.contains("admin"));
    }
}
