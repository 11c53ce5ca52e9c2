use std::{path::PathBuf, str::FromStr};

use thiserror::Error;

use crate::conversation_log::DEFAULT_LOG_CAPACITY;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub completion: CompletionConfig,
    pub intake: IntakeConfig,
    pub customers_file: PathBuf,
    pub frontend_dir: PathBuf,
    pub conversation_log_capacity: usize,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub sendgrid_api_key: Option<String>,
    pub from_email: String,
    pub to_email: String,
    pub fallback_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
}

impl AppConfig {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secret = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let conversation_log_capacity =
            parse_or(&lookup, "CONVERSATION_LOG_CAPACITY", DEFAULT_LOG_CAPACITY)?;
        if conversation_log_capacity == 0 {
            return Err(ConfigError::InvalidEnvOverride {
                key: "CONVERSATION_LOG_CAPACITY".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port: parse_or(&lookup, "PORT", 5000)?,
            completion: CompletionConfig {
                api_key: secret("OPENAI_API_KEY"),
                base_url: text("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: text("OPENAI_MODEL", "gpt-3.5-turbo"),
            },
            intake: IntakeConfig {
                sendgrid_api_key: secret("SENDGRID_API_KEY"),
                from_email: text("INTAKE_FROM_EMAIL", "intake@localhost"),
                to_email: text("INTAKE_TO_EMAIL", "intake@localhost"),
                fallback_dir: PathBuf::from(text("INTAKE_FALLBACK_DIR", ".")),
            },
            customers_file: PathBuf::from(text("CUSTOMERS_FILE", "customers.json")),
            frontend_dir: PathBuf::from(text("FRONTEND_DIR", "../frontend")),
            conversation_log_capacity,
            logging: LoggingConfig {
                level: text("LOG_LEVEL", "info"),
                format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Compact)?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidEnvOverride {
                    key: key.to_string(),
                    value: raw,
                })
        }
        _ => Ok(default),
    }
}
