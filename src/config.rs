use std::fmt;
use std::path::PathBuf;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    Missing(&'static str),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "environment variable {name} is required"),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub telegram_token: String,
    pub openai_api_key: String,
    pub serper_api_key: String,
    /// Directory for state files (user log, process logs).
    pub data_dir: PathBuf,
    /// Directory with `crypto.txt` / `conference.txt` overriding the built-in prompts.
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let telegram_token = required("TELEGRAM_TOKEN")?;
        let openai_api_key = required("OPENAI_API_KEY")?;
        let serper_api_key = required("SERPER_API_KEY")?;

        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "TELEGRAM_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }

        let data_dir = lookup("DATA_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let prompts_dir = lookup("PROMPTS_DIR").filter(|v| !v.is_empty()).map(PathBuf::from);

        Ok(Self {
            telegram_token,
            openai_api_key,
            serper_api_key,
            data_dir,
            prompts_dir,
        })
    }

    pub fn users_log_path(&self) -> PathBuf {
        self.data_dir.join("users_data.csv")
    }
}
