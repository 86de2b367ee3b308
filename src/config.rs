//! Runtime configuration
//!
//! Read from the environment (and a `.env` file if present) once at startup.

use crate::completion::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::conversation::context::{
    ContextConfig, DEFAULT_COMPLETION_TIMEOUT, DEFAULT_HISTORY_LIMIT, DEFAULT_PERSONA,
};
use crate::error::BotError;
use crate::Result;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub command_prefix: String,
    pub port: u16,
    pub context: ContextConfig,
}

impl BotConfig {
    /// Load `.env` and read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or_else(|| {
            BotError::Config("No DISCORD_TOKEN found in environment variables".to_string())
        })?;

        let history_limit = match get("HISTORY_LIMIT") {
            Some(raw) => parse_number::<usize>("HISTORY_LIMIT", &raw)?,
            None => DEFAULT_HISTORY_LIMIT,
        };
        if history_limit < 2 {
            return Err(BotError::Config(format!(
                "HISTORY_LIMIT must be at least 2, got {}",
                history_limit
            )));
        }

        let completion_timeout = match get("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>("COMPLETION_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_COMPLETION_TIMEOUT,
        };
        if completion_timeout.is_zero() {
            return Err(BotError::Config(
                "COMPLETION_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => 8080,
        };

        Ok(Self {
            discord_token,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            port,
            context: ContextConfig {
                persona: get("BOT_PERSONA").unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
                history_limit,
                completion_timeout,
            },
        })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("command_prefix", &self.command_prefix)
            .field("port", &self.port)
            .field("context", &self.context)
            .finish()
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BotError::Config(format!("{} is not a valid number: {:?}", key, raw)))
}
