//! Configuration module for the pantry planner backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Connection settings for an OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy recipe index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Lifetime of a login session
    pub session_ttl_hours: i64,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    /// `None` disables every AI-assisted feature
    pub llm: Option<LlmConfig>,
}

const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("MEALPLAN_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let index_path = env::var("MEALPLAN_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("MEALPLAN_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError {
                variable: "MEALPLAN_BIND_ADDR",
                message: e.to_string(),
            })?;

        let log_level = env::var("MEALPLAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("MEALPLAN_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let session_ttl_hours = match env::var("MEALPLAN_SESSION_TTL_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| ConfigError {
                    variable: "MEALPLAN_SESSION_TTL_HOURS",
                    message: format!("expected a positive number of hours, got {:?}", raw),
                })?,
            Err(_) => 720,
        };

        let cookie_secure = env::var("MEALPLAN_COOKIE_SECURE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let llm_base_url = env::var("MEALPLAN_LLM_BASE_URL").ok();
        let llm_api_key = env::var("MEALPLAN_LLM_API_KEY").ok();
        let llm = if llm_base_url.is_some() || llm_api_key.is_some() {
            Some(LlmConfig {
                base_url: llm_base_url.unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
                model: env::var("MEALPLAN_LLM_MODEL")
                    .unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
                api_key: llm_api_key,
            })
        } else {
            None
        };

        Ok(Self {
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_format,
            session_ttl_hours,
            cookie_secure,
            llm,
        })
    }
}
