use thiserror::Error;

use crate::policy::PolicyError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Parse float error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Quote error: {0}")]
    Quote(String),

    #[error("Quote request timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid trade intent: {0}")]
    InvalidIntent(String),

    #[error("Invalid pool snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),
}
