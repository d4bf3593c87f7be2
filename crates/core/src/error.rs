use crate::types::ClickId;
use thiserror::Error;

pub type BanditResult<T> = Result<T, BanditError>;

#[derive(Error, Debug)]
pub enum BanditError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown click: no open offer assignment for click {0}")]
    UnknownClick(ClickId),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BanditError {
    /// Stable machine-readable code relayed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            BanditError::InvalidArgument(_) => "invalid_argument",
            BanditError::UnknownClick(_) => "unknown_click",
            BanditError::Config(_) => "config_error",
        }
    }
}

impl From<config::ConfigError> for BanditError {
    fn from(e: config::ConfigError) -> Self {
        BanditError::Config(e.to_string())
    }
}
