use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset error: {0}")]
    Core(#[from] synthscope_core::Error),
    #[error("evaluation error: {0}")]
    Eval(#[from] synthscope_eval::EvalError),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

pub type CliResult<T> = Result<T, CliError>;
