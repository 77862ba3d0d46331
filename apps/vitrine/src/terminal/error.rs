use crate::auth::error::AuthError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("terminal runtime error: {0}")]
    Runtime(String),
    #[error("logging initialization failed: {0}")]
    Logging(String),
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        CliError::Auth(err.to_string())
    }
}
