use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to load {uri}: {reason}")]
    InfoFetch { uri: String, reason: String },
    #[error("token exchange failed: {reason}")]
    TokenExchange { reason: String },
    #[error("authorization failed: {reason}")]
    AuthorizationFailed { reason: String },
    #[error("login window error: {0}")]
    LoginWindow(String),
    #[error("no resource has been opened")]
    NoResource,
}
