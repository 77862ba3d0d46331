use crate::auth::error::AuthError;
use std::env;
use std::time::Duration;

const DEFAULT_POPUP_POLL_MS: u64 = 500;
const DEFAULT_RECOVERY_DELAY_MS: u64 = 3_000;
const DEFAULT_TOKEN_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Timing knobs for the negotiation flow.
///
/// The defaults match what a user tolerates in practice: a half-second probe
/// of the login window, a few seconds to read a failure notice before the
/// unauthenticated view returns, and a generous but bounded wait on the token
/// service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub popup_poll_interval: Duration,
    pub recovery_delay: Duration,
    pub token_exchange_timeout: Duration,
    pub http_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            popup_poll_interval: Duration::from_millis(DEFAULT_POPUP_POLL_MS),
            recovery_delay: Duration::from_millis(DEFAULT_RECOVERY_DELAY_MS),
            token_exchange_timeout: Duration::from_millis(DEFAULT_TOKEN_TIMEOUT_MS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        Ok(Self {
            popup_poll_interval: millis_var("VITRINE_POPUP_POLL_MS", DEFAULT_POPUP_POLL_MS)?,
            recovery_delay: millis_var("VITRINE_RECOVERY_DELAY_MS", DEFAULT_RECOVERY_DELAY_MS)?,
            token_exchange_timeout: millis_var("VITRINE_TOKEN_TIMEOUT_MS", DEFAULT_TOKEN_TIMEOUT_MS)?,
            http_timeout: secs_var("VITRINE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        })
    }
}

fn millis_var(name: &str, default: u64) -> Result<Duration, AuthError> {
    Ok(Duration::from_millis(parse_var(name, default)?))
}

fn secs_var(name: &str, default: u64) -> Result<Duration, AuthError> {
    Ok(Duration::from_secs(parse_var(name, default)?))
}

fn parse_var(name: &str, default: u64) -> Result<u64, AuthError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|err| AuthError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AuthConfig::default();
        assert_eq!(config.popup_poll_interval, Duration::from_millis(500));
        assert_eq!(config.recovery_delay, Duration::from_secs(3));
        assert_eq!(config.token_exchange_timeout, Duration::from_secs(20));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }
}
