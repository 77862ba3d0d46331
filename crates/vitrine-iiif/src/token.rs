//! Access token and token-service reply payload.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Fallback reason when a token service rejects the exchange without saying
/// why.
pub const NO_DESCRIPTION: &str = "no description in response";

/// Opaque credential issued by a token service.
///
/// Sent back to the resource server verbatim in the `Authorization` header.
/// The `Debug` form is redacted so the raw value never leaks through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Refusal reported by a token service instead of a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TokenRefusal(pub String);

/// Reply posted by a token service.
///
/// The payload is read leniently: any field may be absent, and a payload that
/// is not even an object is treated as a refusal with no description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenMessage {
    pub access_token: Option<String>,
    pub message_id: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
    pub description: Option<String>,
}

impl TokenMessage {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Whether this reply belongs to the attempt identified by `message_id`.
    ///
    /// Replies that carry no id at all are accepted; only an id for a
    /// different attempt disqualifies the reply.
    pub fn matches_attempt(&self, message_id: &str) -> bool {
        self.message_id
            .as_deref()
            .map_or(true, |id| id == message_id)
    }

    /// Resolves the reply: a token when one was granted, otherwise the
    /// service's stated reason for refusing.
    pub fn into_result(self) -> Result<AccessToken, TokenRefusal> {
        match self.access_token {
            Some(raw) => Ok(AccessToken::new(raw)),
            None => Err(TokenRefusal(
                self.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            )),
        }
    }
}
