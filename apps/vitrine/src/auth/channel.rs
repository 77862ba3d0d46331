use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;
use vitrine_iiif::{AccessToken, TokenMessage};

use crate::auth::error::AuthError;

/// Cross-context message posted by the embedded token frame.
#[derive(Debug, Clone)]
pub struct FrameMessage {
    pub origin: String,
    pub data: serde_json::Value,
}

/// Hidden foreign-origin context used for the token round-trip.
///
/// The frame behaves like a message bus, not a function call: subscribers
/// register first, the frame is pointed at an address, and the foreign
/// document answers with a message event whenever it pleases.
pub trait EmbeddedFrame: Send + Sync {
    /// Subscribes to messages posted by the embedded document.
    fn messages(&self) -> broadcast::Receiver<FrameMessage>;

    /// Points the frame at a new address.
    fn navigate(&self, address: &str) -> anyhow::Result<()>;
}

/// Redeems a completed login for an access token through the embedded frame.
pub struct CredentialChannel {
    frame: Arc<dyn EmbeddedFrame>,
    exchange_timeout: Duration,
}

impl CredentialChannel {
    pub fn new(frame: Arc<dyn EmbeddedFrame>, exchange_timeout: Duration) -> Self {
        Self {
            frame,
            exchange_timeout,
        }
    }

    /// Runs one token exchange against `token_uri`.
    ///
    /// Each attempt gets a fresh correlation id; replies tagged for another
    /// attempt are ignored and the wait continues. The exchange fails if the
    /// service refuses, the frame goes away, or nothing arrives within the
    /// configured timeout.
    pub async fn request_access_token(&self, token_uri: &str) -> Result<AccessToken, AuthError> {
        let message_id = Uuid::new_v4().to_string();
        // Subscribe before navigating: the frame may answer before control
        // returns to this task.
        let mut messages = self.frame.messages();
        let address = token_address(token_uri, &message_id);
        debug!(address = %address, "requesting access token through embedded frame");
        self.frame.navigate(&address).map_err(|err| AuthError::TokenExchange {
            reason: format!("frame navigation failed: {err}"),
        })?;

        let reply = self.await_reply(&mut messages, &message_id);
        match tokio::time::timeout(self.exchange_timeout, reply).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::TokenExchange {
                reason: format!(
                    "token service did not respond within {}ms",
                    self.exchange_timeout.as_millis()
                ),
            }),
        }
    }

    async fn await_reply(
        &self,
        messages: &mut broadcast::Receiver<FrameMessage>,
        message_id: &str,
    ) -> Result<AccessToken, AuthError> {
        loop {
            match messages.recv().await {
                Ok(event) => {
                    trace!(origin = %event.origin, "received cross-context message");
                    let message = TokenMessage::from_value(&event.data);
                    if !message.matches_attempt(message_id) {
                        debug!(
                            expected = %message_id,
                            got = ?message.message_id,
                            "ignoring reply from a superseded attempt"
                        );
                        continue;
                    }
                    if let Some(code) = &message.error {
                        debug!(code = %code, "token service reported an error code");
                    }
                    if let Some(expires_in) = message.expires_in {
                        trace!(expires_in, "token service reported an expiry (unused)");
                    }
                    return message.into_result().map_err(|refusal| {
                        AuthError::TokenExchange {
                            reason: refusal.to_string(),
                        }
                    });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "message listener lagged behind the frame");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(AuthError::TokenExchange {
                        reason: "message channel closed before a reply arrived".to_string(),
                    });
                }
            }
        }
    }
}

/// Appends the correlation id to the token service address.
fn token_address(token_uri: &str, message_id: &str) -> String {
    let separator = if token_uri.contains('?') { '&' } else { '?' };
    format!("{token_uri}{separator}messageId={message_id}")
}

/// Frame backed by plain HTTP.
///
/// Navigation issues a GET of the address; the parsed JSON body is published
/// as the message event. That is exactly what the hidden-frame round-trip
/// amounts to once the document's own script is out of the picture. Transport
/// failures are published as refusal-shaped messages so the exchange settles
/// instead of running out the clock.
pub struct HttpMessageFrame {
    client: reqwest::Client,
    messages: broadcast::Sender<FrameMessage>,
}

impl HttpMessageFrame {
    pub fn new(http_timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|err| AuthError::Config(err.to_string()))?;
        let (messages, _) = broadcast::channel(16);
        Ok(Self { client, messages })
    }
}

impl EmbeddedFrame for HttpMessageFrame {
    fn messages(&self) -> broadcast::Receiver<FrameMessage> {
        self.messages.subscribe()
    }

    fn navigate(&self, address: &str) -> anyhow::Result<()> {
        let url = Url::parse(address)
            .map_err(|err| anyhow::anyhow!("invalid frame address '{address}': {err}"))?;
        let origin = url.origin().ascii_serialization();
        let client = self.client.clone();
        let messages = self.messages.clone();
        tokio::spawn(async move {
            let data = match client.get(url).send().await {
                Ok(response) => match response.json::<serde_json::Value>().await {
                    Ok(value) => value,
                    Err(err) => serde_json::json!({
                        "description": format!("token service sent an unreadable reply: {err}")
                    }),
                },
                Err(err) => serde_json::json!({
                    "description": format!("token service unreachable: {err}")
                }),
            };
            let _ = messages.send(FrameMessage { origin, data });
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Frame that answers each navigation with the next scripted batch of
    /// replies, recording every address it was pointed at.
    struct ScriptedFrame {
        reply_batches: Mutex<Vec<Vec<Value>>>,
        navigations: Mutex<Vec<String>>,
        messages: broadcast::Sender<FrameMessage>,
    }

    impl ScriptedFrame {
        fn new(reply_batches: Vec<Vec<Value>>) -> Arc<Self> {
            let (messages, _) = broadcast::channel(16);
            Arc::new(Self {
                reply_batches: Mutex::new(reply_batches),
                navigations: Mutex::new(Vec::new()),
                messages,
            })
        }

        fn navigations(&self) -> Vec<String> {
            self.navigations.lock().unwrap().clone()
        }
    }

    impl EmbeddedFrame for ScriptedFrame {
        fn messages(&self) -> broadcast::Receiver<FrameMessage> {
            self.messages.subscribe()
        }

        fn navigate(&self, address: &str) -> anyhow::Result<()> {
            self.navigations.lock().unwrap().push(address.to_string());
            // Answer synchronously: a subscriber registered after navigation
            // would miss these replies.
            let mut batches = self.reply_batches.lock().unwrap();
            if batches.is_empty() {
                return Ok(());
            }
            for data in batches.remove(0) {
                let _ = self.messages.send(FrameMessage {
                    origin: "https://auth.example.org".to_string(),
                    data,
                });
            }
            Ok(())
        }
    }

    fn channel_with(replies: Vec<Value>) -> (CredentialChannel, Arc<ScriptedFrame>) {
        let frame = ScriptedFrame::new(vec![replies]);
        let channel = CredentialChannel::new(frame.clone(), Duration::from_millis(200));
        (channel, frame)
    }

    #[tokio::test]
    async fn granted_reply_resolves_to_a_token() {
        let (channel, frame) = channel_with(vec![json!({ "accessToken": "tok-1" })]);
        let token = channel
            .request_access_token("https://auth.example.org/token")
            .await
            .unwrap();
        assert_eq!(token.as_str(), "tok-1");

        let navigations = frame.navigations();
        assert_eq!(navigations.len(), 1);
        assert!(navigations[0].starts_with("https://auth.example.org/token?messageId="));
    }

    #[tokio::test]
    async fn refusal_reason_comes_from_the_description() {
        let (channel, _frame) = channel_with(vec![json!({ "description": "expired" })]);
        let err = channel
            .request_access_token("https://auth.example.org/token")
            .await
            .unwrap_err();
        match err {
            AuthError::TokenExchange { reason } => assert_eq!(reason, "expired"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn refusal_without_description_uses_the_fallback_reason() {
        let (channel, _frame) = channel_with(vec![json!({ "error": "missingCredentials" })]);
        let err = channel
            .request_access_token("https://auth.example.org/token")
            .await
            .unwrap_err();
        match err {
            AuthError::TokenExchange { reason } => {
                assert_eq!(reason, "no description in response")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn replies_for_other_attempts_are_skipped() {
        let (channel, _frame) = channel_with(vec![
            json!({ "accessToken": "stale", "messageId": "not-this-attempt" }),
            json!({ "accessToken": "fresh" }),
        ]);
        let token = channel
            .request_access_token("https://auth.example.org/token")
            .await
            .unwrap();
        assert_eq!(token.as_str(), "fresh");
    }

    #[tokio::test]
    async fn silent_frame_times_out() {
        let (channel, _frame) = channel_with(Vec::new());
        let err = channel
            .request_access_token("https://auth.example.org/token")
            .await
            .unwrap_err();
        match err {
            AuthError::TokenExchange { reason } => {
                assert!(reason.contains("did not respond"), "reason: {reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn each_attempt_gets_a_fresh_correlation_id() {
        let frame = ScriptedFrame::new(vec![
            vec![json!({ "accessToken": "a" })],
            vec![json!({ "accessToken": "b" })],
        ]);
        let channel = CredentialChannel::new(frame.clone(), Duration::from_millis(200));
        channel
            .request_access_token("https://auth.example.org/token")
            .await
            .unwrap();
        channel
            .request_access_token("https://auth.example.org/token")
            .await
            .unwrap();

        let navigations = frame.navigations();
        assert_eq!(navigations.len(), 2);
        assert_ne!(navigations[0], navigations[1]);
    }

    #[test]
    fn correlation_id_respects_existing_query_strings() {
        assert_eq!(
            token_address("https://a.example/token", "m-1"),
            "https://a.example/token?messageId=m-1"
        );
        assert_eq!(
            token_address("https://a.example/token?tenant=x", "m-1"),
            "https://a.example/token?tenant=x&messageId=m-1"
        );
    }
}
