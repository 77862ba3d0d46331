pub mod channel;
pub mod config;
pub mod error;
pub mod fetch;
pub mod popup;
pub mod session;

pub use channel::{CredentialChannel, EmbeddedFrame, FrameMessage, HttpMessageFrame};
pub use config::AuthConfig;
pub use error::AuthError;
pub use fetch::InfoFetcher;
pub use popup::{ClosureWatch, LOGIN_WINDOW_NAME, LoginOpener, LoginWindow, PopupMonitor};
pub use session::{AuthNegotiator, AuthState, Session};
