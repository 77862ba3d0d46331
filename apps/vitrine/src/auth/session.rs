use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vitrine_iiif::{AccessToken, AuthServices, CapabilityDocument, find_auth_services};

use crate::auth::channel::{CredentialChannel, EmbeddedFrame};
use crate::auth::config::AuthConfig;
use crate::auth::error::AuthError;
use crate::auth::fetch::InfoFetcher;
use crate::auth::popup::{LOGIN_WINDOW_NAME, LoginOpener, PopupMonitor};
use crate::ui::AuthUi;
use crate::viewer::{TileSource, Viewer};

/// Where the negotiation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AwaitingLogin,
    ExchangingToken,
    Authorized,
    AuthorizationFailed,
}

/// Everything remembered about the currently open resource.
///
/// Held exclusively by the negotiator; there is no ambient credential state
/// anywhere else.
#[derive(Debug, Clone)]
pub struct Session {
    resource: String,
    services: AuthServices,
    token: Option<AccessToken>,
}

impl Session {
    fn unauthenticated(resource: String) -> Self {
        Self {
            resource,
            services: AuthServices::default(),
            token: None,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn services(&self) -> &AuthServices {
        &self.services
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }
}

/// Drives the login / token / authorized-refetch negotiation for one
/// resource at a time.
///
/// All mutation goes through `&mut self`, so a second negotiation cannot
/// start while one is in flight; requests that arrive in the wrong state are
/// ignored with a log line rather than wedging the flow.
pub struct AuthNegotiator {
    fetcher: InfoFetcher,
    channel: CredentialChannel,
    popup: PopupMonitor,
    opener: Arc<dyn LoginOpener>,
    ui: Arc<dyn AuthUi>,
    viewer: Arc<dyn Viewer>,
    recovery_delay: Duration,
    state: AuthState,
    session: Option<Session>,
    attempt: u64,
}

impl AuthNegotiator {
    pub fn new(
        config: &AuthConfig,
        opener: Arc<dyn LoginOpener>,
        frame: Arc<dyn EmbeddedFrame>,
        ui: Arc<dyn AuthUi>,
        viewer: Arc<dyn Viewer>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            fetcher: InfoFetcher::new(config.http_timeout)?,
            channel: CredentialChannel::new(frame, config.token_exchange_timeout),
            popup: PopupMonitor::new(config.popup_poll_interval),
            opener,
            ui,
            viewer,
            recovery_delay: config.recovery_delay,
            state: AuthState::Unauthenticated,
            session: None,
            attempt: 0,
        })
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn login_available(&self) -> bool {
        self.state == AuthState::Unauthenticated
            && self
                .session
                .as_ref()
                .is_some_and(|session| session.services.login_available())
    }

    pub fn logout_available(&self) -> bool {
        self.state == AuthState::Authorized
            && self
                .session
                .as_ref()
                .is_some_and(|session| session.services.logout.is_some())
    }

    /// Opens `resource` unauthenticated and discovers its auth services.
    ///
    /// This is the entry point and also the state every failed negotiation
    /// falls back to.
    pub async fn open_resource(&mut self, resource: &str) -> Result<(), AuthError> {
        info!(resource, "opening resource");
        self.state = AuthState::Unauthenticated;
        self.session = Some(Session::unauthenticated(resource.to_string()));
        self.ui.clear_affordances();
        self.ui.append_notice("Loading resource description");
        self.load_unauthenticated().await
    }

    /// Runs one login negotiation: login window, token exchange, authorized
    /// re-fetch.
    ///
    /// Outcomes the flow is designed to absorb (refused token, rejected
    /// authorization) return `Ok` with the negotiator back in
    /// `Unauthenticated`; only environmental failures surface as errors.
    pub async fn begin_login(&mut self) -> Result<(), AuthError> {
        if self.state != AuthState::Unauthenticated {
            debug!(state = ?self.state, "ignoring login request while negotiation is underway");
            return Ok(());
        }
        let Some((login_uri, token_uri)) = self.login_target() else {
            self.ui.append_notice("No login service available");
            return Ok(());
        };
        self.attempt += 1;
        let attempt = self.attempt;
        info!(attempt, login = %login_uri, "starting login negotiation");

        self.state = AuthState::AwaitingLogin;
        self.ui.clear_affordances();
        self.ui.append_notice("Opening login window");
        let window = match self.opener.open(&login_uri, LOGIN_WINDOW_NAME) {
            Ok(window) => window,
            Err(err) => {
                warn!(attempt, error = %err, "failed to open login window");
                self.ui
                    .append_notice(&format!("Could not open login window: {err}"));
                self.reopen_unauthenticated().await?;
                return Err(AuthError::LoginWindow(err.to_string()));
            }
        };
        self.popup.watch(window, attempt).closed().await;
        self.ui
            .append_notice("Login window closed; requesting access token");

        self.state = AuthState::ExchangingToken;
        let token = match self.channel.request_access_token(&token_uri).await {
            Ok(token) => token,
            Err(err) => {
                warn!(attempt, error = %err, "token exchange failed");
                self.ui.append_notice(&format!(
                    "Failed to obtain access token: {}",
                    failure_reason(&err)
                ));
                self.reopen_unauthenticated().await?;
                return Ok(());
            }
        };
        debug!(attempt, token_len = token.as_str().len(), "access token received");
        self.ui.append_notice("Access token received");

        let resource = self.current_resource()?;
        self.ui.append_notice("Loading authorized resource description");
        match self.fetcher.fetch_info_authorized(&resource, &token).await {
            Ok(document) => {
                info!(attempt, resource = %resource, "authorization succeeded");
                if let Some(session) = self.session.as_mut() {
                    session.token = Some(token);
                }
                self.enter_authorized(resource, document).await;
                Ok(())
            }
            Err(err) => {
                warn!(attempt, error = %err, "authorized fetch failed");
                self.state = AuthState::AuthorizationFailed;
                self.ui.append_notice(&format!(
                    "Authorization failed: {}",
                    failure_reason(&err)
                ));
                // Leave the failure on screen long enough to read before the
                // unauthenticated view takes over again.
                tokio::time::sleep(self.recovery_delay).await;
                self.reopen_unauthenticated().await?;
                Ok(())
            }
        }
    }

    /// Forgets the token and returns to the unauthenticated view.
    ///
    /// The logout service URI is advertised to the user but never called
    /// here; ending the server-side session is the login page's business.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        if self.state != AuthState::Authorized {
            debug!(state = ?self.state, "ignoring logout request without an authorized session");
            return Ok(());
        }
        info!("logging out");
        self.ui.append_notice("Logging out");
        self.reopen_unauthenticated().await
    }

    async fn load_unauthenticated(&mut self) -> Result<(), AuthError> {
        let resource = self.current_resource()?;
        match self.fetcher.fetch_info(&resource).await {
            Ok(document) => {
                self.apply_unauthenticated_document(resource, document).await;
                Ok(())
            }
            Err(err) => {
                warn!(resource = %resource, error = %err, "unauthenticated fetch failed");
                self.ui
                    .append_notice(&format!("Could not load resource description: {err}"));
                // The renderer still gets the bare address so it can show its
                // own failed-open state.
                self.hand_to_viewer(TileSource::Uri(resource)).await;
                Err(err)
            }
        }
    }

    async fn apply_unauthenticated_document(
        &mut self,
        resource: String,
        document: CapabilityDocument,
    ) {
        let services = find_auth_services(&document);
        if let Some(login) = services.login.as_deref() {
            self.ui
                .append_notice("Found login service; adding login affordance");
            self.ui.show_login_affordance(&services.login_label, login);
        } else {
            self.ui.append_notice("No login service for this resource");
        }
        if let Some(session) = self.session.as_mut() {
            session.services = services;
        }
        self.hand_to_viewer(TileSource::Document {
            uri: resource,
            document,
        })
        .await;
    }

    async fn enter_authorized(&mut self, resource: String, document: CapabilityDocument) {
        self.state = AuthState::Authorized;
        let services = find_auth_services(&document);
        self.ui.clear_affordances();
        if let Some(logout) = services.logout.as_deref() {
            self.ui
                .append_notice("Found logout service; adding logout affordance");
            self.ui.show_logout_affordance(&services.logout_label, logout);
        } else {
            self.ui
                .append_notice("No logout service in authorized description");
        }
        if let Some(session) = self.session.as_mut() {
            session.services = services;
        }
        self.hand_to_viewer(TileSource::Document {
            uri: resource,
            document,
        })
        .await;
        self.ui.append_notice("Authorized view ready");
    }

    async fn reopen_unauthenticated(&mut self) -> Result<(), AuthError> {
        self.state = AuthState::Unauthenticated;
        if let Some(session) = self.session.as_mut() {
            session.token = None;
            session.services = AuthServices::default();
        }
        self.ui.clear_affordances();
        self.ui.append_notice("Returning to the unauthenticated view");
        self.load_unauthenticated().await
    }

    async fn hand_to_viewer(&self, source: TileSource) {
        let uri = source.uri().to_string();
        match self.viewer.open(source).await {
            Ok(()) => debug!(uri = %uri, "viewer opened tile source"),
            Err(err) => {
                warn!(uri = %uri, error = %err, "viewer failed to open tile source");
                self.ui
                    .append_notice(&format!("Viewer failed to open {uri}: {err}"));
            }
        }
    }

    fn login_target(&self) -> Option<(String, String)> {
        let services = &self.session.as_ref()?.services;
        let login = services.login.clone()?;
        // discovery only offers a login when a token endpoint came with it
        let token = services.token.clone()?;
        Some((login, token))
    }

    fn current_resource(&self) -> Result<String, AuthError> {
        self.session
            .as_ref()
            .map(|session| session.resource.clone())
            .ok_or(AuthError::NoResource)
    }
}

/// Human-readable reason for a failed step, without the error type's prefix.
fn failure_reason(err: &AuthError) -> String {
    match err {
        AuthError::TokenExchange { reason } => reason.clone(),
        AuthError::AuthorizationFailed { reason } => reason.clone(),
        AuthError::InfoFetch { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
