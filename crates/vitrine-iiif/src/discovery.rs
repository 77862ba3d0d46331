//! Auth service discovery.
//!
//! Scans a capability document for the login service and its nested token and
//! logout services. Discovery never fails: a document with missing or
//! malformed services simply offers no login.

use tracing::debug;

use crate::info::CapabilityDocument;

pub const LOGIN_PROFILE: &str = "http://iiif.io/api/auth/0/login";
pub const TOKEN_PROFILE: &str = "http://iiif.io/api/auth/0/token";
pub const LOGOUT_PROFILE: &str = "http://iiif.io/api/auth/0/logout";

pub const DEFAULT_LOGIN_LABEL: &str = "Login";
pub const DEFAULT_LOGOUT_LABEL: &str = "Logout";

/// Auth services advertised by a capability document.
///
/// `login` is only set when a token service was found alongside it: a login
/// the client cannot redeem for a token is not offered at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthServices {
    pub login: Option<String>,
    pub login_label: String,
    pub token: Option<String>,
    pub logout: Option<String>,
    pub logout_label: String,
}

impl Default for AuthServices {
    fn default() -> Self {
        Self {
            login: None,
            login_label: DEFAULT_LOGIN_LABEL.to_string(),
            token: None,
            logout: None,
            logout_label: DEFAULT_LOGOUT_LABEL.to_string(),
        }
    }
}

impl AuthServices {
    pub fn login_available(&self) -> bool {
        self.login.is_some()
    }
}

/// Extracts the auth services from a capability document.
///
/// The first login-profile entry wins. Inside it, the first token-profile
/// entry sets the token endpoint while logout entries overwrite each other,
/// so the last logout wins. Entries without an `@id` never match.
pub fn find_auth_services(document: &CapabilityDocument) -> AuthServices {
    let mut services = AuthServices::default();
    debug!(document = %document.id().unwrap_or("<no @id>"), "looking for auth services");

    let entries = document.services();
    let Some(login_entry) = entries
        .iter()
        .find(|entry| entry.has_profile(LOGIN_PROFILE) && entry.id.is_some())
    else {
        debug!("no login service in document");
        return services;
    };

    services.login = login_entry.id.clone();
    if let Some(label) = &login_entry.label {
        services.login_label = label.clone();
    }
    debug!(
        login = services.login.as_deref().unwrap_or_default(),
        label = %services.login_label,
        "found login service"
    );

    for nested in login_entry.nested_services() {
        let Some(id) = nested.id else { continue };
        if nested.profile.as_deref() == Some(TOKEN_PROFILE) {
            if services.token.is_none() {
                debug!(token = %id, "found token service");
                services.token = Some(id);
            }
        } else if nested.profile.as_deref() == Some(LOGOUT_PROFILE) {
            debug!(logout = %id, "found logout service");
            services.logout = Some(id);
            if let Some(label) = nested.label {
                services.logout_label = label;
            }
        }
    }

    if services.token.is_none() {
        // A login we cannot redeem for a token would dead-end the user.
        debug!("login service has no token service, withholding the login offer");
        services.login = None;
    }
    services
}
