//! Vitrine IIIF: capability-document model shared by Vitrine clients.
//!
//! Responsibilities:
//! - modelling the image-information document and its nested service entries
//! - discovering login / token / logout auth services inside a document
//! - modelling the access token and the token service's reply payload

pub mod discovery;
pub mod info;
pub mod token;

pub use discovery::{
    AuthServices, DEFAULT_LOGIN_LABEL, DEFAULT_LOGOUT_LABEL, LOGIN_PROFILE, LOGOUT_PROFILE,
    TOKEN_PROFILE, find_auth_services,
};
pub use info::{CapabilityDocument, ServiceEntry};
pub use token::{AccessToken, NO_DESCRIPTION, TokenMessage, TokenRefusal};
