pub mod terminal;

pub use terminal::TerminalUi;

/// Affordance and notice surface for the negotiation flow.
///
/// The negotiator tells the surface what the user may do next and appends
/// human-readable notices about what just happened; it never waits on the
/// surface.
pub trait AuthUi: Send + Sync {
    fn show_login_affordance(&self, label: &str, login_uri: &str);
    fn show_logout_affordance(&self, label: &str, logout_uri: &str);
    fn clear_affordances(&self);
    fn append_notice(&self, text: &str);
}
