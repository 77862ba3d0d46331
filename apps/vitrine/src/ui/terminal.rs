use std::sync::atomic::{AtomicU64, Ordering};

use crate::ui::AuthUi;

/// Prints affordances and numbered notices to stdout.
///
/// Notices keep a running number so a pasted transcript reads in order even
/// when interleaved with prompts.
#[derive(Debug, Default)]
pub struct TerminalUi {
    notice_counter: AtomicU64,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthUi for TerminalUi {
    fn show_login_affordance(&self, label: &str, login_uri: &str) {
        println!("🔐 {label}: {login_uri}");
    }

    fn show_logout_affordance(&self, label: &str, logout_uri: &str) {
        println!("🚪 {label}: {logout_uri}");
    }

    fn clear_affordances(&self) {
        // A scrolling terminal has nothing persistent to withdraw; the next
        // affordance line supersedes the previous one.
    }

    fn append_notice(&self, text: &str) {
        let number = self.notice_counter.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[{number}] {text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_numbers_increase() {
        let ui = TerminalUi::new();
        ui.append_notice("one");
        ui.append_notice("two");
        assert_eq!(ui.notice_counter.load(Ordering::Relaxed), 2);
    }
}
