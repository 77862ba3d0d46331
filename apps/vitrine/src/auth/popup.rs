use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Window name shared by every login navigation, so a second login request
/// re-targets the window already on screen instead of stacking new ones.
pub const LOGIN_WINDOW_NAME: &str = "loginwindow";

/// Handle onto the out-of-band login context.
///
/// The login page is foreign-origin: its content, navigation and outcome are
/// all invisible to us. The closed flag is the only observable state.
pub trait LoginWindow: Send + Sync {
    fn is_closed(&self) -> bool;
}

/// Opens the login context in response to an explicit user gesture.
pub trait LoginOpener: Send + Sync {
    fn open(&self, login_uri: &str, window_name: &str) -> anyhow::Result<Arc<dyn LoginWindow>>;
}

/// Polls a login window's closed flag until it flips.
///
/// A foreign-origin window emits no close event to its opener, so a timer
/// probe is the only reliable closure signal.
pub struct PopupMonitor {
    poll_interval: Duration,
}

impl PopupMonitor {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Starts watching `window`. The returned watch resolves exactly once,
    /// when the window is first observed closed.
    pub fn watch(&self, window: Arc<dyn LoginWindow>, attempt: u64) -> ClosureWatch {
        let interval = self.poll_interval;
        let (closed_tx, closed_rx) = oneshot::channel();
        let poll_task = tokio::spawn(async move {
            loop {
                if window.is_closed() {
                    debug!(attempt, "login window closed");
                    let _ = closed_tx.send(());
                    return;
                }
                trace!(attempt, "login window still open");
                tokio::time::sleep(interval).await;
            }
        });
        ClosureWatch {
            poll_task,
            closed_rx,
        }
    }
}

/// Pending closed signal for one login attempt.
///
/// Dropping the watch aborts the poll, so a superseded attempt can never
/// fire into a newer one.
pub struct ClosureWatch {
    poll_task: JoinHandle<()>,
    closed_rx: oneshot::Receiver<()>,
}

impl ClosureWatch {
    /// Waits until the window is observed closed.
    pub async fn closed(mut self) {
        let _ = (&mut self.closed_rx).await;
    }
}

impl Drop for ClosureWatch {
    fn drop(&mut self) {
        self.poll_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    /// Window whose closed flag flips after a fixed number of probes. Counts
    /// every probe so tests can tell whether the poll is still running.
    struct ProbedWindow {
        probes: AtomicU64,
        close_after: u64,
    }

    impl ProbedWindow {
        fn new(close_after: u64) -> Arc<Self> {
            Arc::new(Self {
                probes: AtomicU64::new(0),
                close_after,
            })
        }

        fn probes(&self) -> u64 {
            self.probes.load(Ordering::SeqCst)
        }
    }

    impl LoginWindow for ProbedWindow {
        fn is_closed(&self) -> bool {
            let seen = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
            seen > self.close_after
        }
    }

    struct FlaggedWindow {
        closed: AtomicBool,
    }

    impl LoginWindow for FlaggedWindow {
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn already_closed_window_resolves_immediately() {
        let monitor = PopupMonitor::new(Duration::from_millis(5));
        let window = Arc::new(FlaggedWindow {
            closed: AtomicBool::new(true),
        });
        let watch = monitor.watch(window, 1);
        tokio::time::timeout(Duration::from_secs(1), watch.closed())
            .await
            .expect("watch should resolve");
    }

    #[tokio::test]
    async fn polling_stops_once_the_window_closes() {
        let monitor = PopupMonitor::new(Duration::from_millis(5));
        let window = ProbedWindow::new(3);
        let watch = monitor.watch(window.clone(), 1);
        tokio::time::timeout(Duration::from_secs(1), watch.closed())
            .await
            .expect("watch should resolve");

        let probes_at_resolution = window.probes();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(window.probes(), probes_at_resolution);
    }

    #[tokio::test]
    async fn dropping_the_watch_cancels_the_poll() {
        let monitor = PopupMonitor::new(Duration::from_millis(5));
        let window = ProbedWindow::new(u64::MAX);
        let watch = monitor.watch(window.clone(), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(watch);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let probes_after_drop = window.probes();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(window.probes(), probes_after_drop);
    }
}
