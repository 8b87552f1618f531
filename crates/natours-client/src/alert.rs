use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

/// Default time an alert stays visible
pub const DEFAULT_AUTO_HIDE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

/// A message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

/// A visible, dismissable message area
pub trait Alerts: Send + Sync {
    /// Show a message, replacing whatever is currently shown
    fn show(&self, kind: AlertKind, message: &str);

    /// Remove the current message, if any
    fn hide(&self);
}

/// In-process alert area with auto-hide
///
/// Observers follow the current alert through [`AlertBoard::subscribe`].
/// Auto-hide only runs inside a Tokio runtime; outside one, alerts stay
/// until hidden.
#[derive(Debug, Clone)]
pub struct AlertBoard {
    current: Arc<watch::Sender<Option<Alert>>>,
    generation: Arc<AtomicU64>,
    auto_hide: Duration,
}

impl Default for AlertBoard {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_HIDE)
    }
}

impl AlertBoard {
    pub fn new(auto_hide: Duration) -> Self {
        Self {
            current: Arc::new(watch::Sender::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            auto_hide,
        }
    }

    /// The alert currently shown
    pub fn current(&self) -> Option<Alert> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Alert>> {
        self.current.subscribe()
    }
}

impl Alerts for AlertBoard {
    fn show(&self, kind: AlertKind, message: &str) {
        self.hide();
        let generation = self.generation.load(Ordering::SeqCst);
        self.current.send_replace(Some(Alert {
            kind,
            message: message.to_owned(),
        }));

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let current = Arc::clone(&self.current);
        let counter = Arc::clone(&self.generation);
        let delay = self.auto_hide;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // A newer alert owns the board now
            if counter.load(Ordering::SeqCst) == generation {
                counter.fetch_add(1, Ordering::SeqCst);
                current.send_replace(None);
            }
        });
    }

    fn hide(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.current.send_replace(None);
    }
}
