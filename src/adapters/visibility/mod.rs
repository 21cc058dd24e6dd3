// Visibility adapter - Foreground signal backed by a watch channel

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::ports::VisibilityPort;

/// Process-local "capture surface is foregrounded" flag
#[derive(Debug, Clone)]
pub struct ForegroundSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ForegroundSignal {
    /// Start in the foreground
    pub fn new() -> Self {
        let (sender, _) = watch::channel(true);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish a new state; observers only wake on an actual change
    pub fn set_foreground(&self, foregrounded: bool) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == foregrounded {
                false
            } else {
                *current = foregrounded;
                true
            }
        });
        if changed {
            info!(foregrounded, "capture surface visibility changed");
        }
    }

    pub fn is_foreground(&self) -> bool {
        *self.sender.borrow()
    }

    /// Number of live registrations
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Mark the surface as left on every Ctrl-C the process receives
    pub fn background_on_ctrl_c(&self) {
        self.background_on(tokio::signal::ctrl_c);
    }

    /// Mark the surface as left each time `next` resolves, until it fails
    pub fn background_on<F, Fut>(&self, mut next: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::io::Result<()>> + Send + 'static,
    {
        let signal = self.clone();
        tokio::spawn(async move {
            while next().await.is_ok() {
                signal.set_foreground(false);
            }
        });
    }
}

impl Default for ForegroundSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityPort for ForegroundSignal {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}
