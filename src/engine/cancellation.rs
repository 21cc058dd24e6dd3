//! Aborts a run when the capture surface leaves the foreground

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::engine::capture_session::SessionHandle;
use crate::ports::VisibilityPort;

/// Per-run observer of the foreground signal.
///
/// Registered before capture is acquired and deregistered on every exit
/// path, including drop. Fires at most once.
pub struct CancellationWatcher {
    subscription: Option<watch::Receiver<bool>>,
    backgrounded_at_arm: bool,
    fired: bool,
}

impl CancellationWatcher {
    pub fn register(port: &dyn VisibilityPort) -> Self {
        debug!("cancellation watcher registered");
        Self {
            subscription: Some(port.subscribe()),
            backgrounded_at_arm: false,
            fired: false,
        }
    }

    /// Forget transitions seen before the session started recording.
    ///
    /// A surface that is still in the background at this point cancels the
    /// run as soon as `cancelled` is polled.
    pub fn arm(&mut self) {
        if let Some(subscription) = self.subscription.as_mut() {
            let foregrounded = *subscription.borrow_and_update();
            if !foregrounded {
                warn!("capture surface is not in the foreground as recording starts");
            }
            self.backgrounded_at_arm = !foregrounded;
        }
    }

    pub fn is_registered(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn deregister(&mut self) {
        if self.subscription.take().is_some() {
            debug!("cancellation watcher deregistered");
        }
    }

    /// Resolve once the surface goes to the background while `session` records.
    ///
    /// Stops the session and its tracks before yielding `CancelledByUser`.
    /// Stays pending forever once deregistered or if the signal source closes.
    pub async fn cancelled(&mut self, session: &SessionHandle) -> DomainError {
        if std::mem::take(&mut self.backgrounded_at_arm)
            && self.is_registered()
            && session.is_recording()
        {
            return self.fire(session);
        }

        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                return std::future::pending::<DomainError>().await;
            };

            if subscription.changed().await.is_err() {
                debug!("foreground signal closed");
                self.deregister();
                continue;
            }

            let foregrounded = *subscription.borrow_and_update();
            if foregrounded || !session.is_recording() {
                continue;
            }

            warn!("capture surface left the foreground, cancelling recording");
            return self.fire(session);
        }
    }

    fn fire(&mut self, session: &SessionHandle) -> DomainError {
        session.stop();
        session.release_tracks();
        self.fired = true;
        self.deregister();
        DomainError::CancelledByUser
    }
}

impl Drop for CancellationWatcher {
    fn drop(&mut self) {
        self.deregister();
    }
}
