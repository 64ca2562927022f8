//! Periodic reload scheduling.
//!
//! While auto-refresh is enabled a background task ticks every
//! `refreshInterval` and signals the owner, but only while the dashboard is
//! visible. Reconfiguring cancels the running task before starting a new one,
//! and dropping the scheduler cancels it too.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::settings::{SystemSettings, MIN_REFRESH_INTERVAL_MS};

/// Whether the dashboard is currently on screen.
///
/// Cheap to clone; every clone shares the same flag.
#[derive(Debug, Clone)]
pub struct Visibility {
    visible: Arc<AtomicBool>,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Visibility {
    /// Create a flag with the given initial state.
    #[must_use]
    pub fn new(visible: bool) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(visible)),
        }
    }

    /// Mark the dashboard shown or hidden.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    /// Check whether the dashboard is shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

/// A signal that the dashboard should reload its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTick {
    /// When the tick fired.
    pub at: Instant,
}

/// Owns the background refresh task.
#[derive(Debug)]
pub struct AutoRefresh {
    visibility: Visibility,
    task: Option<JoinHandle<()>>,
    period: Option<Duration>,
}

impl AutoRefresh {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            task: None,
            period: None,
        }
    }

    /// The shared visibility flag.
    #[must_use]
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// Apply `settings`, replacing any running task.
    ///
    /// Returns the tick receiver when auto-refresh is enabled, `None` when it
    /// is off. Ticks are coalesced: if the previous tick has not been taken
    /// yet, the new one is dropped.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the refresh interval is shorter than
    /// [`MIN_REFRESH_INTERVAL_MS`], or an internal error if called outside a
    /// tokio runtime while auto-refresh is enabled.
    pub fn configure(
        &mut self,
        settings: &SystemSettings,
    ) -> Result<Option<mpsc::Receiver<RefreshTick>>> {
        self.cancel();
        if !settings.auto_refresh {
            debug!("Auto-refresh disabled");
            return Ok(None);
        }

        if settings.refresh_interval < MIN_REFRESH_INTERVAL_MS {
            return Err(Error::validation(
                "refreshInterval",
                format!("Refresh interval must be at least {MIN_REFRESH_INTERVAL_MS} ms"),
            ));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::internal(format!("auto-refresh needs a tokio runtime: {e}")))?;

        let period = settings.refresh_period();
        let (tx, rx) = mpsc::channel(1);
        let visibility = self.visibility.clone();

        self.task = Some(runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let at = interval.tick().await;
                if !visibility.is_visible() {
                    trace!("Skipping refresh while hidden");
                    continue;
                }
                match tx.try_send(RefreshTick { at }) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }));
        self.period = Some(period);

        debug!("Auto-refresh every {} ms", period.as_millis());
        Ok(Some(rx))
    }

    /// Stop the running task, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Auto-refresh cancelled");
        }
        self.period = None;
    }

    /// Whether a refresh task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// The active refresh period.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.cancel();
    }
}
