//! Recovery policies for sessions left open across an application switch.
//!
//! An application must clear its session before the user navigates away.
//! When the navigation watcher sees an app change while a session is still
//! active, it hands an [`OpenSessionViolation`] plus a recovery callback to
//! the configured [`NavigationPolicy`].

use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{error, warn};

use crate::config::{NavigationConfig, NavigationMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSessionViolation {
    /// The application that was current when the session was left open.
    pub app_id: Option<String>,
    pub session_id: String,
    /// The application being navigated to.
    pub next_app_id: Option<String>,
}

impl OpenSessionViolation {
    pub fn message(&self) -> String {
        format!(
            "Application '{}' had an open session while navigating",
            self.app_id.as_deref().unwrap_or("unknown")
        )
    }
}

/// Recovery callback; clears the violating session if it is still current.
pub type Recover = Box<dyn FnOnce() + Send + 'static>;

pub trait NavigationPolicy: Send + Sync {
    fn on_violation(&self, violation: OpenSessionViolation, recover: Recover);
}

/// Warns and clears the session right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateRecovery;

impl NavigationPolicy for ImmediateRecovery {
    fn on_violation(&self, violation: OpenSessionViolation, recover: Recover) {
        warn!(
            app_id = ?violation.app_id,
            next_app_id = ?violation.next_app_id,
            session_id = %violation.session_id,
            "{}",
            violation.message()
        );
        recover();
    }
}

/// Waits out the app-switch transition, then reports loudly and clears.
///
/// The timer runs on the runtime that was current when the policy was built,
/// or else the one current at the violation. With neither, the session is
/// cleared straight away.
#[derive(Debug, Clone)]
pub struct DeferredRecovery {
    delay: Duration,
    runtime: Option<Handle>,
}

impl DeferredRecovery {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new(delay: Duration) -> Self {
        DeferredRecovery {
            delay,
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for DeferredRecovery {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl NavigationPolicy for DeferredRecovery {
    fn on_violation(&self, violation: OpenSessionViolation, recover: Recover) {
        let delay = self.delay;
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            error!(
                app_id = ?violation.app_id,
                next_app_id = ?violation.next_app_id,
                session_id = %violation.session_id,
                "{} (no async runtime for deferred recovery; clearing now)",
                violation.message()
            );
            recover();
            return;
        };
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            error!(
                app_id = ?violation.app_id,
                next_app_id = ?violation.next_app_id,
                session_id = %violation.session_id,
                delay_ms = delay.as_millis() as u64,
                "{}",
                violation.message()
            );
            recover();
        });
    }
}

pub fn policy_from_config(config: &NavigationConfig) -> std::sync::Arc<dyn NavigationPolicy> {
    match config.mode {
        NavigationMode::Immediate => std::sync::Arc::new(ImmediateRecovery),
        NavigationMode::Deferred => std::sync::Arc::new(DeferredRecovery::new(
            Duration::from_millis(config.deferred_delay_ms),
        )),
    }
}
