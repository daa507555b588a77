//! Runtime handles shared by the session, the actor factory and the render loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// CARLA actor handle type
pub type ActorId = u32;

/// What a spawned actor is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorRole {
    Vehicle,
    Sensor,
}

impl ActorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Sensor => "sensor",
        }
    }
}

/// One entry of the teardown list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedActor {
    /// Backend handle
    pub actor_id: ActorId,

    /// Vehicle or sensor
    pub role: ActorRole,

    /// Configuration ID (e.g. "ego_vehicle")
    pub config_id: String,

    /// Blueprint the actor was spawned from
    pub blueprint: String,
}

/// Session-wide quit signal
///
/// Cloned into the render loop, the signal handler and the acquisition
/// callback. Checked once per render iteration; setting it never blocks.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<ShutdownState>,
}

#[derive(Debug, Default)]
struct ShutdownState {
    requested: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a normal quit
    pub fn request(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
    }

    /// Request a quit because of an unrecoverable error
    ///
    /// Only the first failure reason is kept.
    pub fn fail(&self, reason: impl Into<String>) {
        {
            let mut failure = self
                .inner
                .failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if failure.is_none() {
                *failure = Some(reason.into());
            }
        }
        self.request();
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Failure reason, if the quit was caused by [`ShutdownSignal::fail`]
    pub fn failure(&self) -> Option<String> {
        self.inner
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_shared_across_clones() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_requested());

        clone.request();
        assert!(signal.is_requested());
        assert_eq!(signal.failure(), None);
    }

    #[test]
    fn test_first_failure_wins() {
        let signal = ShutdownSignal::new();
        signal.fail("store invariant violated");
        signal.fail("second");

        assert!(signal.is_requested());
        assert_eq!(signal.failure().as_deref(), Some("store invariant violated"));
    }
}
