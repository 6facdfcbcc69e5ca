use std::sync::{Arc, Weak};
use std::time::Duration;

/// Work units processed per slice when a task only scans (dry run).
pub const SCAN_SLICE_UNITS: usize = 100_000;
/// Work units per slice when each unit mutates the store and triggers a
/// reimport.
pub const MUTATE_SLICE_UNITS: usize = 100;
/// How long a task yields back to the host between slices.
pub const SLICE_PAUSE: Duration = Duration::from_millis(30);

/// Liveness anchor held by whatever context drives a long-running task
/// (a window, a CLI invocation). Dropping the handle cancels every task
/// holding one of its tokens at its next slice boundary.
#[derive(Debug, Default)]
pub struct OwnerHandle {
    alive: Arc<()>,
}

impl OwnerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> OwnerToken {
        OwnerToken {
            owner: Some(Arc::downgrade(&self.alive)),
        }
    }
}

/// Non-owning liveness reference a task checks on each resumption.
#[derive(Debug, Clone, Default)]
pub struct OwnerToken {
    /// `None` means the task is not tied to any owner and never cancels.
    owner: Option<Weak<()>>,
}

impl OwnerToken {
    /// A token with no owner; tasks holding it run to completion.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        match &self.owner {
            Some(weak) => weak.strong_count() > 0,
            None => true,
        }
    }
}

/// State of a cooperative task after a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// More work units remain; pump again after yielding.
    Running,
    /// All work units completed.
    Finished,
    /// The owning context disappeared; remaining units were abandoned.
    Cancelled,
}

/// Per-slice resource budget of a cooperative task.
#[derive(Debug, Clone, Copy)]
pub struct SliceBudget {
    pub units: usize,
    pub pause: Duration,
}

impl SliceBudget {
    /// Budget for scan-only slices.
    pub fn scanning() -> Self {
        Self {
            units: SCAN_SLICE_UNITS,
            pause: SLICE_PAUSE,
        }
    }

    /// Budget for slices where every unit may reimport an asset.
    pub fn mutating() -> Self {
        Self {
            units: MUTATE_SLICE_UNITS,
            pause: SLICE_PAUSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_dies_with_its_handle() {
        let handle = OwnerHandle::new();
        let token = handle.token();
        assert!(token.is_alive());
        drop(handle);
        assert!(!token.is_alive());
    }

    #[test]
    fn detached_token_is_always_alive() {
        assert!(OwnerToken::detached().is_alive());
    }
}
