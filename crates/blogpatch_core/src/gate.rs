//! Version and state gate.
//!
//! Decides whether a field change may start a sync cycle at all, and owns the
//! document version counter. The flags are atomics so an input thread holding
//! an `Arc<SyncGate>` can toggle composition while the session owns the rest.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Why a change was or was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    /// Old and new values are equal.
    Unchanged,
    /// An input-method composition is in progress.
    Composing,
    /// A full pull is overwriting local state.
    Pulling,
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

#[derive(Debug, Default)]
pub struct SyncGate {
    composing: AtomicBool,
    pulling: AtomicBool,
    version: AtomicI64,
}

impl SyncGate {
    pub fn new(version: i64) -> Self {
        Self {
            composing: AtomicBool::new(false),
            pulling: AtomicBool::new(false),
            version: AtomicI64::new(version),
        }
    }

    /// Pre-check a field change.
    pub fn check<T: PartialEq + ?Sized>(&self, old: &T, new: &T) -> GateDecision {
        if old == new {
            GateDecision::Unchanged
        } else if self.is_composing() {
            GateDecision::Composing
        } else if self.is_pulling() {
            GateDecision::Pulling
        } else {
            GateDecision::Accept
        }
    }

    pub fn set_composing(&self, composing: bool) {
        self.composing.store(composing, Ordering::SeqCst);
    }

    pub fn is_composing(&self) -> bool {
        self.composing.load(Ordering::SeqCst)
    }

    pub fn is_pulling(&self) -> bool {
        self.pulling.load(Ordering::SeqCst)
    }

    /// Mark a pull in flight until the returned guard is dropped.
    pub fn begin_pull(&self) -> PullGuard<'_> {
        self.pulling.store(true, Ordering::SeqCst);
        PullGuard { gate: self }
    }

    /// Last committed version.
    pub fn version(&self) -> i64 {
        self.version.load(Ordering::SeqCst)
    }

    /// The version the next cycle will carry. Not committed until
    /// [`commit`](Self::commit) is called.
    pub fn next_version(&self) -> i64 {
        self.version() + 1
    }

    /// Commit a stamped version after its hand-off succeeded. Returns `false`
    /// (and leaves the counter alone) if `version` is not the next one.
    pub fn commit(&self, version: i64) -> bool {
        self.version
            .compare_exchange(version - 1, version, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Overwrite the counter with an authoritative version from a pull.
    pub fn reset(&self, version: i64) {
        self.version.store(version, Ordering::SeqCst);
    }
}

/// Clears the pulling flag on drop, including on early error returns.
#[must_use = "pulling is cleared as soon as the guard is dropped"]
pub struct PullGuard<'a> {
    gate: &'a SyncGate,
}

impl Drop for PullGuard<'_> {
    fn drop(&mut self) {
        self.gate.pulling.store(false, Ordering::SeqCst);
    }
}
