//! Animator handle
//!
//! [`AnimatorHandle`] is the proxy a peer reaches the engine through. It is
//! shared between the peer's owning thread, the engine's callback thread and
//! a finalizer-style thread that may tear it down at any moment.
//!
//! Teardown is decided by a single compare-and-set on `released`; the mutex
//! only guards copying and clearing the two shared references. The winner
//! clears both references under the lock, drops the forwarder (the engine
//! holds it weakly, so this disconnects callbacks), and only then cancels the
//! engine with no lock held. Cancellation is free to re-enter the handle.
//!
//! ```text
//!  peer thread ── acquire() ──┐            ┌── release()        (Cancel)
//!                             ▼            ▼
//!                    ┌──────────────────────────┐
//!                    │ released: AtomicBool     │
//!                    │ state: Mutex<            │
//!                    │   engine, forwarder>     │
//!                    └──────────────────────────┘
//!                                          ▲
//!  finalizer thread ───────────────────────┴── mark_released_only() (FlagOnly)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::engine::{AnimatorListener, EngineRef};
use crate::forwarder::CallbackForwarder;
use crate::peer::WeakPeer;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// How a teardown treats the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPolicy {
    /// Disconnect callbacks, then cancel the engine outside the lock.
    /// Used for explicit releases from the owning thread.
    Cancel,
    /// Disconnect callbacks and drop references without calling into the
    /// engine. Used from finalizer threads that must never block or re-enter
    /// the peer runtime.
    FlagOnly,
}

impl fmt::Display for TeardownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownPolicy::Cancel => f.write_str("cancel"),
            TeardownPolicy::FlagOnly => f.write_str("flag_only"),
        }
    }
}

struct HandleState {
    engine: Option<EngineRef>,
    forwarder: Option<Arc<dyn AnimatorListener>>,
}

/// Reference-counted proxy to one engine instance and its callback forwarder
pub struct AnimatorHandle {
    id: u64,
    /// Set exactly once, by whichever teardown wins
    released: AtomicBool,
    state: Mutex<HandleState>,
}

impl AnimatorHandle {
    /// Wrap an engine and register `forwarder` as its listener
    ///
    /// The handle keeps the only strong reference to the forwarder.
    pub fn new(engine: EngineRef, forwarder: Arc<dyn AnimatorListener>) -> Self {
        engine.set_listener(Arc::downgrade(&forwarder));
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("AnimatorHandle #{}: created", id);
        Self {
            id,
            released: AtomicBool::new(false),
            state: Mutex::new(HandleState {
                engine: Some(engine),
                forwarder: Some(forwarder),
            }),
        }
    }

    /// Build a fresh forwarder for `peer` and wrap `engine` with it
    pub fn with_peer<W: WeakPeer>(engine: EngineRef, peer: W) -> Self {
        Self::new(engine, Arc::new(CallbackForwarder::new(peer)))
    }

    /// Process-unique id, for logging
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get a strong reference to the engine, or `None` once released
    ///
    /// The returned reference stays valid even if `release()` runs
    /// concurrently afterwards.
    pub fn acquire(&self) -> Option<EngineRef> {
        if self.released.load(Ordering::Acquire) {
            return None;
        }
        self.state.lock().engine.clone()
    }

    /// Tear down: disconnect callbacks, then cancel the engine
    ///
    /// Idempotent. Returns `true` only for the call that performed teardown.
    pub fn release(&self) -> bool {
        self.release_with(TeardownPolicy::Cancel)
    }

    /// Finalizer-path teardown: flip the flag and drop references without
    /// calling into the engine. Later `release()` calls are no-ops.
    pub fn mark_released_only(&self) -> bool {
        self.release_with(TeardownPolicy::FlagOnly)
    }

    /// Tear down under the given policy
    ///
    /// Exactly one caller across all threads and both policies wins the
    /// transition; every other call returns `false` immediately.
    pub fn release_with(&self, policy: TeardownPolicy) -> bool {
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("AnimatorHandle #{}: already released", self.id);
            return false;
        }

        let (engine, forwarder) = {
            let mut state = self.state.lock();
            (state.engine.take(), state.forwarder.take())
        };

        // Engine only holds the forwarder weakly; dropping ours disconnects
        // it unless a callback is in flight right now.
        drop(forwarder);

        match (policy, engine) {
            (TeardownPolicy::Cancel, Some(engine)) => engine.cancel(),
            (TeardownPolicy::FlagOnly, Some(_)) | (_, None) => {}
        }

        tracing::debug!("AnimatorHandle #{}: released ({})", self.id, policy);
        true
    }

    /// Whether teardown has happened. Never blocks.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for AnimatorHandle {
    fn drop(&mut self) {
        // Never cancels: teardown belongs to release()
        if !*self.released.get_mut() {
            let state = self.state.get_mut();
            state.forwarder = None;
            state.engine = None;
            tracing::debug!("AnimatorHandle #{}: dropped without release", self.id);
        }
    }
}

impl fmt::Debug for AnimatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorHandle")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}
