//! Setup / release / finalize
//!
//! The three lifecycle entry points a peer runtime calls. `setup` runs on the
//! peer's owning thread, `release` on whichever thread the peer calls it from,
//! and `finalize` on the runtime's finalizer thread.

use std::sync::Arc;

use crate::engine::EngineRef;
use crate::handle::{AnimatorHandle, TeardownPolicy};
use crate::peer::WeakPeer;
use crate::registry::HandleSlot;

/// Create a fresh handle for `engine` and `peer` and install it in `slot`
///
/// Any handle already in the slot is released after the new one is visible.
pub fn setup<W: WeakPeer>(slot: &HandleSlot, engine: EngineRef, peer: W) -> Arc<AnimatorHandle> {
    let handle = Arc::new(AnimatorHandle::with_peer(engine, peer));
    slot.set(Some(handle.clone()));
    handle
}

/// Explicit release from the peer
///
/// Cancels the engine. The released handle stays in the slot, so later
/// accessor calls see defaults instead of a missing peer field.
pub fn release(slot: &HandleSlot) -> bool {
    match slot.handle() {
        Some(handle) => handle.release(),
        None => false,
    }
}

/// Finalizer-driven teardown
///
/// Empties the slot, tears the handle down under `policy`, and drops the
/// slot's reference. Returns `true` if this call performed the teardown.
pub fn finalize(slot: &HandleSlot, policy: TeardownPolicy) -> bool {
    let Some(handle) = slot.take() else {
        return false;
    };
    let torn_down = handle.release_with(policy);
    tracing::debug!(
        "finalize: handle #{} ({}, teardown={})",
        handle.id(),
        policy,
        torn_down
    );
    torn_down
}
