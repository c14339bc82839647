//! Peer-side handle slot
//!
//! Each peer owns exactly one [`HandleSlot`]: a single word holding either
//! nothing or an [`AnimatorHandle`]. Replacing the handle follows a
//! swap-then-destroy-old protocol: the new handle becomes visible first, then
//! the old one is released. Readers that loaded the old handle just before the
//! swap hold their own reference to it, so they see a released handle at
//! worst, never a freed one.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::engine::EngineRef;
use crate::handle::AnimatorHandle;

/// The per-peer slot mapping a peer to its animator handle
pub struct HandleSlot {
    handle: ArcSwapOption<AnimatorHandle>,
}

impl HandleSlot {
    /// An empty slot
    pub fn new() -> Self {
        Self {
            handle: ArcSwapOption::empty(),
        }
    }

    /// A slot already holding `handle`
    pub fn with_handle(handle: Arc<AnimatorHandle>) -> Self {
        Self {
            handle: ArcSwapOption::from(Some(handle)),
        }
    }

    /// Resolve the peer's engine: `None` if empty or released
    pub fn get(&self) -> Option<EngineRef> {
        self.handle.load_full().and_then(|handle| handle.acquire())
    }

    /// The current handle, released or not
    pub fn handle(&self) -> Option<Arc<AnimatorHandle>> {
        self.handle.load_full()
    }

    /// Install `handle`, then release whatever was there before
    pub fn set(&self, handle: Option<Arc<AnimatorHandle>>) {
        let old = self.handle.swap(handle);
        if let Some(old) = old {
            tracing::debug!("HandleSlot: replacing handle #{}", old.id());
            old.release();
        }
    }

    /// Empty the slot and hand back the previous handle without tearing it down
    pub fn take(&self) -> Option<Arc<AnimatorHandle>> {
        self.handle.swap(None)
    }

    pub fn is_empty(&self) -> bool {
        self.handle.load().is_none()
    }
}

impl Default for HandleSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleSlot")
            .field("handle", &self.handle.load_full())
            .finish()
    }
}
