//! Peer objects and weak peer references
//!
//! A peer is the object on the embedding side (a Java `PAGAnimator`, a Rust
//! view, ...) that wants to hear about animator lifecycle changes. The native
//! side never owns it: it only keeps a [`WeakPeer`] and resolves it right
//! before each notification.

use std::sync::{Arc, Weak};

use crate::engine::AnimatorEvent;
use crate::error::PeerResult;

/// Notification hooks implemented by a peer
///
/// Every hook defaults to a no-op so peers only implement what they use.
/// Returning an error (or panicking) is contained by the forwarder.
pub trait AnimatorPeer {
    fn on_animation_start(&self) -> PeerResult {
        Ok(())
    }

    fn on_animation_end(&self) -> PeerResult {
        Ok(())
    }

    fn on_animation_cancel(&self) -> PeerResult {
        Ok(())
    }

    fn on_animation_repeat(&self) -> PeerResult {
        Ok(())
    }

    fn on_animation_update(&self) -> PeerResult {
        Ok(())
    }

    /// Dispatch an event to the matching hook
    fn deliver(&self, event: AnimatorEvent) -> PeerResult {
        match event {
            AnimatorEvent::Start => self.on_animation_start(),
            AnimatorEvent::End => self.on_animation_end(),
            AnimatorEvent::Cancel => self.on_animation_cancel(),
            AnimatorEvent::Repeat => self.on_animation_repeat(),
            AnimatorEvent::Update => self.on_animation_update(),
        }
    }
}

impl<P: AnimatorPeer + ?Sized> AnimatorPeer for Arc<P> {
    fn on_animation_start(&self) -> PeerResult {
        (**self).on_animation_start()
    }

    fn on_animation_end(&self) -> PeerResult {
        (**self).on_animation_end()
    }

    fn on_animation_cancel(&self) -> PeerResult {
        (**self).on_animation_cancel()
    }

    fn on_animation_repeat(&self) -> PeerResult {
        (**self).on_animation_repeat()
    }

    fn on_animation_update(&self) -> PeerResult {
        (**self).on_animation_update()
    }
}

/// Non-owning, runtime-validated reference to a peer
///
/// `resolve` either yields a live value that is safe to call through for the
/// duration of one notification, or `None` once the peer is gone. The live
/// value must not outlive that call; implementations are free to tie it to
/// per-thread state (an attached JNI environment, for instance).
pub trait WeakPeer: Send + Sync + 'static {
    /// Strong-use view of the peer, valid for one call
    type Live<'a>: AnimatorPeer
    where
        Self: 'a;

    fn resolve(&self) -> Option<Self::Live<'_>>;

    /// Check whether the peer is still reachable
    fn is_alive(&self) -> bool {
        self.resolve().is_some()
    }
}

impl<P> WeakPeer for Weak<P>
where
    P: AnimatorPeer + Send + Sync + 'static,
{
    type Live<'a> = Arc<P>;

    fn resolve(&self) -> Option<Arc<P>> {
        self.upgrade()
    }

    fn is_alive(&self) -> bool {
        self.strong_count() > 0
    }
}
