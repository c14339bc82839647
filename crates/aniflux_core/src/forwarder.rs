//! Callback forwarding from engine to peer
//!
//! [`CallbackForwarder`] is the listener registered with the engine. On every
//! event it resolves its weak peer reference and, only if the peer is still
//! alive, delivers the matching hook. Peer-side failures stop here: errors and
//! panics are logged and cleared so the engine's dispatch loop never unwinds.
//!
//! The forwarder never calls back into an [`AnimatorHandle`](crate::AnimatorHandle),
//! so engine-thread callbacks can't form a lock cycle with handle teardown.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::engine::{AnimatorEvent, AnimatorListener};
use crate::peer::{AnimatorPeer, WeakPeer};

/// Snapshot of a forwarder's delivery counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryCounts {
    /// Notifications the peer handled successfully
    pub delivered: u64,
    /// Notifications dropped because the peer was gone
    pub dropped: u64,
    /// Notifications whose delivery failed and was cleared
    pub failed: u64,
}

#[derive(Default)]
struct DeliveryStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

/// Engine listener that forwards events to a weakly-held peer
pub struct CallbackForwarder<W: WeakPeer> {
    peer: W,
    stats: DeliveryStats,
}

impl<W: WeakPeer> CallbackForwarder<W> {
    /// Create a forwarder around an already-weak peer reference
    pub fn new(peer: W) -> Self {
        Self {
            peer,
            stats: DeliveryStats::default(),
        }
    }

    /// The weak peer reference this forwarder resolves
    pub fn peer(&self) -> &W {
        &self.peer
    }

    /// Current delivery counters
    pub fn counts(&self) -> DeliveryCounts {
        DeliveryCounts {
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    /// Resolve the peer and deliver one event to it
    ///
    /// Returns `true` if the peer handled the event. A gone peer or a failed
    /// delivery both return `false`; neither is reported to the caller.
    pub fn forward(&self, event: AnimatorEvent) -> bool {
        let Some(live) = self.peer.resolve() else {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("CallbackForwarder: peer gone, dropping {}", event);
            return false;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| live.deliver(event)));
        drop(live);

        match outcome {
            Ok(Ok(())) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Ok(Err(err)) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("CallbackForwarder: {} failed: {}", event, err);
                false
            }
            Err(payload) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "CallbackForwarder: {} panicked: {}",
                    event,
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }
}

impl<P> CallbackForwarder<Weak<P>>
where
    P: AnimatorPeer + Send + Sync + 'static,
{
    /// Create a forwarder from a live peer, downgrading it immediately
    pub fn from_strong(peer: &Arc<P>) -> Self {
        Self::new(Arc::downgrade(peer))
    }
}

impl<W: WeakPeer> AnimatorListener for CallbackForwarder<W> {
    fn on_animation_start(&self) {
        self.forward(AnimatorEvent::Start);
    }

    fn on_animation_end(&self) {
        self.forward(AnimatorEvent::End);
    }

    fn on_animation_cancel(&self) {
        self.forward(AnimatorEvent::Cancel);
    }

    fn on_animation_repeat(&self) {
        self.forward(AnimatorEvent::Repeat);
    }

    fn on_animation_update(&self) {
        self.forward(AnimatorEvent::Update);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingPeer;

    #[test]
    fn test_forwards_each_hook() {
        let peer = Arc::new(RecordingPeer::default());
        let forwarder = CallbackForwarder::from_strong(&peer);

        forwarder.on_animation_start();
        forwarder.on_animation_update();
        forwarder.on_animation_update();
        forwarder.on_animation_repeat();
        forwarder.on_animation_cancel();
        forwarder.on_animation_end();

        assert_eq!(peer.count(AnimatorEvent::Start), 1);
        assert_eq!(peer.count(AnimatorEvent::Update), 2);
        assert_eq!(peer.count(AnimatorEvent::Repeat), 1);
        assert_eq!(peer.count(AnimatorEvent::Cancel), 1);
        assert_eq!(peer.count(AnimatorEvent::End), 1);
        assert_eq!(forwarder.counts().delivered, 6);
    }

    #[test]
    fn test_peer_gone_drops_silently() {
        let peer = Arc::new(RecordingPeer::default());
        let forwarder = CallbackForwarder::from_strong(&peer);
        drop(peer);

        for event in AnimatorEvent::ALL {
            assert!(!forwarder.forward(event));
        }

        let counts = forwarder.counts();
        assert_eq!(counts.delivered, 0);
        assert_eq!(counts.dropped, 5);
        assert_eq!(counts.failed, 0);
    }

    #[test]
    fn test_peer_error_is_cleared() {
        let peer = Arc::new(RecordingPeer::failing());
        let forwarder = CallbackForwarder::from_strong(&peer);

        forwarder.on_animation_update();
        forwarder.on_animation_update();

        // The peer saw both calls; both failures were contained
        assert_eq!(peer.count(AnimatorEvent::Update), 2);
        assert_eq!(forwarder.counts().failed, 2);
    }

    #[test]
    fn test_peer_panic_is_contained() {
        let peer = Arc::new(RecordingPeer::panicking());
        let forwarder = CallbackForwarder::from_strong(&peer);

        assert!(!forwarder.forward(AnimatorEvent::Start));
        assert_eq!(forwarder.counts().failed, 1);

        // The forwarder keeps working after a panic
        assert!(!forwarder.forward(AnimatorEvent::End));
        assert_eq!(forwarder.counts().failed, 2);
    }

    #[test]
    fn test_forwarder_does_not_own_peer() {
        let peer = Arc::new(RecordingPeer::default());
        let forwarder = CallbackForwarder::from_strong(&peer);
        forwarder.on_animation_start();

        assert_eq!(Arc::strong_count(&peer), 1);
        assert!(forwarder.peer().is_alive());
    }
}
