//! Test doubles shared by the unit tests of this crate

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::engine::{AnimationEngine, AnimatorEvent, AnimatorListener};
use crate::error::{PeerError, PeerResult};
use crate::peer::AnimatorPeer;

type Hook = Arc<dyn Fn(AnimatorEvent) + Send + Sync>;

#[derive(Clone, Copy, Default, PartialEq)]
enum PeerMode {
    #[default]
    Ok,
    Failing,
    Panicking,
}

/// Peer that counts every notification it receives
#[derive(Default)]
pub struct RecordingPeer {
    counts: [AtomicUsize; 5],
    mode: PeerMode,
    hook: Mutex<Option<Hook>>,
}

impl RecordingPeer {
    pub fn failing() -> Self {
        Self {
            mode: PeerMode::Failing,
            ..Default::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            mode: PeerMode::Panicking,
            ..Default::default()
        }
    }

    /// Run `hook` inside every notification, after it is counted
    pub fn set_hook(&self, hook: impl Fn(AnimatorEvent) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Arc::new(hook));
    }

    pub fn count(&self, event: AnimatorEvent) -> usize {
        self.counts[index(event)].load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        AnimatorEvent::ALL.iter().map(|e| self.count(*e)).sum()
    }

    fn record(&self, event: AnimatorEvent) -> PeerResult {
        self.counts[index(event)].fetch_add(1, Ordering::SeqCst);
        // Clone out so the hook can re-enter this peer
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(event);
        }
        match self.mode {
            PeerMode::Ok => Ok(()),
            PeerMode::Failing => Err(PeerError::Exception(format!("{} threw", event))),
            PeerMode::Panicking => panic!("peer panicked in {}", event),
        }
    }
}

impl AnimatorPeer for RecordingPeer {
    fn on_animation_start(&self) -> PeerResult {
        self.record(AnimatorEvent::Start)
    }

    fn on_animation_end(&self) -> PeerResult {
        self.record(AnimatorEvent::End)
    }

    fn on_animation_cancel(&self) -> PeerResult {
        self.record(AnimatorEvent::Cancel)
    }

    fn on_animation_repeat(&self) -> PeerResult {
        self.record(AnimatorEvent::Repeat)
    }

    fn on_animation_update(&self) -> PeerResult {
        self.record(AnimatorEvent::Update)
    }
}

fn index(event: AnimatorEvent) -> usize {
    match event {
        AnimatorEvent::Start => 0,
        AnimatorEvent::End => 1,
        AnimatorEvent::Cancel => 2,
        AnimatorEvent::Repeat => 3,
        AnimatorEvent::Update => 4,
    }
}

/// Engine double that records calls and fires events on demand
///
/// `cancel()` notifies the listener like a real engine would, so tests can
/// observe whether teardown disconnected the forwarder first.
#[derive(Default)]
pub struct RecordingEngine {
    listener: Mutex<Option<Weak<dyn AnimatorListener>>>,
    running: AtomicBool,
    sync: AtomicBool,
    duration: AtomicI64,
    repeat_count: AtomicI32,
    progress: Mutex<f64>,
    pub starts: AtomicUsize,
    pub cancels: AtomicUsize,
    pub updates: AtomicUsize,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Fire an event through the registered listener, if still connected
    pub fn emit(&self, event: AnimatorEvent) -> bool {
        let listener = self.listener.lock().as_ref().and_then(Weak::upgrade);
        match listener {
            Some(listener) => {
                listener.notify(event);
                true
            }
            None => false,
        }
    }

    pub fn has_listener(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .map(|l| l.strong_count() > 0)
            .unwrap_or(false)
    }
}

impl AnimationEngine for RecordingEngine {
    fn set_listener(&self, listener: Weak<dyn AnimatorListener>) {
        *self.listener.lock() = Some(listener);
    }

    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if !self.running.swap(true, Ordering::SeqCst) {
            self.emit(AnimatorEvent::Start);
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if self.running.swap(false, Ordering::SeqCst) {
            self.emit(AnimatorEvent::Cancel);
        }
    }

    fn update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.emit(AnimatorEvent::Update);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn is_sync(&self) -> bool {
        self.sync.load(Ordering::SeqCst)
    }

    fn set_sync(&self, sync: bool) {
        self.sync.store(sync, Ordering::SeqCst);
    }

    fn duration(&self) -> i64 {
        self.duration.load(Ordering::SeqCst)
    }

    fn set_duration(&self, duration_us: i64) {
        self.duration.store(duration_us, Ordering::SeqCst);
    }

    fn repeat_count(&self) -> i32 {
        self.repeat_count.load(Ordering::SeqCst)
    }

    fn set_repeat_count(&self, count: i32) {
        self.repeat_count.store(count, Ordering::SeqCst);
    }

    fn progress(&self) -> f64 {
        *self.progress.lock()
    }

    fn set_progress(&self, progress: f64) {
        *self.progress.lock() = progress.clamp(0.0, 1.0);
    }
}
