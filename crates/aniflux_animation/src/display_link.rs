//! Display link
//!
//! Drives registered frame targets from a background thread at a fixed frame
//! rate. Targets are held weakly: dropping an animator unregisters it on the
//! next frame. Targets are ticked with the link's lock released, so a target
//! may register itself (or others) from inside its own frame.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Something the display link ticks once per frame
pub trait FrameTarget: Send + Sync {
    /// Advance to `now`. Return `false` to be unregistered.
    fn on_frame(&self, now: Instant) -> bool;
}

struct LinkInner {
    targets: Vec<Weak<dyn FrameTarget>>,
}

impl LinkInner {
    fn contains(&self, target: &Weak<dyn FrameTarget>) -> bool {
        self.targets.iter().any(|t| Weak::ptr_eq(t, target))
    }
}

/// Background frame driver shared by all animators of a process
///
/// ```ignore
/// let mut link = DisplayLink::new(60);
/// link.start_background();
/// let animator = TimingAnimator::new(Some(link.handle()));
/// ```
pub struct DisplayLink {
    inner: Arc<Mutex<LinkInner>>,
    /// Stop signal for background thread
    stop_flag: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<()>>,
    frame_rate: u32,
}

impl DisplayLink {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LinkInner {
                targets: Vec::new(),
            })),
            stop_flag: Arc::new(AtomicBool::new(false)),
            frames: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
            frame_rate: frame_rate.max(1),
        }
    }

    /// Start ticking targets on a background thread
    pub fn start_background(&mut self) {
        if self.thread_handle.is_some() {
            return; // Already running
        }

        let inner = Arc::clone(&self.inner);
        let stop_flag = Arc::clone(&self.stop_flag);
        let frames = Arc::clone(&self.frames);
        let frame_duration = Duration::from_micros(1_000_000 / self.frame_rate as u64);

        tracing::debug!("DisplayLink: starting at {}fps", self.frame_rate);

        let spawned = thread::Builder::new()
            .name("aniflux-display-link".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    let start = Instant::now();
                    run_frame(&inner, start);
                    frames.fetch_add(1, Ordering::Relaxed);

                    // Sleep for remaining frame time
                    let elapsed = start.elapsed();
                    if elapsed < frame_duration {
                        thread::sleep(frame_duration - elapsed);
                    }
                }
            });

        match spawned {
            Ok(handle) => self.thread_handle = Some(handle),
            Err(e) => tracing::warn!("DisplayLink: failed to spawn frame thread: {}", e),
        }
    }

    /// Stop the background thread and wait for it to exit
    pub fn stop_background(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        self.stop_flag.store(false, Ordering::Relaxed);
    }

    pub fn is_background_running(&self) -> bool {
        self.thread_handle.is_some()
    }

    /// Run one frame on the calling thread
    pub fn tick(&self, now: Instant) {
        run_frame(&self.inner, now);
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames run so far (background and manual)
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Number of registered targets, including ones not yet pruned
    pub fn target_count(&self) -> usize {
        self.inner.lock().targets.len()
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Weak handle for registering targets
    pub fn handle(&self) -> DisplayLinkHandle {
        DisplayLinkHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Drop for DisplayLink {
    fn drop(&mut self) {
        self.stop_background();
    }
}

fn run_frame(inner: &Mutex<LinkInner>, now: Instant) {
    let targets = std::mem::take(&mut inner.lock().targets);

    let mut survivors = Vec::with_capacity(targets.len());
    for weak in targets {
        let Some(target) = weak.upgrade() else {
            continue;
        };
        if target.on_frame(now) {
            survivors.push(weak);
        }
    }

    // Keep targets registered during this frame as well
    let mut guard = inner.lock();
    for weak in survivors {
        if !guard.contains(&weak) {
            guard.targets.push(weak);
        }
    }
}

/// A weak handle to a display link
///
/// Won't keep the link alive; registering through a dead handle is a no-op.
#[derive(Clone)]
pub struct DisplayLinkHandle {
    inner: Weak<Mutex<LinkInner>>,
}

impl DisplayLinkHandle {
    /// Register a target to be ticked every frame until it opts out or drops
    ///
    /// Registering an already-registered target has no effect.
    pub fn register(&self, target: Weak<dyn FrameTarget>) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut guard = inner.lock();
        if !guard.contains(&target) {
            guard.targets.push(target);
        }
        true
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
