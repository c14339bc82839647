//! Engine contract
//!
//! The animation engine is an external component: it owns timing, progress
//! and playback state, and reports lifecycle changes to a single registered
//! listener. Nothing in this crate depends on how an engine schedules frames.

use std::fmt;
use std::sync::{Arc, Weak};

/// Shared reference to an engine instance
pub type EngineRef = Arc<dyn AnimationEngine>;

/// Lifecycle notifications an engine reports to its listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatorEvent {
    /// Playback started
    Start,
    /// Playback reached its last frame
    End,
    /// Playback was cancelled by the user
    Cancel,
    /// Playback wrapped around to a new repetition
    Repeat,
    /// A new frame (progress value) is available
    Update,
}

impl AnimatorEvent {
    /// All events, in declaration order
    pub const ALL: [AnimatorEvent; 5] = [
        AnimatorEvent::Start,
        AnimatorEvent::End,
        AnimatorEvent::Cancel,
        AnimatorEvent::Repeat,
        AnimatorEvent::Update,
    ];

    /// Name of the peer-side hook for this event
    pub fn hook_name(self) -> &'static str {
        match self {
            AnimatorEvent::Start => "onAnimationStart",
            AnimatorEvent::End => "onAnimationEnd",
            AnimatorEvent::Cancel => "onAnimationCancel",
            AnimatorEvent::Repeat => "onAnimationRepeat",
            AnimatorEvent::Update => "onAnimationUpdate",
        }
    }
}

impl fmt::Display for AnimatorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hook_name())
    }
}

/// Listener capability an engine calls back into
///
/// Hooks may run on the thread that called into the engine (`start`,
/// `cancel`, sync `update`) or on an engine-owned worker thread.
pub trait AnimatorListener: Send + Sync {
    fn on_animation_start(&self);
    fn on_animation_end(&self);
    fn on_animation_cancel(&self);
    fn on_animation_repeat(&self);
    fn on_animation_update(&self);

    /// Dispatch an event to the matching hook
    fn notify(&self, event: AnimatorEvent) {
        match event {
            AnimatorEvent::Start => self.on_animation_start(),
            AnimatorEvent::End => self.on_animation_end(),
            AnimatorEvent::Cancel => self.on_animation_cancel(),
            AnimatorEvent::Repeat => self.on_animation_repeat(),
            AnimatorEvent::Update => self.on_animation_update(),
        }
    }
}

/// Operations consumed from the native animation engine
///
/// Engines only hold their listener weakly. Whoever registers a listener
/// keeps it alive; dropping the last strong reference disconnects it.
pub trait AnimationEngine: Send + Sync {
    /// Register the listener that receives lifecycle notifications
    fn set_listener(&self, listener: Weak<dyn AnimatorListener>);

    /// Start from the current position, or from the beginning if the last run
    /// reached its end. No effect while already running.
    fn start(&self);

    /// Stop at the current position. `start()` resumes from there.
    fn cancel(&self);

    /// Flush the current progress without changing the playing state
    fn update(&self);

    fn is_running(&self) -> bool;

    /// Whether frames are flushed on the calling thread
    fn is_sync(&self) -> bool;
    fn set_sync(&self, sync: bool);

    /// Length of one repetition in microseconds
    fn duration(&self) -> i64;
    fn set_duration(&self, duration_us: i64);

    /// Total number of repetitions; `<= 0` repeats forever
    fn repeat_count(&self) -> i32;
    fn set_repeat_count(&self, count: i32);

    /// Position within the current repetition, in `[0, 1]`
    fn progress(&self) -> f64;
    fn set_progress(&self, progress: f64);
}
