//! Timing animator
//!
//! A simple timing engine: tracks progress through a fixed duration, repeats
//! a configurable number of times, and reports lifecycle changes to a weakly
//! held listener. Frames come from a [`DisplayLink`](crate::DisplayLink) or
//! from manual [`TimingAnimator::tick`] calls.
//!
//! Listener notifications are always fired with no engine lock held, so a
//! listener can call straight back into the animator (or tear down whatever
//! owns it) from inside a callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use aniflux_core::{AnimationEngine, AnimatorConfig, AnimatorEvent, AnimatorListener};
use parking_lot::Mutex;

use crate::display_link::{DisplayLinkHandle, FrameTarget};

/// Up to four events can come out of one operation
type Events = Vec<AnimatorEvent>;

struct TimingState {
    duration_us: i64,
    repeat_count: i32,
    /// Position within the current repetition
    progress: f64,
    running: bool,
    sync: bool,
    /// Last run reached its end; the next start rewinds
    ended: bool,
    /// Repetitions completed in the current run
    repeats_done: i32,
    /// Instant corresponding to progress 0 of repetition 0
    anchor: Option<Instant>,
}

impl TimingState {
    /// Elapsed animation time that corresponds to the current position
    fn played_us(&self) -> f64 {
        (self.repeats_done as f64 + self.progress) * self.duration_us as f64
    }

    fn anchor_for(&self, now: Instant, scale: f32) -> Instant {
        let real_us = self.played_us() / scale as f64;
        now.checked_sub(Duration::from_micros(real_us as u64))
            .unwrap_or(now)
    }

    fn finish(&mut self, events: &mut Events) {
        self.progress = 1.0;
        self.running = false;
        self.ended = true;
        self.anchor = None;
        events.push(AnimatorEvent::Update);
        events.push(AnimatorEvent::End);
    }

    fn advance(&mut self, now: Instant, scale: f32, events: &mut Events) {
        let Some(anchor) = self.anchor else {
            return;
        };
        if self.duration_us <= 0 {
            self.finish(events);
            return;
        }
        let elapsed_us = now.saturating_duration_since(anchor).as_micros() as f64 * scale as f64;
        let played = elapsed_us / self.duration_us as f64;

        if self.repeat_count > 0 && played >= self.repeat_count as f64 {
            self.repeats_done = self.repeat_count - 1;
            self.finish(events);
            return;
        }

        let repetition = played.floor() as i32;
        if repetition > self.repeats_done {
            self.repeats_done = repetition;
            events.push(AnimatorEvent::Repeat);
        }
        self.progress = played - played.floor();
        events.push(AnimatorEvent::Update);
    }
}

/// Reference [`AnimationEngine`] implementation
pub struct TimingAnimator {
    state: Mutex<TimingState>,
    listener: Mutex<Option<Weak<dyn AnimatorListener>>>,
    /// An async update() is waiting for the next frame
    flush_pending: AtomicBool,
    duration_scale: f32,
    link: Option<DisplayLinkHandle>,
    this: Weak<TimingAnimator>,
}

impl TimingAnimator {
    /// Create an animator driven by `link` (or by manual ticks if `None`)
    pub fn new(link: Option<DisplayLinkHandle>) -> Arc<Self> {
        Self::with_duration_scale(link, 1.0)
    }

    /// Create an animator with a duration scale
    ///
    /// A scale of 0 mirrors "animations disabled" system settings: every run
    /// completes as soon as it starts.
    pub fn with_duration_scale(link: Option<DisplayLinkHandle>, scale: f32) -> Arc<Self> {
        let duration_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(TimingState {
                duration_us: 0,
                repeat_count: 1,
                progress: 0.0,
                running: false,
                sync: false,
                ended: false,
                repeats_done: 0,
                anchor: None,
            }),
            listener: Mutex::new(None),
            flush_pending: AtomicBool::new(false),
            duration_scale,
            link,
            this: this.clone(),
        })
    }

    /// Create an animator from config defaults
    pub fn from_config(config: &AnimatorConfig, link: Option<DisplayLinkHandle>) -> Arc<Self> {
        let animator = Self::with_duration_scale(link, config.duration_scale);
        {
            let mut state = animator.state.lock();
            state.duration_us = config.default_duration_us.max(0);
            state.repeat_count = config.default_repeat_count;
            state.sync = config.sync;
        }
        animator
    }

    pub fn duration_scale(&self) -> f32 {
        self.duration_scale
    }

    /// Advance to `now` and fire whatever events that produces
    ///
    /// Returns whether the animator still wants frames.
    pub fn tick(&self, now: Instant) -> bool {
        let mut events = Events::new();
        let running = {
            let mut state = self.state.lock();
            if state.running {
                state.advance(now, self.duration_scale, &mut events);
            }
            state.running
        };

        if self.flush_pending.swap(false, Ordering::AcqRel) && !events.contains(&AnimatorEvent::Update)
        {
            events.push(AnimatorEvent::Update);
        }

        self.fire(&events);
        running || self.flush_pending.load(Ordering::Acquire)
    }

    fn fire(&self, events: &[AnimatorEvent]) {
        if events.is_empty() {
            return;
        }
        let listener = self.listener.lock().as_ref().and_then(Weak::upgrade);
        let Some(listener) = listener else {
            tracing::trace!("TimingAnimator: no listener for {:?}", events);
            return;
        };
        for event in events {
            listener.notify(*event);
        }
    }

    /// Ask the display link for frames; `false` if there is no live link
    fn request_frames(&self) -> bool {
        match &self.link {
            Some(link) => link.register(self.this.clone() as Weak<dyn FrameTarget>),
            None => false,
        }
    }
}

impl AnimationEngine for TimingAnimator {
    fn set_listener(&self, listener: Weak<dyn AnimatorListener>) {
        *self.listener.lock() = Some(listener);
    }

    fn start(&self) {
        let mut events = Events::new();
        let wants_frames = {
            let mut state = self.state.lock();
            if state.running {
                return;
            }
            // Resuming after cancel keeps the repetitions already played
            if state.ended || state.progress >= 1.0 {
                state.progress = 0.0;
                state.repeats_done = 0;
                state.ended = false;
            }
            events.push(AnimatorEvent::Start);

            if state.duration_us <= 0 || self.duration_scale == 0.0 {
                state.finish(&mut events);
                false
            } else {
                state.running = true;
                state.anchor = Some(state.anchor_for(Instant::now(), self.duration_scale));
                true
            }
        };

        if wants_frames && !self.request_frames() {
            tracing::trace!("TimingAnimator: started without a display link, tick manually");
        }
        self.fire(&events);
    }

    fn cancel(&self) {
        {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }
            state.running = false;
            state.anchor = None;
        }
        self.fire(&[AnimatorEvent::Cancel]);
    }

    fn update(&self) {
        let sync = self.state.lock().sync;
        if sync {
            self.fire(&[AnimatorEvent::Update]);
            return;
        }
        // An async flush is already queued
        if self.flush_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.request_frames() {
            self.flush_pending.store(false, Ordering::Release);
            self.fire(&[AnimatorEvent::Update]);
        }
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn is_sync(&self) -> bool {
        self.state.lock().sync
    }

    fn set_sync(&self, sync: bool) {
        self.state.lock().sync = sync;
    }

    fn duration(&self) -> i64 {
        self.state.lock().duration_us
    }

    fn set_duration(&self, duration_us: i64) {
        let mut state = self.state.lock();
        state.duration_us = duration_us.max(0);
        if state.running {
            state.anchor = Some(state.anchor_for(Instant::now(), self.duration_scale));
        }
    }

    fn repeat_count(&self) -> i32 {
        self.state.lock().repeat_count
    }

    fn set_repeat_count(&self, count: i32) {
        self.state.lock().repeat_count = count;
    }

    fn progress(&self) -> f64 {
        self.state.lock().progress
    }

    fn set_progress(&self, progress: f64) {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let mut state = self.state.lock();
        state.progress = progress;
        if state.ended {
            state.repeats_done = 0;
            state.ended = false;
        }
        if state.running {
            state.anchor = Some(state.anchor_for(Instant::now(), self.duration_scale));
        }
    }
}

impl FrameTarget for TimingAnimator {
    fn on_frame(&self, now: Instant) -> bool {
        self.tick(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_link::DisplayLink;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<AnimatorEvent>>,
        cancels: AtomicUsize,
    }

    impl EventLog {
        fn take(&self) -> Vec<AnimatorEvent> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl AnimatorListener for EventLog {
        fn on_animation_start(&self) {
            self.events.lock().push(AnimatorEvent::Start);
        }

        fn on_animation_end(&self) {
            self.events.lock().push(AnimatorEvent::End);
        }

        fn on_animation_cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            self.events.lock().push(AnimatorEvent::Cancel);
        }

        fn on_animation_repeat(&self) {
            self.events.lock().push(AnimatorEvent::Repeat);
        }

        fn on_animation_update(&self) {
            self.events.lock().push(AnimatorEvent::Update);
        }
    }

    const SECOND_US: i64 = 1_000_000;

    fn animator_with_log(link: Option<DisplayLinkHandle>) -> (Arc<TimingAnimator>, Arc<EventLog>) {
        let animator = TimingAnimator::new(link);
        let log = Arc::new(EventLog::default());
        let weak: Weak<dyn AnimatorListener> = Arc::downgrade(&log) as Weak<dyn AnimatorListener>;
        animator.set_listener(weak);
        animator.set_duration(SECOND_US);
        (animator, log)
    }

    #[test]
    fn test_defaults() {
        let animator = TimingAnimator::new(None);
        assert_eq!(animator.duration(), 0);
        assert_eq!(animator.repeat_count(), 1);
        assert_eq!(animator.progress(), 0.0);
        assert!(!animator.is_running());
        assert!(!animator.is_sync());
    }

    #[test]
    fn test_start_is_idempotent() {
        let (animator, log) = animator_with_log(None);
        animator.start();
        animator.start();

        assert!(animator.is_running());
        assert_eq!(log.take(), vec![AnimatorEvent::Start]);
    }

    #[test]
    fn test_cancel_keeps_position() {
        let (animator, log) = animator_with_log(None);
        animator.set_progress(0.4);
        animator.start();
        animator.cancel();
        animator.cancel();

        assert!(!animator.is_running());
        assert_eq!(log.cancels.load(Ordering::SeqCst), 1);
        assert!((animator.progress() - 0.4).abs() < 1e-9);

        // Resumes from the cancelled position
        animator.start();
        assert!((animator.progress() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_cancel_when_idle_is_silent() {
        let (animator, log) = animator_with_log(None);
        animator.cancel();
        assert!(log.take().is_empty());
    }

    #[test]
    fn test_runs_to_end() {
        let (animator, log) = animator_with_log(None);
        animator.start();
        log.take();

        let wants_more = animator.tick(Instant::now() + Duration::from_secs(2));

        assert!(!wants_more);
        assert!(!animator.is_running());
        assert_eq!(animator.progress(), 1.0);
        assert_eq!(log.take(), vec![AnimatorEvent::Update, AnimatorEvent::End]);
    }

    #[test]
    fn test_restart_after_end_rewinds() {
        let (animator, log) = animator_with_log(None);
        animator.start();
        animator.tick(Instant::now() + Duration::from_secs(2));
        log.take();

        animator.start();
        assert!(animator.is_running());
        assert_eq!(animator.progress(), 0.0);
        assert_eq!(log.take(), vec![AnimatorEvent::Start]);
    }

    #[test]
    fn test_mid_run_progress() {
        let (animator, log) = animator_with_log(None);
        animator.start();
        log.take();

        assert!(animator.tick(Instant::now() + Duration::from_millis(500)));
        let progress = animator.progress();
        assert!(progress >= 0.5 && progress < 0.6, "progress {}", progress);
        assert_eq!(log.take(), vec![AnimatorEvent::Update]);
    }

    #[test]
    fn test_repeat_fires_between_repetitions() {
        let (animator, log) = animator_with_log(None);
        animator.set_repeat_count(3);
        animator.start();
        log.take();

        let started = Instant::now();
        animator.tick(started + Duration::from_millis(1500));
        assert_eq!(log.take(), vec![AnimatorEvent::Repeat, AnimatorEvent::Update]);
        assert!(animator.is_running());

        animator.tick(started + Duration::from_millis(4000));
        assert_eq!(log.take(), vec![AnimatorEvent::Update, AnimatorEvent::End]);
        assert!(!animator.is_running());
    }

    #[test]
    fn test_resume_after_cancel_keeps_repetition() {
        let (animator, log) = animator_with_log(None);
        animator.set_repeat_count(3);
        animator.start();
        animator.tick(Instant::now() + Duration::from_millis(1500));
        animator.cancel();
        log.take();

        // 1.5 of 3 repetitions played; resuming leaves 1.5 to go
        animator.start();
        animator.tick(Instant::now() + Duration::from_millis(1600));

        assert!(!animator.is_running());
        assert_eq!(animator.progress(), 1.0);
        assert_eq!(
            log.take(),
            vec![AnimatorEvent::Start, AnimatorEvent::Update, AnimatorEvent::End]
        );
    }

    #[test]
    fn test_infinite_repeat_never_ends() {
        let (animator, log) = animator_with_log(None);
        animator.set_repeat_count(0);
        animator.start();
        log.take();

        assert!(animator.tick(Instant::now() + Duration::from_secs(100)));
        assert!(animator.is_running());
        assert!(!log.take().contains(&AnimatorEvent::End));
    }

    #[test]
    fn test_zero_scale_completes_immediately() {
        let animator = TimingAnimator::with_duration_scale(None, 0.0);
        let log = Arc::new(EventLog::default());
        animator.set_listener(Arc::downgrade(&log) as Weak<dyn AnimatorListener>);
        animator.set_duration(SECOND_US);

        animator.start();

        assert!(!animator.is_running());
        assert_eq!(animator.progress(), 1.0);
        assert_eq!(
            log.take(),
            vec![AnimatorEvent::Start, AnimatorEvent::Update, AnimatorEvent::End]
        );
    }

    #[test]
    fn test_set_progress_clamps() {
        let animator = TimingAnimator::new(None);
        animator.set_progress(1.7);
        assert_eq!(animator.progress(), 1.0);
        animator.set_progress(-0.2);
        assert_eq!(animator.progress(), 0.0);
        animator.set_progress(f64::NAN);
        assert_eq!(animator.progress(), 0.0);
    }

    #[test]
    fn test_sync_update_flushes_on_caller() {
        let link = DisplayLink::new(60);
        let (animator, log) = animator_with_log(Some(link.handle()));
        animator.set_sync(true);

        animator.update();
        assert_eq!(log.take(), vec![AnimatorEvent::Update]);
        assert_eq!(link.target_count(), 0);
    }

    #[test]
    fn test_async_update_waits_for_frame() {
        let link = DisplayLink::new(60);
        let (animator, log) = animator_with_log(Some(link.handle()));

        animator.update();
        animator.update();
        assert!(log.take().is_empty());

        link.tick(Instant::now());
        assert_eq!(log.take(), vec![AnimatorEvent::Update]);

        // Nothing left to flush
        link.tick(Instant::now());
        assert!(log.take().is_empty());
        assert_eq!(link.target_count(), 0);
    }

    #[test]
    fn test_async_update_without_link_flushes_now() {
        let (animator, log) = animator_with_log(None);
        animator.update();
        assert_eq!(log.take(), vec![AnimatorEvent::Update]);
    }

    #[test]
    fn test_listener_dropped_is_silent() {
        let (animator, log) = animator_with_log(None);
        drop(log);

        animator.start();
        animator.update();
        animator.cancel();
        assert!(!animator.is_running());
    }

    #[test]
    fn test_listener_can_reenter() {
        struct Reentrant {
            animator: Weak<TimingAnimator>,
        }

        impl AnimatorListener for Reentrant {
            fn on_animation_start(&self) {
                if let Some(animator) = self.animator.upgrade() {
                    animator.set_progress(0.5);
                    animator.cancel();
                }
            }
            fn on_animation_end(&self) {}
            fn on_animation_cancel(&self) {}
            fn on_animation_repeat(&self) {}
            fn on_animation_update(&self) {}
        }

        let animator = TimingAnimator::new(None);
        animator.set_duration(SECOND_US);
        let listener = Arc::new(Reentrant {
            animator: Arc::downgrade(&animator),
        });
        animator.set_listener(Arc::downgrade(&listener) as Weak<dyn AnimatorListener>);

        animator.start();
        assert!(!animator.is_running());
        assert_eq!(animator.progress(), 0.5);
    }

    #[test]
    fn test_from_config() {
        let config = AnimatorConfig::standard()
            .with_duration_us(250_000)
            .with_repeat_count(2)
            .with_sync(true)
            .with_duration_scale(0.5);
        let animator = TimingAnimator::from_config(&config, None);

        assert_eq!(animator.duration(), 250_000);
        assert_eq!(animator.repeat_count(), 2);
        assert!(animator.is_sync());
        assert_eq!(animator.duration_scale(), 0.5);

        // Negative durations are clamped the same way set_duration clamps them
        let animator = TimingAnimator::from_config(&config.with_duration_us(-5), None);
        assert_eq!(animator.duration(), 0);
    }
}
