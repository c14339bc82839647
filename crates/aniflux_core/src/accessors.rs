//! Pass-through accessors
//!
//! One function per engine operation, resolved through the peer's slot. An
//! empty slot or a released handle is a normal case: getters return the
//! type's default and setters do nothing.

use crate::registry::HandleSlot;

pub fn start(slot: &HandleSlot) {
    if let Some(engine) = slot.get() {
        engine.start();
    }
}

pub fn cancel(slot: &HandleSlot) {
    if let Some(engine) = slot.get() {
        engine.cancel();
    }
}

pub fn update(slot: &HandleSlot) {
    if let Some(engine) = slot.get() {
        engine.update();
    }
}

pub fn is_running(slot: &HandleSlot) -> bool {
    slot.get().map(|engine| engine.is_running()).unwrap_or(false)
}

pub fn is_sync(slot: &HandleSlot) -> bool {
    slot.get().map(|engine| engine.is_sync()).unwrap_or(false)
}

pub fn set_sync(slot: &HandleSlot, sync: bool) {
    if let Some(engine) = slot.get() {
        engine.set_sync(sync);
    }
}

/// Duration in microseconds, 0 when absent
pub fn duration(slot: &HandleSlot) -> i64 {
    slot.get().map(|engine| engine.duration()).unwrap_or(0)
}

pub fn set_duration(slot: &HandleSlot, duration_us: i64) {
    if let Some(engine) = slot.get() {
        engine.set_duration(duration_us);
    }
}

pub fn repeat_count(slot: &HandleSlot) -> i32 {
    slot.get().map(|engine| engine.repeat_count()).unwrap_or(0)
}

pub fn set_repeat_count(slot: &HandleSlot, count: i32) {
    if let Some(engine) = slot.get() {
        engine.set_repeat_count(count);
    }
}

pub fn progress(slot: &HandleSlot) -> f64 {
    slot.get().map(|engine| engine.progress()).unwrap_or(0.0)
}

pub fn set_progress(slot: &HandleSlot, progress: f64) {
    if let Some(engine) = slot.get() {
        engine.set_progress(progress);
    }
}
