//! Native context plumbing
//!
//! Each Java `PAGAnimator` carries a `long nativeContext` field that points at
//! a boxed [`HandleSlot`]. The slot lives from the first `nativeSetup` until
//! `nativeFinalize`; the handle inside it is swapped and released as the Java
//! side sets up and releases.
//!
//! None of this touches JNI, so it is exercised on the host as well.

use std::ffi::OsStr;
use std::sync::OnceLock;

use aniflux_animation::{DisplayLink, TimingAnimator};
use aniflux_core::{AnimatorConfig, EngineRef, HandleSlot};

/// Environment variable naming a TOML file with [`AnimatorConfig`] overrides
pub const CONFIG_ENV: &str = "ANIFLUX_CONFIG";

/// Box a fresh slot and hand it out as a Java `long`
pub fn slot_into_raw(slot: Box<HandleSlot>) -> i64 {
    Box::into_raw(slot) as i64
}

/// Borrow the slot behind a `nativeContext` value
///
/// # Safety
///
/// `raw` must be 0 or a value returned by [`slot_into_raw`] that has not been
/// passed to [`slot_from_raw`] yet, and the slot must outlive `'a`.
pub unsafe fn slot_ref<'a>(raw: i64) -> Option<&'a HandleSlot> {
    (raw as *const HandleSlot).as_ref()
}

/// Take back ownership of the slot behind a `nativeContext` value
///
/// # Safety
///
/// `raw` must be 0 or a value returned by [`slot_into_raw`], and must not be
/// used again afterwards.
pub unsafe fn slot_from_raw(raw: i64) -> Option<Box<HandleSlot>> {
    let ptr = raw as *mut HandleSlot;
    if ptr.is_null() {
        None
    } else {
        Some(Box::from_raw(ptr))
    }
}

/// Process-wide state shared by every animator
pub struct Runtime {
    config: AnimatorConfig,
    link: DisplayLink,
}

impl Runtime {
    fn new(config: AnimatorConfig) -> Self {
        let mut link = DisplayLink::new(config.frame_rate);
        link.start_background();
        Self { config, link }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn display_link(&self) -> &DisplayLink {
        &self.link
    }

    /// Build an engine wired to the shared display link
    pub fn new_engine(&self) -> EngineRef {
        TimingAnimator::from_config(&self.config, Some(self.link.handle()))
    }
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// The shared runtime, created on first use
pub fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Runtime::new(load_config()))
}

/// Read config from [`CONFIG_ENV`], falling back to the standard preset
pub fn load_config() -> AnimatorConfig {
    load_config_from(std::env::var_os(CONFIG_ENV).as_deref())
}

/// Read config from `path`; unset, unreadable or invalid gives the standard preset
pub fn load_config_from(path: Option<&OsStr>) -> AnimatorConfig {
    let Some(path) = path else {
        return AnimatorConfig::standard();
    };
    match AnimatorConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", CONFIG_ENV, e);
            AnimatorConfig::standard()
        }
    }
}
