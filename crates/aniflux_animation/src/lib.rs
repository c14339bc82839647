//! Aniflux Animation
//!
//! Reference animation engine for the aniflux handle layer.
//!
//! - **Timing animator**: duration / repeat / progress tracking that reports
//!   start, update, repeat, end and cancel to a weakly held listener
//! - **Display link**: background frame driver that ticks running animators
//!
//! # Example
//!
//! ```ignore
//! use aniflux_animation::{DisplayLink, TimingAnimator};
//! use aniflux_core::{lifecycle, HandleSlot};
//!
//! let mut link = DisplayLink::new(60);
//! link.start_background();
//!
//! let slot = HandleSlot::new();
//! lifecycle::setup(&slot, TimingAnimator::new(Some(link.handle())), peer);
//! ```

pub mod display_link;
pub mod timing;

pub use display_link::{DisplayLink, DisplayLinkHandle, FrameTarget};
pub use timing::TimingAnimator;
