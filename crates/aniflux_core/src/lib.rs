//! Aniflux Core
//!
//! Safe lifecycle management for a native animation engine that is reachable
//! from a managed peer runtime.
//!
//! - **Animator handle**: reference-counted proxy with exactly-once teardown
//! - **Callback forwarding**: engine events delivered to a weakly-held peer,
//!   with peer failures contained at the boundary
//! - **Handle slot**: the single per-peer word that maps a peer to its handle
//! - **Lifecycle**: setup / explicit release / finalizer release
//!
//! # Example
//!
//! ```ignore
//! use aniflux_core::{accessors, lifecycle, HandleSlot, TeardownPolicy};
//! use std::sync::Arc;
//!
//! let slot = HandleSlot::new();
//! lifecycle::setup(&slot, engine, Arc::downgrade(&peer));
//!
//! accessors::set_duration(&slot, 1_000_000);
//! accessors::start(&slot);
//!
//! // Owning thread
//! lifecycle::release(&slot);
//! // Finalizer thread
//! lifecycle::finalize(&slot, TeardownPolicy::FlagOnly);
//! ```

pub mod accessors;
pub mod config;
pub mod engine;
pub mod error;
pub mod forwarder;
pub mod handle;
pub mod lifecycle;
pub mod logging;
pub mod peer;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use config::AnimatorConfig;
pub use engine::{AnimationEngine, AnimatorEvent, AnimatorListener, EngineRef};
pub use error::{ConfigError, PeerError, PeerResult};
pub use forwarder::{CallbackForwarder, DeliveryCounts};
pub use handle::{AnimatorHandle, TeardownPolicy};
pub use logging::init_logging;
pub use peer::{AnimatorPeer, WeakPeer};
pub use registry::HandleSlot;
