//! Aniflux Android Platform
//!
//! JNI glue between `com.kernelflux.pag.PAGAnimator` and the aniflux handle
//! layer. Each Java animator owns one [`HandleSlot`](aniflux_core::HandleSlot)
//! through its `nativeContext` field; engine events reach the Java object
//! through a weak global reference, so native code never keeps it alive.
//!
//! The JNI entry points only exist when targeting Android. The slot and
//! runtime plumbing in [`context`] builds everywhere.

pub mod context;

#[cfg(target_os = "android")]
pub mod jni_bridge;
#[cfg(target_os = "android")]
pub mod jni_peer;

pub use context::{runtime, Runtime};

#[cfg(target_os = "android")]
pub use jni_peer::{JavaIds, JniPeer};
