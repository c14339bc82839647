//! JNI bridge for `com.kernelflux.pag.PAGAnimator`
//!
//! # Usage from Java
//!
//! ```java
//! class PAGAnimator {
//!     private long nativeContext = 0;
//!
//!     private static native void nativeInit();
//!     private native void nativeSetup();
//!     private native void nativeRelease();
//!     private native void nativeFinalize();
//!
//!     public native boolean isSync();
//!     public native void setSync(boolean value);
//!     public native long duration();
//!     public native void setDuration(long duration);
//!     public native int repeatCount();
//!     public native void setRepeatCount(int repeatCount);
//!     public native double progress();
//!     public native void setProgress(double value);
//!     public native boolean isRunning();
//!     private native void doStart();
//!     public native void cancel();
//!     public native void update();
//!
//!     // Called from native code
//!     private void onAnimationStart() { ... }
//!     private void onAnimationEnd() { ... }
//!     private void onAnimationCancel() { ... }
//!     private void onAnimationRepeat() { ... }
//!     private void onAnimationUpdate() { ... }
//! }
//! ```
//!
//! `nativeRelease` is called from `release()` and `nativeFinalize` from
//! `finalize()`. Every accessor tolerates a missing or released handle.

use jni::objects::{JClass, JObject, JValue};
use jni::signature::{Primitive, ReturnType};
use jni::sys::{jboolean, jdouble, jint, jlong, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use tracing::{debug, error, info, warn};

use aniflux_core::{accessors, lifecycle, HandleSlot};

use crate::context;
use crate::jni_peer::{JavaIds, JniPeer};

fn init_android_logging(filter: &str) {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("AnifluxJNI")
            .with_filter(android_logger::FilterBuilder::new().parse(filter).build()),
    );
}

fn read_context(env: &mut JNIEnv, thiz: &JObject, ids: &JavaIds) -> jni::errors::Result<jlong> {
    // SAFETY: `native_context` was resolved as a `long` field of this class
    let value = unsafe {
        env.get_field_unchecked(
            thiz,
            ids.native_context,
            ReturnType::Primitive(Primitive::Long),
        )
    }?;
    value.j()
}

fn write_context(
    env: &mut JNIEnv,
    thiz: &JObject,
    ids: &JavaIds,
    value: jlong,
) -> jni::errors::Result<()> {
    // SAFETY: `native_context` was resolved as a `long` field of this class
    unsafe { env.set_field_unchecked(thiz, ids.native_context, JValue::Long(value)) }
}

/// Run `f` against the animator's slot, or return `T::default()`
fn with_slot<T: Default>(
    env: &mut JNIEnv,
    thiz: &JObject,
    f: impl FnOnce(&HandleSlot) -> T,
) -> T {
    let Some(ids) = JavaIds::get() else {
        return T::default();
    };
    let raw = match read_context(env, thiz, ids) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to read nativeContext: {:?}", e);
            return T::default();
        }
    };
    // SAFETY: nativeContext only ever holds 0 or a live slot; the slot is
    // freed by nativeFinalize, after which no Java call can reach it
    match unsafe { context::slot_ref(raw) } {
        Some(slot) => f(slot),
        None => T::default(),
    }
}

fn to_jboolean(value: bool) -> jboolean {
    if value {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Cache field and method IDs
///
/// # JNI Signature
/// `()V` (static)
#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_nativeInit(
    mut env: JNIEnv,
    class: JClass,
) {
    let runtime = context::runtime();
    init_android_logging(&runtime.config().log_filter);

    match JavaIds::init(&mut env, &class) {
        Ok(_) => info!("PAGAnimator.nativeInit: IDs cached"),
        Err(e) => error!("PAGAnimator.nativeInit failed: {:?}", e),
    }
}

/// Create a fresh handle for this animator, releasing any previous one
#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_nativeSetup(
    mut env: JNIEnv,
    thiz: JObject,
) {
    if let Err(e) = setup(&mut env, &thiz) {
        error!("PAGAnimator.nativeSetup failed: {:?}", e);
    }
}

fn setup(env: &mut JNIEnv, thiz: &JObject) -> jni::errors::Result<()> {
    let ids = JavaIds::get().ok_or(jni::errors::Error::NullPtr("nativeInit not called"))?;

    let mut raw = read_context(env, thiz, ids)?;
    if raw == 0 {
        raw = context::slot_into_raw(Box::default());
        write_context(env, thiz, ids, raw)?;
    }
    // SAFETY: raw is the slot created above or by an earlier setup
    let Some(slot) = (unsafe { context::slot_ref(raw) }) else {
        return Ok(());
    };

    let peer = JniPeer::new(env, thiz, ids)?;
    let handle = lifecycle::setup(slot, context::runtime().new_engine(), peer);
    debug!("PAGAnimator.nativeSetup: handle #{}", handle.id());
    Ok(())
}

/// Explicit release: cancel and disconnect, keep the slot
#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_nativeRelease(
    mut env: JNIEnv,
    thiz: JObject,
) {
    with_slot(&mut env, &thiz, lifecycle::release);
}

/// Finalizer release: tear down without calling the engine and free the slot
#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_nativeFinalize(
    mut env: JNIEnv,
    thiz: JObject,
) {
    let Some(ids) = JavaIds::get() else {
        return;
    };
    let raw = match read_context(&mut env, &thiz, ids) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("PAGAnimator.nativeFinalize: failed to read nativeContext: {:?}", e);
            return;
        }
    };

    // SAFETY: the Java object is unreachable, so nothing else can observe
    // nativeContext while the slot is reclaimed
    if let Some(slot) = unsafe { context::slot_from_raw(raw) } {
        let policy = context::runtime().config().finalize_policy;
        lifecycle::finalize(&slot, policy);
    }

    if let Err(e) = write_context(&mut env, &thiz, ids, 0) {
        warn!("PAGAnimator.nativeFinalize: failed to clear nativeContext: {:?}", e);
    }
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_isSync(
    mut env: JNIEnv,
    thiz: JObject,
) -> jboolean {
    to_jboolean(with_slot(&mut env, &thiz, accessors::is_sync))
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_setSync(
    mut env: JNIEnv,
    thiz: JObject,
    sync: jboolean,
) {
    with_slot(&mut env, &thiz, |slot| accessors::set_sync(slot, sync != JNI_FALSE));
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_duration(
    mut env: JNIEnv,
    thiz: JObject,
) -> jlong {
    with_slot(&mut env, &thiz, accessors::duration)
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_setDuration(
    mut env: JNIEnv,
    thiz: JObject,
    duration: jlong,
) {
    with_slot(&mut env, &thiz, |slot| accessors::set_duration(slot, duration));
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_repeatCount(
    mut env: JNIEnv,
    thiz: JObject,
) -> jint {
    with_slot(&mut env, &thiz, accessors::repeat_count)
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_setRepeatCount(
    mut env: JNIEnv,
    thiz: JObject,
    count: jint,
) {
    with_slot(&mut env, &thiz, |slot| accessors::set_repeat_count(slot, count));
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_progress(
    mut env: JNIEnv,
    thiz: JObject,
) -> jdouble {
    with_slot(&mut env, &thiz, accessors::progress)
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_setProgress(
    mut env: JNIEnv,
    thiz: JObject,
    progress: jdouble,
) {
    with_slot(&mut env, &thiz, |slot| accessors::set_progress(slot, progress));
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_isRunning(
    mut env: JNIEnv,
    thiz: JObject,
) -> jboolean {
    to_jboolean(with_slot(&mut env, &thiz, accessors::is_running))
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_doStart(
    mut env: JNIEnv,
    thiz: JObject,
) {
    with_slot(&mut env, &thiz, accessors::start);
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_cancel(
    mut env: JNIEnv,
    thiz: JObject,
) {
    with_slot(&mut env, &thiz, accessors::cancel);
}

#[no_mangle]
pub extern "system" fn Java_com_kernelflux_pag_PAGAnimator_update(
    mut env: JNIEnv,
    thiz: JObject,
) {
    with_slot(&mut env, &thiz, accessors::update);
}
