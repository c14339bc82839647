//! Java peer reference
//!
//! Wraps a JNI weak global reference to a `PAGAnimator` object. Resolution
//! attaches the calling thread (engine threads are native, so they attach as
//! daemons) and upgrades the weak reference to a local one for the duration
//! of a single notification.

use std::cell::RefCell;
use std::sync::OnceLock;

use jni::objects::{JClass, JFieldID, JMethodID, JObject, WeakRef};
use jni::signature::{Primitive, ReturnType};
use jni::{JNIEnv, JavaVM};
use tracing::warn;

use aniflux_core::{AnimatorPeer, PeerError, PeerResult, WeakPeer};

/// Field and method IDs resolved once by `nativeInit`
pub struct JavaIds {
    pub native_context: JFieldID,
    on_start: JMethodID,
    on_end: JMethodID,
    on_cancel: JMethodID,
    on_repeat: JMethodID,
    on_update: JMethodID,
}

static JAVA_IDS: OnceLock<JavaIds> = OnceLock::new();

impl JavaIds {
    /// Look up and cache IDs on the `PAGAnimator` class
    pub fn init(env: &mut JNIEnv, class: &JClass) -> jni::errors::Result<&'static JavaIds> {
        if let Some(ids) = JAVA_IDS.get() {
            return Ok(ids);
        }
        let ids = JavaIds {
            native_context: env.get_field_id(class, "nativeContext", "J")?,
            on_start: env.get_method_id(class, "onAnimationStart", "()V")?,
            on_end: env.get_method_id(class, "onAnimationEnd", "()V")?,
            on_cancel: env.get_method_id(class, "onAnimationCancel", "()V")?,
            on_repeat: env.get_method_id(class, "onAnimationRepeat", "()V")?,
            on_update: env.get_method_id(class, "onAnimationUpdate", "()V")?,
        };
        Ok(JAVA_IDS.get_or_init(|| ids))
    }

    /// IDs cached by [`JavaIds::init`], if it has run
    pub fn get() -> Option<&'static JavaIds> {
        JAVA_IDS.get()
    }
}

/// Weak reference to a Java `PAGAnimator`
pub struct JniPeer {
    vm: JavaVM,
    object: WeakRef,
    ids: &'static JavaIds,
}

impl JniPeer {
    pub fn new(env: &mut JNIEnv, object: &JObject, ids: &'static JavaIds) -> jni::errors::Result<Self> {
        let vm = env.get_java_vm()?;
        let object = env
            .new_weak_ref(object)?
            .ok_or(jni::errors::Error::NullPtr("PAGAnimator"))?;
        Ok(Self { vm, object, ids })
    }
}

impl WeakPeer for JniPeer {
    type Live<'a> = LivePeer<'a>
    where
        Self: 'a;

    fn resolve(&self) -> Option<LivePeer<'_>> {
        let env = match self.vm.attach_current_thread_as_daemon() {
            Ok(env) => env,
            Err(e) => {
                warn!("Failed to attach JNI thread: {:?}", e);
                return None;
            }
        };
        // Null once the Java object has been collected
        let object = match self.object.upgrade_local(&env) {
            Ok(Some(object)) => object,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to upgrade PAGAnimator reference: {:?}", e);
                return None;
            }
        };
        Some(LivePeer {
            env: RefCell::new(env),
            object,
            ids: self.ids,
        })
    }
}

/// A resolved peer, valid on the resolving thread for one notification
pub struct LivePeer<'a> {
    env: RefCell<JNIEnv<'a>>,
    object: JObject<'a>,
    ids: &'static JavaIds,
}

impl LivePeer<'_> {
    fn call_void(&self, method: JMethodID, name: &str) -> PeerResult {
        let mut env = self.env.borrow_mut();
        // SAFETY: `method` was resolved on the object's class with signature ()V
        let result = unsafe {
            env.call_method_unchecked(
                &self.object,
                method,
                ReturnType::Primitive(Primitive::Void),
                &[],
            )
        };

        // Clear any pending exceptions
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_describe();
            let _ = env.exception_clear();
            return Err(PeerError::Exception(format!("{} threw", name)));
        }
        result
            .map(|_| ())
            .map_err(|e| PeerError::Other(format!("{}: {}", name, e)))
    }
}

impl AnimatorPeer for LivePeer<'_> {
    fn on_animation_start(&self) -> PeerResult {
        self.call_void(self.ids.on_start, "onAnimationStart")
    }

    fn on_animation_end(&self) -> PeerResult {
        self.call_void(self.ids.on_end, "onAnimationEnd")
    }

    fn on_animation_cancel(&self) -> PeerResult {
        self.call_void(self.ids.on_cancel, "onAnimationCancel")
    }

    fn on_animation_repeat(&self) -> PeerResult {
        self.call_void(self.ids.on_repeat, "onAnimationRepeat")
    }

    fn on_animation_update(&self) -> PeerResult {
        self.call_void(self.ids.on_update, "onAnimationUpdate")
    }
}

impl Drop for LivePeer<'_> {
    fn drop(&mut self) {
        // Daemon-attached threads never pop a local frame
        let object = std::mem::take(&mut self.object);
        let _ = self.env.get_mut().delete_local_ref(object);
    }
}
