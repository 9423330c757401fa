//! Forwarding layer between the exported symbols and the installed core.

use std::any::Any;
use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::store::{InMemoryCore, ProfileCore};

static INSTALLED_CORE: Lazy<RwLock<Arc<dyn ProfileCore>>> =
    Lazy::new(|| RwLock::new(Arc::new(InMemoryCore::new())));

/// Replaces the core behind the exported symbols and returns the previous one.
///
/// Calls already in flight finish against the core they started with.
pub fn install_core(core: Arc<dyn ProfileCore>) -> Arc<dyn ProfileCore> {
    let mut guard = INSTALLED_CORE
        .write()
        .unwrap_or_else(|err| err.into_inner());
    log::debug!(target: "rtss::shim", "installing profile core");
    std::mem::replace(&mut *guard, core)
}

/// The core the exported symbols currently forward to.
pub fn current_core() -> Arc<dyn ProfileCore> {
    let guard = INSTALLED_CORE.read().unwrap_or_else(|err| err.into_inner());
    Arc::clone(&guard)
}

/// Shim bound to the installed core at the time of the call.
pub(crate) fn installed() -> Shim {
    Shim::new(current_core())
}

/// One-to-one forwarder over a [`ProfileCore`].
///
/// Adds nothing but panic containment: a panic inside the core is logged and the
/// call yields the neutral value instead of unwinding into foreign frames.
#[derive(Clone)]
pub struct Shim {
    core: Arc<dyn ProfileCore>,
}

impl Shim {
    pub fn new(core: Arc<dyn ProfileCore>) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &Arc<dyn ProfileCore> {
        &self.core
    }

    pub fn set_property(&self, profile: &CStr, property: &CStr, value: i32) {
        log::trace!(target: "rtss::shim", "set_property {profile:?} {property:?} = {value}");
        let call = || self.core.set_property(profile, property, value);
        self.contain("set_property", call);
    }

    pub fn get_property(&self, profile: &CStr, property: &CStr) -> i32 {
        let value = self
            .contain("get_property", || self.core.get_property(profile, property))
            .unwrap_or(0);
        log::trace!(target: "rtss::shim", "get_property {profile:?} {property:?} -> {value}");
        value
    }

    pub fn set_flags(&self, and_mask: u32, or_mask: u32) {
        let previous = self.contain("set_flags", || self.core.set_flags(and_mask, or_mask));
        if let Some(previous) = previous {
            log::trace!(
                target: "rtss::shim",
                "set_flags and={and_mask:#010x} or={or_mask:#010x} previous={previous:#010x}"
            );
        }
    }

    pub fn get_flags(&self) -> u32 {
        let flags = self.contain("get_flags", || self.core.get_flags());
        flags.unwrap_or(0)
    }

    pub fn delete_profile(&self, profile: &CStr) {
        log::trace!(target: "rtss::shim", "delete_profile {profile:?}");
        self.contain("delete_profile", || self.core.delete_profile(profile));
    }

    pub fn reset_profile(&self, profile: &CStr) {
        log::trace!(target: "rtss::shim", "reset_profile {profile:?}");
        self.contain("reset_profile", || self.core.reset_profile(profile));
    }

    pub fn create_profile(&self, profile: &CStr) {
        log::trace!(target: "rtss::shim", "create_profile {profile:?}");
        self.contain("create_profile", || self.core.create_profile(profile));
    }

    fn contain<T>(&self, operation: &'static str, call: impl FnOnce() -> T) -> Option<T> {
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(value) => Some(value),
            Err(payload) => {
                log::error!(
                    target: "rtss::shim",
                    "panic in profile core during {operation}: {}",
                    panic_message(payload.as_ref())
                );
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
