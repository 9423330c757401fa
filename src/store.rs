//! Profile/property/flag cores the shim forwards to.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Name of the global profile.
pub const GLOBAL_PROFILE: &CStr = c"";

/// The four-function boundary (plus profile maintenance) behind the exported symbols.
///
/// Names are borrowed for the duration of a call only. Implementations that keep
/// them must copy. Property and profile names, and the meaning of flag bits, are
/// opaque to everything above this trait.
pub trait ProfileCore: Send + Sync {
    fn set_property(&self, profile: &CStr, property: &CStr, value: i32);

    /// Returns the stored value, or whatever the core uses for an unknown pair.
    fn get_property(&self, profile: &CStr, property: &CStr) -> i32;

    /// Applies `(register & and_mask) | or_mask` atomically and returns the previous register.
    fn set_flags(&self, and_mask: u32, or_mask: u32) -> u32;

    fn get_flags(&self) -> u32;

    /// Forgets a profile and all of its properties.
    fn delete_profile(&self, profile: &CStr);

    /// Clears every property of a profile, keeping the profile itself.
    fn reset_profile(&self, profile: &CStr);

    /// (Re)creates a profile as a copy of the global profile's properties.
    fn create_profile(&self, profile: &CStr);
}

type PropertyMap = HashMap<CString, i32>;

/// Process-local core. Unknown properties read as `0`.
#[derive(Debug, Default)]
pub struct InMemoryCore {
    profiles: RwLock<HashMap<CString, PropertyMap>>,
    flags: AtomicU32,
}

impl InMemoryCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(flags: u32) -> Self {
        Self {
            profiles: RwLock::default(),
            flags: AtomicU32::new(flags),
        }
    }

    /// Sorted snapshot of the profiles currently known.
    pub fn profile_names(&self) -> Vec<CString> {
        let guard = self.profiles.read().unwrap_or_else(|err| err.into_inner());
        let mut names: Vec<CString> = guard.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ProfileCore for InMemoryCore {
    fn set_property(&self, profile: &CStr, property: &CStr, value: i32) {
        let mut guard = self.profiles.write().unwrap_or_else(|err| err.into_inner());
        guard
            .entry(profile.to_owned())
            .or_default()
            .insert(property.to_owned(), value);
    }

    fn get_property(&self, profile: &CStr, property: &CStr) -> i32 {
        let guard = self.profiles.read().unwrap_or_else(|err| err.into_inner());
        guard
            .get(profile)
            .and_then(|properties| properties.get(property))
            .copied()
            .unwrap_or(0)
    }

    fn set_flags(&self, and_mask: u32, or_mask: u32) -> u32 {
        let update = |register: u32| Some((register & and_mask) | or_mask);
        // The closure never returns None, so both arms carry the previous value.
        match self.flags.fetch_update(Ordering::AcqRel, Ordering::Acquire, update) {
            Ok(previous) | Err(previous) => previous,
        }
    }

    fn get_flags(&self) -> u32 {
        self.flags.load(Ordering::Acquire)
    }

    fn delete_profile(&self, profile: &CStr) {
        let mut guard = self.profiles.write().unwrap_or_else(|err| err.into_inner());
        guard.remove(profile);
    }

    fn reset_profile(&self, profile: &CStr) {
        let mut guard = self.profiles.write().unwrap_or_else(|err| err.into_inner());
        if let Some(properties) = guard.get_mut(profile) {
            properties.clear();
        }
    }

    fn create_profile(&self, profile: &CStr) {
        let mut guard = self.profiles.write().unwrap_or_else(|err| err.into_inner());
        let base = guard.get(GLOBAL_PROFILE).cloned().unwrap_or_default();
        guard.insert(profile.to_owned(), base);
    }
}
