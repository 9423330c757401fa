//! Unmangled C entry points over the installed profile core.
//!
//! These are straight forwards: no null checks, no encoding checks, no copies.
//! Every pointer argument is borrowed for the duration of the call only.

use std::os::raw::c_char;

use crate::ffi::borrow_cstr;
use crate::shim;

/// Sets `property` on `profile` to `value`.
///
/// # Safety
///
/// `profile` and `property` must be non-null, NUL-terminated strings that stay
/// valid until the call returns.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_property(profile: *const c_char, property: *const c_char, value: i32) {
    // Safety: upheld by the caller.
    let (profile, property) = unsafe { (borrow_cstr(profile), borrow_cstr(property)) };
    shim::installed().set_property(profile, property, value);
}

/// Returns the value of `property` on `profile`, or the core's default when unset.
///
/// # Safety
///
/// Same contract as [`set_property`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn get_property(profile: *const c_char, property: *const c_char) -> i32 {
    // Safety: upheld by the caller.
    let (profile, property) = unsafe { (borrow_cstr(profile), borrow_cstr(property)) };
    shim::installed().get_property(profile, property)
}

/// Updates the flag register to `(register & and_mask) | or_mask`.
#[unsafe(no_mangle)]
pub extern "C" fn set_flags(and_mask: u32, or_mask: u32) {
    shim::installed().set_flags(and_mask, or_mask);
}

/// Returns the flag register.
#[unsafe(no_mangle)]
pub extern "C" fn get_flags() -> u32 {
    shim::installed().get_flags()
}

/// Removes `profile` and all of its properties.
///
/// # Safety
///
/// `profile` must be a non-null, NUL-terminated string valid for the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn delete_profile(profile: *const c_char) {
    // Safety: upheld by the caller.
    let profile = unsafe { borrow_cstr(profile) };
    shim::installed().delete_profile(profile);
}

/// Clears every property of `profile`.
///
/// # Safety
///
/// Same contract as [`delete_profile`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reset_profile(profile: *const c_char) {
    // Safety: upheld by the caller.
    let profile = unsafe { borrow_cstr(profile) };
    shim::installed().reset_profile(profile);
}

/// Creates `profile` as a copy of the global profile.
///
/// # Safety
///
/// Same contract as [`delete_profile`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn create_profile(profile: *const c_char) {
    // Safety: upheld by the caller.
    let profile = unsafe { borrow_cstr(profile) };
    shim::installed().create_profile(profile);
}
