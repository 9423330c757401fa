//! Pointer helpers shared by the exported functions.

use std::ffi::CStr;
use std::os::raw::c_char;

/// Borrows a caller-owned C string for the duration of a call.
///
/// # Safety
///
/// `value` must be non-null, NUL-terminated and stay valid for `'a`.
pub(crate) unsafe fn borrow_cstr<'a>(value: *const c_char) -> &'a CStr {
    // Safety: upheld by the caller.
    unsafe { CStr::from_ptr(value) }
}

pub(crate) fn read_optional_cstr(value: *const c_char) -> Option<String> {
    if value.is_null() {
        return None;
    }
    // Safety: caller guarantees a valid, NUL-terminated C string.
    let cstr = unsafe { CStr::from_ptr(value) };
    Some(cstr.to_string_lossy().into_owned())
}
