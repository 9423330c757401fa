use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Error returned to C callers through an out-parameter.
///
/// Opaque from C. Read it with `rtss_error_message` and release it with `rtss_error_free`.
#[allow(non_camel_case_types)]
pub struct rtss_error_t {
    message: CString,
}

/// Failures reported by the library's own (non data-path) entry points.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ShimError {
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidLogFilter { filter: String, reason: String },
    #[error("logging already initialized by another logger")]
    LoggerClaimed,
}

impl From<&ShimError> for rtss_error_t {
    fn from(error: &ShimError) -> Self {
        Self {
            message: cstring_from_str_lossy(&error.to_string()),
        }
    }
}

pub(crate) fn cstring_from_str_lossy(value: &str) -> CString {
    CString::new(value.replace('\0', " ")).unwrap_or_default()
}

/// Stores `value` in the caller's error slot, if the caller passed one.
fn store_error(out_error: *mut *mut rtss_error_t, value: *mut rtss_error_t) {
    // Safety: a non-null out_error points to a writable slot owned by the caller.
    if let Some(slot) = unsafe { out_error.as_mut() } {
        *slot = value;
    }
}

pub(crate) fn clear_error(out_error: *mut *mut rtss_error_t) {
    store_error(out_error, ptr::null_mut());
}

pub(crate) fn write_error(out_error: *mut *mut rtss_error_t, error: &ShimError) {
    if out_error.is_null() {
        return;
    }
    let handle = Box::into_raw(Box::new(rtss_error_t::from(error)));
    store_error(out_error, handle);
}

/// Returns the message of `error`, or null for a null handle.
///
/// The string is owned by the handle and dies with it.
#[unsafe(no_mangle)]
pub extern "C" fn rtss_error_message(error: *const rtss_error_t) -> *const c_char {
    // Safety: a non-null error was allocated by write_error and not yet freed.
    unsafe { error.as_ref() }.map_or(ptr::null(), |error| error.message.as_ptr())
}

/// Releases an error handle. Null is ignored.
#[unsafe(no_mangle)]
pub extern "C" fn rtss_error_free(error: *mut rtss_error_t) {
    if !error.is_null() {
        // Safety: error was allocated by write_error and ownership returns here.
        drop(unsafe { Box::from_raw(error) });
    }
}
