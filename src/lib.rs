//! C export shim over a profile/property/flag configuration core.
//!
//! The exported symbols (`set_property`, `get_property`, `set_flags`,
//! `get_flags`, ...) forward to whichever [`ProfileCore`] is installed.
//! An [`InMemoryCore`] is installed until a host calls [`install_core`].

mod error;
mod exports;
mod ffi;
mod logging;
mod shim;
mod store;

pub use error::{rtss_error_free, rtss_error_message, rtss_error_t};
pub use exports::{
    create_profile, delete_profile, get_flags, get_property, reset_profile, set_flags, set_property,
};
pub use logging::{
    rtss_log_callback_t, rtss_log_config_init, rtss_log_config_t, rtss_log_init,
    rtss_log_level_t, rtss_log_record_t,
};
pub use shim::{Shim, current_core, install_core};
pub use store::{GLOBAL_PROFILE, InMemoryCore, ProfileCore};
