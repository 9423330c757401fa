//! Logging for hosts that load the shim.
//!
//! Nothing is logged until `rtss_log_init` installs the library logger.

use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::RwLock;

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::{Lazy, OnceCell};

use crate::error::{ShimError, clear_error, cstring_from_str_lossy, rtss_error_t, write_error};
use crate::ffi::read_optional_cstr;

const DEFAULT_TARGET: &str = "rtss";

static LOGGER_INSTALLED: OnceCell<bool> = OnceCell::new();
static RTSS_LOGGER: Lazy<ShimLogger> = Lazy::new(ShimLogger::default);

/// Log levels understood by `rtss_log_init`.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(C)]
pub enum rtss_log_level_t {
    RTSS_LOG_LEVEL_OFF = 0,
    RTSS_LOG_LEVEL_ERROR = 1,
    RTSS_LOG_LEVEL_WARN = 2,
    RTSS_LOG_LEVEL_INFO = 3,
    RTSS_LOG_LEVEL_DEBUG = 4,
    RTSS_LOG_LEVEL_TRACE = 5,
}

impl From<rtss_log_level_t> for LevelFilter {
    fn from(value: rtss_log_level_t) -> Self {
        match value {
            rtss_log_level_t::RTSS_LOG_LEVEL_OFF => LevelFilter::Off,
            rtss_log_level_t::RTSS_LOG_LEVEL_ERROR => LevelFilter::Error,
            rtss_log_level_t::RTSS_LOG_LEVEL_WARN => LevelFilter::Warn,
            rtss_log_level_t::RTSS_LOG_LEVEL_INFO => LevelFilter::Info,
            rtss_log_level_t::RTSS_LOG_LEVEL_DEBUG => LevelFilter::Debug,
            rtss_log_level_t::RTSS_LOG_LEVEL_TRACE => LevelFilter::Trace,
        }
    }
}

impl From<Level> for rtss_log_level_t {
    fn from(value: Level) -> Self {
        match value {
            Level::Error => rtss_log_level_t::RTSS_LOG_LEVEL_ERROR,
            Level::Warn => rtss_log_level_t::RTSS_LOG_LEVEL_WARN,
            Level::Info => rtss_log_level_t::RTSS_LOG_LEVEL_INFO,
            Level::Debug => rtss_log_level_t::RTSS_LOG_LEVEL_DEBUG,
            Level::Trace => rtss_log_level_t::RTSS_LOG_LEVEL_TRACE,
        }
    }
}

/// A log record handed to the host callback.
///
/// The strings live only as long as the callback invocation.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct rtss_log_record_t {
    pub level: rtss_log_level_t,
    pub target: *const c_char,
    pub message: *const c_char,
}

#[allow(non_camel_case_types)]
pub type rtss_log_callback_t =
    Option<extern "C" fn(record: *const rtss_log_record_t, user_data: *mut c_void)>;

/// Logging configuration.
///
/// A non-null `filter` (`RUST_LOG` syntax) wins over `RUST_LOG` from the
/// environment, which wins over `level`. `level` applies to the `rtss` target only.
/// Without a `callback` records are written to stderr.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct rtss_log_config_t {
    pub level: rtss_log_level_t,
    pub filter: *const c_char,
    pub callback: rtss_log_callback_t,
    pub user_data: *mut c_void,
}

#[derive(Clone, Debug, PartialEq)]
struct Directive {
    prefix: Option<String>,
    level: LevelFilter,
}

impl Directive {
    /// Bare levels rank below any target prefix.
    fn specificity(&self) -> usize {
        self.prefix.as_ref().map_or(0, |prefix| prefix.len() + 1)
    }
}

/// Target-prefix filter. The longest matching prefix decides; a bare level sets the fallback.
#[derive(Clone, Debug, PartialEq)]
struct TargetFilter {
    directives: Vec<Directive>,
}

impl TargetFilter {
    fn for_level(level: LevelFilter) -> Self {
        Self {
            directives: vec![Directive {
                prefix: Some(DEFAULT_TARGET.to_string()),
                level,
            }],
        }
    }

    fn parse(spec: &str) -> Result<Self, String> {
        let directives = spec
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_directive)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { directives })
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        self.directives
            .iter()
            .filter(|directive| match &directive.prefix {
                Some(prefix) => target.starts_with(prefix.as_str()),
                None => true,
            })
            .max_by_key(|directive| directive.specificity())
            .map_or(LevelFilter::Off, |directive| directive.level)
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn max_level(&self) -> LevelFilter {
        self.directives
            .iter()
            .map(|directive| directive.level)
            .max()
            .unwrap_or(LevelFilter::Off)
    }
}

fn parse_directive(item: &str) -> Result<Directive, String> {
    match item.split_once('=') {
        Some((target, level)) => {
            let (target, level) = (target.trim(), level.trim());
            if target.is_empty() {
                return Err(format!("missing target in `{item}`"));
            }
            let level = parse_level(level).ok_or_else(|| format!("invalid level `{level}`"))?;
            Ok(Directive {
                prefix: Some(target.to_string()),
                level,
            })
        }
        None => Ok(match parse_level(item) {
            Some(level) => Directive {
                prefix: None,
                level,
            },
            None => Directive {
                prefix: Some(item.to_string()),
                level: LevelFilter::Trace,
            },
        }),
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

struct Sink {
    filter: TargetFilter,
    callback: rtss_log_callback_t,
    // Stored as an address so the logger stays Send + Sync.
    user_data: usize,
}

struct ShimLogger {
    sink: RwLock<Sink>,
}

impl Default for ShimLogger {
    fn default() -> Self {
        Self {
            sink: RwLock::new(Sink {
                filter: TargetFilter::for_level(LevelFilter::Info),
                callback: None,
                user_data: 0,
            }),
        }
    }
}

impl ShimLogger {
    fn replace(&self, sink: Sink) {
        *self.sink.write().unwrap_or_else(|err| err.into_inner()) = sink;
    }
}

impl Log for ShimLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let sink = self.sink.read().unwrap_or_else(|err| err.into_inner());
        sink.filter.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        let (callback, user_data) = {
            let sink = self.sink.read().unwrap_or_else(|err| err.into_inner());
            if !sink.filter.enabled(record.metadata()) {
                return;
            }
            (sink.callback, sink.user_data)
        };

        match callback {
            Some(callback) => {
                let target = cstring_from_str_lossy(record.target());
                let message = cstring_from_str_lossy(&record.args().to_string());
                let record = rtss_log_record_t {
                    level: record.level().into(),
                    target: target.as_ptr(),
                    message: message.as_ptr(),
                };
                callback(&record, user_data as *mut c_void);
            }
            None => eprintln!("{} {}: {}", record.level(), record.target(), record.args()),
        }
    }

    fn flush(&self) {}
}

fn resolve_filter(config: Option<&rtss_log_config_t>) -> Result<TargetFilter, ShimError> {
    let explicit = config.and_then(|config| read_optional_cstr(config.filter));
    let spec = explicit.or_else(|| std::env::var("RUST_LOG").ok());
    if let Some(spec) = spec {
        return TargetFilter::parse(&spec).map_err(|reason| ShimError::InvalidLogFilter {
            filter: spec.clone(),
            reason,
        });
    }

    let level = config.map_or(rtss_log_level_t::RTSS_LOG_LEVEL_INFO, |config| config.level);
    Ok(TargetFilter::for_level(level.into()))
}

fn install_logger() -> Result<(), ShimError> {
    let claim = || log::set_logger(&*RTSS_LOGGER).is_ok();
    if *LOGGER_INSTALLED.get_or_init(claim) {
        Ok(())
    } else {
        Err(ShimError::LoggerClaimed)
    }
}

/// Writes the default configuration: INFO for the `rtss` target, no callback.
#[unsafe(no_mangle)]
pub extern "C" fn rtss_log_config_init(config: *mut rtss_log_config_t) {
    if config.is_null() {
        return;
    }
    // Safety: caller provided a writable config pointer.
    unsafe {
        config.write(rtss_log_config_t {
            level: rtss_log_level_t::RTSS_LOG_LEVEL_INFO,
            filter: ptr::null(),
            callback: None,
            user_data: ptr::null_mut(),
        });
    }
}

/// Installs the library logger, or reconfigures it when already installed.
///
/// A null `config` selects the defaults. Returns false and fills `out_error`
/// when the filter is invalid or another logger owns the process.
#[unsafe(no_mangle)]
pub extern "C" fn rtss_log_init(
    config: *const rtss_log_config_t,
    out_error: *mut *mut rtss_error_t,
) -> bool {
    clear_error(out_error);

    // Safety: a non-null config must point to a valid rtss_log_config_t.
    let config = unsafe { config.as_ref() };
    let result = resolve_filter(config).and_then(|filter| {
        install_logger()?;
        Ok(filter)
    });

    let filter = match result {
        Ok(filter) => filter,
        Err(err) => {
            write_error(out_error, &err);
            return false;
        }
    };

    let max_level = filter.max_level();
    RTSS_LOGGER.replace(Sink {
        filter,
        callback: config.and_then(|config| config.callback),
        user_data: config.map_or(0, |config| config.user_data as usize),
    });
    log::set_max_level(max_level);
    log::debug!(target: "rtss::logging", "logging configured at {max_level}");
    true
}
