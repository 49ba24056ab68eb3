//! A single-backend logging facade in the shape of `klog`: one registrable
//! function pointer instead of a trait object, so a firmware image pays for
//! exactly one indirect call per log line and nothing at link time if
//! logging is never wired up.
use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

pub type LogBackend = fn(fmt::Arguments<'_>);

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    fn from_raw(raw: u8) -> LogLevel {
        match raw {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

static BACKEND: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());
static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);

/// Registers the function that receives every enabled log line. Call once,
/// typically from whatever owns the actual transport (serial port, USB CDC,
/// a host-side pipe in tests).
pub fn register_backend(backend: LogBackend) {
    BACKEND.store(backend as *mut (), Ordering::Release);
}

pub fn set_level(level: LogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn level() -> LogLevel {
    LogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

fn is_enabled(level: LogLevel) -> bool {
    (level as u8) <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

/// Dispatches a formatted line to the registered backend. A no-op if
/// nothing has registered one yet — unlike `klog`, there is no early-boot
/// fallback transport to fall back to here, so silence is the default.
pub fn log_args(level: LogLevel, args: fmt::Arguments<'_>) {
    if !is_enabled(level) {
        return;
    }
    let ptr = BACKEND.load(Ordering::Acquire);
    if ptr.is_null() {
        return;
    }
    // SAFETY: `register_backend` only ever stores a `LogBackend` fn pointer,
    // which is pointer-sized on every target this crate builds for.
    let backend: LogBackend = unsafe { core::mem::transmute(ptr) };
    backend(args);
}

#[macro_export]
macro_rules! microflo_error {
    ($($arg:tt)*) => {
        $crate::log::log_args($crate::log::LogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! microflo_warn {
    ($($arg:tt)*) => {
        $crate::log::log_args($crate::log::LogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! microflo_info {
    ($($arg:tt)*) => {
        $crate::log::log_args($crate::log::LogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! microflo_debug {
    ($($arg:tt)*) => {
        $crate::log::log_args($crate::log::LogLevel::Debug, ::core::format_args!($($arg)*))
    };
}
