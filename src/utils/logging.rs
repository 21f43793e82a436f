//! Conditional logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! The tracking paths are chatty; each module that wants this logging defines
//! `const ENABLE_LOGS: bool = ...;` and imports the macros from the crate
//! root.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
