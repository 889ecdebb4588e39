//! Logging infrastructure for isubench
//!
//! Output is split into two channels, both driven by `tracing`:
//! - the contestant channel (stdout): terse failure lines and the verdict
//! - the admin channel (stderr): everything else, including detailed
//!   failure context and the score breakdown

pub mod init;

pub use init::init_logging_from_config;

#[doc(hidden)]
pub use tracing as __tracing;

/// Target of events written to the contestant channel
pub const CONTESTANT: &str = "contestant";

/// Target of events written to the admin channel
pub const ADMIN: &str = "admin";

/// Log a line to the contestant channel
#[macro_export]
macro_rules! contestant {
    ($($arg:tt)+) => {
        $crate::__tracing::info!(target: $crate::CONTESTANT, $($arg)+)
    };
}

/// Log a line to the admin channel
#[macro_export]
macro_rules! admin {
    ($($arg:tt)+) => {
        $crate::__tracing::info!(target: $crate::ADMIN, $($arg)+)
    };
}
