//! Logging utilities.
//!
//! Two layers live here:
//! - `init_logging` installs the process-wide `env_logger` sink behind the `log` facade
//! - `Diagnostics` is the capability handed to session components that must report
//!   milestones and driver diagnostics; components never reach for a global logger

mod diagnostics;
mod init;

pub use diagnostics::{
    DiagnosticEvent, DiagnosticLevel, Diagnostics, LogDiagnostics, RecordingDiagnostics,
};
pub use init::{init_logging, LoggingConfig};
