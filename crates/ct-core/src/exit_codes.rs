//! Stable process exit codes for CLI operations.

use ct_common::{Error, ErrorCategory};

/// Exit codes reported by the ct-core binary. Stable for scripting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean run; every event assessed (rejected records allowed).
    Success = 0,
    /// Usage error (bad arguments).
    Usage = 1,
    /// Configuration or weights error at startup.
    Config = 2,
    /// Input could not be read or parsed.
    Input = 3,
    /// The run completed but one or more events failed to assess.
    PartialFailure = 4,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(e: &Error) -> Self {
        match e.category() {
            ErrorCategory::Config => ExitCode::Config,
            ErrorCategory::Io | ErrorCategory::DataQuality => ExitCode::Input,
            ErrorCategory::Sequence | ErrorCategory::Forecast => ExitCode::PartialFailure,
        }
    }
}
