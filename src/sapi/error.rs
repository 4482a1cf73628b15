//! SAPI error types.

use std::fmt;
use std::path::PathBuf;

/// Error type for interpreter lifecycle and script execution.
#[derive(Debug)]
pub enum SapiError {
    /// `php_tsrm_startup()` refused to start (ZTS builds).
    Tsrm,
    /// `php_module_startup()` failed.
    Startup { code: i32 },
    /// The interpreter has not been started.
    NotInitialized,
    /// `php_request_startup()` failed.
    RequestStartup,
    /// Script path does not exist.
    ScriptNotFound(PathBuf),
    /// Script path cannot be passed to C (interior nul byte).
    InvalidPath(PathBuf),
}

impl fmt::Display for SapiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SapiError::Tsrm => write!(f, "php_tsrm_startup failed"),
            SapiError::Startup { code } => {
                write!(f, "php_module_startup failed with code {}", code)
            }
            SapiError::NotInitialized => write!(f, "PHP engine not initialized"),
            SapiError::RequestStartup => write!(f, "php_request_startup failed"),
            SapiError::ScriptNotFound(path) => {
                write!(f, "script not found: {}", path.display())
            }
            SapiError::InvalidPath(path) => {
                write!(f, "invalid script path: {}", path.display())
            }
        }
    }
}

impl std::error::Error for SapiError {}
