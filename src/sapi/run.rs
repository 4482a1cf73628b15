//! Script execution on the embedded interpreter.
//!
//! Each call wraps exactly one PHP request. Output reaching the SAPI and
//! messages routed to `log_message` are returned to the caller.

use std::ffi::{c_void, CString};
use std::path::Path;
use std::ptr;
use std::time::Instant;

use super::callbacks;
use super::error::SapiError;
use super::ffi::*;
use super::module;

/// Result of running one script.
#[derive(Debug, Clone, Default)]
pub struct ScriptOutput {
    /// Bytes written by the script (after PHP's own buffers are flushed).
    pub body: Vec<u8>,
    /// Diagnostics PHP logged during the request (warnings, notices, fatals).
    pub diagnostics: Vec<String>,
}

impl ScriptOutput {
    /// Body as UTF-8, lossily.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether any diagnostic contains `needle`.
    pub fn has_diagnostic(&self, needle: &str) -> bool {
        self.diagnostics.iter().any(|d| d.contains(needle))
    }
}

/// Execute a PHP file as the primary script of a fresh request.
///
/// Must run on the thread that started the interpreter (NTS builds).
pub fn execute_file(path: &Path) -> Result<ScriptOutput, SapiError> {
    if !module::is_initialized() {
        return Err(SapiError::NotInitialized);
    }

    if !path.exists() {
        return Err(SapiError::ScriptNotFound(path.to_path_buf()));
    }

    let abs_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_c = CString::new(abs_path.to_string_lossy().as_bytes())
        .map_err(|_| SapiError::InvalidPath(abs_path.clone()))?;

    tracing::debug!(script = %abs_path.display(), "Executing script");
    let start = Instant::now();

    callbacks::reset_capture();

    unsafe {
        if let Err(e) = start_request(php_request_startup, php_request_shutdown) {
            callbacks::reset_capture();
            return Err(e);
        }

        let mut file_handle: zend_file_handle = std::mem::zeroed();
        zend_stream_init_filename(&mut file_handle, path_c.as_ptr());
        file_handle.primary_script = true;

        // php_execute_script() installs its own bailout handler
        let ok = php_execute_script(&mut file_handle);

        zend_destroy_file_handle(&mut file_handle);
        php_request_shutdown(ptr::null_mut());

        if !ok {
            tracing::debug!(script = %abs_path.display(), "Script did not complete");
        }
    }

    let (body, diagnostics) = callbacks::take_capture();

    tracing::debug!(
        script = %abs_path.display(),
        bytes = body.len(),
        diagnostics = diagnostics.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "Script finished"
    );

    Ok(ScriptOutput { body, diagnostics })
}

/// Start a request, tearing down whatever was set up if startup fails.
///
/// # Safety
/// `startup` and `shutdown` must be a matching request lifecycle pair.
unsafe fn start_request(
    startup: unsafe extern "C" fn() -> zend_result,
    shutdown: unsafe extern "C" fn(*mut c_void),
) -> Result<(), SapiError> {
    if startup() != SUCCESS {
        shutdown(ptr::null_mut());
        return Err(SapiError::RequestStartup);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static CALLS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    unsafe extern "C" fn startup_ok() -> zend_result {
        CALLS.with(|c| c.borrow_mut().push("startup"));
        SUCCESS
    }

    unsafe extern "C" fn startup_fails() -> zend_result {
        CALLS.with(|c| c.borrow_mut().push("startup"));
        -1
    }

    unsafe extern "C" fn shutdown(_dummy: *mut c_void) {
        CALLS.with(|c| c.borrow_mut().push("shutdown"));
    }

    #[test]
    fn test_failed_startup_shuts_request_down() {
        CALLS.with(|c| c.borrow_mut().clear());

        let err = unsafe { start_request(startup_fails, shutdown) }.unwrap_err();
        assert!(matches!(err, SapiError::RequestStartup));
        CALLS.with(|c| assert_eq!(*c.borrow(), vec!["startup", "shutdown"]));
    }

    #[test]
    fn test_successful_startup_leaves_request_open() {
        CALLS.with(|c| c.borrow_mut().clear());

        unsafe { start_request(startup_ok, shutdown) }.unwrap();
        CALLS.with(|c| assert_eq!(*c.borrow(), vec!["startup"]));
    }

    #[test]
    fn test_script_output_helpers() {
        let out = ScriptOutput {
            body: b"ok".to_vec(),
            diagnostics: vec!["PHP Warning:  phptoro(): bridge not initialised".into()],
        };
        assert_eq!(out.body_string(), "ok");
        assert!(out.has_diagnostic("not initialised"));
        assert!(!out.has_diagnostic("Fatal"));
    }
}
