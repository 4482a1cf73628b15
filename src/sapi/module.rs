//! SAPI module definition and lifecycle management.
//!
//! The interpreter owns a single global `sapi_module`. This module fills in
//! its callbacks field by field rather than copying a whole struct over it,
//! so whatever `bridge::prepare()` published beforehand (the function table
//! and the startup defaults hook) survives into module startup.

use std::ffi::c_char;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use super::callbacks;
use super::error::SapiError;
use super::ffi::*;

static SAPI_INITIALIZED: AtomicBool = AtomicBool::new(false);

// Static strings for SAPI name (must live for program duration)
static SAPI_NAME: &[u8] = b"phptoro\0";
static SAPI_PRETTY_NAME: &[u8] = b"phpToro Embedded PHP\0";

/// Point the global `sapi_module` at our callbacks.
///
/// Leaves `additional_functions` and `ini_defaults` alone.
unsafe fn configure(module: *mut sapi_module_struct) {
    (*module).name = SAPI_NAME.as_ptr() as *mut c_char;
    (*module).pretty_name = SAPI_PRETTY_NAME.as_ptr() as *mut c_char;

    // Lifecycle callbacks
    (*module).startup = Some(callbacks::sapi_startup_callback);
    (*module).shutdown = Some(callbacks::sapi_shutdown_callback);
    (*module).activate = Some(callbacks::sapi_activate_callback);
    (*module).deactivate = Some(callbacks::sapi_deactivate_callback);

    // Output callbacks
    (*module).ub_write = Some(callbacks::sapi_ub_write);
    (*module).flush = Some(callbacks::sapi_flush);
    (*module).send_headers = Some(callbacks::sapi_send_headers);

    // Input callbacks
    (*module).read_cookies = Some(callbacks::sapi_read_cookies);
    (*module).register_server_variables = Some(callbacks::sapi_register_server_variables);

    // Logging
    (*module).log_message = Some(callbacks::sapi_log_message);
    (*module).get_request_time = Some(callbacks::sapi_get_request_time);

    (*module).php_ini_ignore = 0;
    (*module).php_ini_ignore_cwd = 1;

    // phpinfo() must render HTML so the rebrander has a <style> block to splice
    (*module).phpinfo_as_text = 0;
}

/// Start the embedded interpreter.
///
/// Call once, after `bridge::prepare()` and before `rebrand::install()`.
/// Calling it again is a no-op.
///
/// # Errors
///
/// Returns an error if:
/// - `php_tsrm_startup` fails (ZTS builds)
/// - `php_module_startup` fails
pub fn init() -> Result<(), SapiError> {
    if SAPI_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(()); // Already initialized
    }

    tracing::info!(sapi_name = name(), "Initializing SAPI module");

    unsafe {
        // TSRM must exist before sapi_startup() in ZTS builds
        #[cfg(feature = "zts")]
        if !php_tsrm_startup() {
            SAPI_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(SapiError::Tsrm);
        }

        let module = &raw mut sapi_module;
        configure(module);

        sapi_startup(module);

        let result = php_module_startup(module, ptr::null_mut());
        if result != SUCCESS {
            sapi_shutdown();
            SAPI_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(SapiError::Startup { code: result });
        }
    }

    tracing::info!(sapi_name = name(), "SAPI module initialized successfully");
    Ok(())
}

/// Shutdown the interpreter.
///
/// The embedding lifecycle is one-shot: PHP cannot be started again in the
/// same process afterwards.
pub fn shutdown() {
    if !SAPI_INITIALIZED.swap(false, Ordering::SeqCst) {
        return; // Not initialized
    }

    tracing::info!(sapi_name = name(), "Shutting down SAPI module");

    unsafe {
        php_module_shutdown();
        sapi_shutdown();
    }

    tracing::info!(sapi_name = name(), "SAPI module shutdown complete");
}

/// Check if the SAPI is initialized.
pub fn is_initialized() -> bool {
    SAPI_INITIALIZED.load(Ordering::SeqCst)
}

/// Get the SAPI name.
pub fn name() -> &'static str {
    "phptoro"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sapi_name() {
        assert_eq!(name(), "phptoro");
        assert_eq!(&SAPI_NAME[..SAPI_NAME.len() - 1], name().as_bytes());
    }

    #[test]
    fn test_static_strings() {
        // Verify null termination
        assert_eq!(SAPI_NAME.last(), Some(&0u8));
        assert_eq!(SAPI_PRETTY_NAME.last(), Some(&0u8));
    }
}
