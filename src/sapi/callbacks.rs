//! SAPI callback implementations.
//!
//! This module provides the callback functions that PHP calls while a
//! script runs. These are `extern "C"` functions that bridge PHP's C API
//! with Rust. Output and diagnostics are captured per thread and handed
//! back to the caller when the request ends.

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::ptr;
use std::slice;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;

use super::ffi::*;

// ============================================================================
// Thread-Local State for Callbacks
// ============================================================================

thread_local! {
    /// Everything the script wrote through ub_write
    pub static CAPTURED_OUTPUT: RefCell<BytesMut> = RefCell::new(BytesMut::new());

    /// Messages PHP routed to log_message (warnings, notices, fatals)
    pub static CAPTURED_DIAGNOSTICS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

// ============================================================================
// SAPI Lifecycle Callbacks
// ============================================================================

/// Called once during SAPI startup.
pub unsafe extern "C" fn sapi_startup_callback(_module: *mut sapi_module_struct) -> c_int {
    tracing::trace!("sapi_startup_callback called");
    SUCCESS
}

/// Called once during SAPI shutdown.
pub unsafe extern "C" fn sapi_shutdown_callback(_module: *mut sapi_module_struct) -> c_int {
    tracing::trace!("sapi_shutdown_callback called");
    SUCCESS
}

/// Called at the start of each request.
pub unsafe extern "C" fn sapi_activate_callback() -> c_int {
    tracing::trace!("sapi_activate_callback called");
    SUCCESS
}

/// Called at the end of each request.
pub unsafe extern "C" fn sapi_deactivate_callback() -> c_int {
    tracing::trace!("sapi_deactivate_callback called");
    SUCCESS
}

// ============================================================================
// Output Callbacks
// ============================================================================

/// Unbuffered write callback - receives all PHP output.
///
/// This is called for every piece of output PHP produces (echo, print, etc.)
/// once it leaves PHP's own output buffers.
pub unsafe extern "C" fn sapi_ub_write(str: *const c_char, len: usize) -> usize {
    if str.is_null() || len == 0 {
        return len;
    }

    let data = slice::from_raw_parts(str.cast::<u8>(), len);
    CAPTURED_OUTPUT.with(|out| out.borrow_mut().extend_from_slice(data));
    len
}

/// Flush callback - output is already captured in memory.
pub unsafe extern "C" fn sapi_flush(_server_context: *mut c_void) {
    tracing::trace!("sapi_flush called");
}

/// Send headers callback - an embedded interpreter has no client to send to.
pub unsafe extern "C" fn sapi_send_headers(_sapi_headers: *mut sapi_headers_struct) -> c_int {
    SAPI_HEADER_SENT_SUCCESSFULLY
}

/// Read cookies callback.
pub unsafe extern "C" fn sapi_read_cookies() -> *mut c_char {
    ptr::null_mut()
}

// ============================================================================
// Server Variables Callback
// ============================================================================

static SERVER_SOFTWARE: &[u8] = b"phptoro";

/// Register $_SERVER variables.
///
/// Called during php_request_startup() to populate $_SERVER.
pub unsafe extern "C" fn sapi_register_server_variables(track_vars_array: *mut zval) {
    tracing::trace!("sapi_register_server_variables called");

    if track_vars_array.is_null() {
        return;
    }

    php_register_variable_safe(
        c"SERVER_SOFTWARE".as_ptr(),
        SERVER_SOFTWARE.as_ptr() as *const c_char,
        SERVER_SOFTWARE.len(),
        track_vars_array,
    );
}

// ============================================================================
// Logging Callback
// ============================================================================

/// Log message callback - receives PHP errors and messages.
pub unsafe extern "C" fn sapi_log_message(message: *const c_char, syslog_type: c_int) {
    if message.is_null() {
        return;
    }

    let msg = CStr::from_ptr(message).to_string_lossy();
    let msg = msg.trim();
    if msg.is_empty() {
        return;
    }

    // Map syslog types to tracing levels
    match syslog_type {
        0..=3 => tracing::error!(target: "php", "{}", msg),
        4 => tracing::warn!(target: "php", "{}", msg),
        5 | 6 => tracing::info!(target: "php", "{}", msg),
        _ => tracing::debug!(target: "php", "{}", msg),
    }

    CAPTURED_DIAGNOSTICS.with(|d| d.borrow_mut().push(msg.to_string()));
}

/// Get request time callback.
pub unsafe extern "C" fn sapi_get_request_time(request_time: *mut f64) -> zend_result {
    if !request_time.is_null() {
        *request_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
    }
    SUCCESS
}

// ============================================================================
// Public API
// ============================================================================

/// Reset captured output and diagnostics before a request.
pub fn reset_capture() {
    CAPTURED_OUTPUT.with(|out| out.borrow_mut().clear());
    CAPTURED_DIAGNOSTICS.with(|d| d.borrow_mut().clear());
}

/// Take captured output and diagnostics after a request.
pub fn take_capture() -> (Vec<u8>, Vec<String>) {
    let body = CAPTURED_OUTPUT.with(|out| out.borrow_mut().split().to_vec());
    let diagnostics = CAPTURED_DIAGNOSTICS.with(|d| std::mem::take(&mut *d.borrow_mut()));
    (body, diagnostics)
}
