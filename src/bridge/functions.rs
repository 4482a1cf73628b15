//! The `phptoro()` built-in as seen by the Zend engine.
//!
//! ```php
//! phptoro(string $command, ?string $params_json = '{}'): string|false
//!
//! $result = phptoro('notification.show', json_encode(['title' => 'Hi']));
//! ```

use std::ffi::{c_char, CStr};
use std::ptr;

use super::Outcome;
use crate::sapi::ffi::*;

/// Warning raised when a script calls phptoro() before prepare().
pub const NOT_INITIALISED: &CStr = c"bridge not initialised";

// ============================================================================
// PHP Function Implementation
// ============================================================================

/// phptoro(string $command, ?string $params_json = '{}'): string|false
///
/// Calls the host dispatcher synchronously and returns its response.
pub unsafe extern "C" fn zif_phptoro(execute_data: *mut zend_execute_data, return_value: *mut zval) {
    let mut command: *const c_char = ptr::null();
    let mut command_len: usize = 0;
    let mut params: *const c_char = ptr::null();
    let mut params_len: usize = 0;

    let num_args = get_num_args(execute_data);
    let parsed = zend_parse_parameters(
        num_args,
        c"s|s!".as_ptr(),
        &mut command as *mut *const c_char,
        &mut command_len as *mut usize,
        &mut params as *mut *const c_char,
        &mut params_len as *mut usize,
    );
    if parsed != SUCCESS {
        // ArgumentCountError / TypeError already thrown
        return;
    }

    let command = CStr::from_ptr(command);
    let params = (!params.is_null() && params_len > 0).then(|| CStr::from_ptr(params));

    match super::invoke(command, params, |bytes| new_zend_string(bytes)) {
        Outcome::NotInitialised => {
            php_error_docref(ptr::null(), E_WARNING, c"%s".as_ptr(), NOT_INITIALISED.as_ptr());
            (*return_value).set_bool(false);
        }
        Outcome::Failed => (*return_value).set_bool(false),
        Outcome::Response(s) => (*return_value).set_new_str(s),
    }
}

// ============================================================================
// Function Registration
// ============================================================================

static FNAME_PHPTORO: &[u8] = b"phptoro\0";

/// Arginfo for phptoro(string $command, ?string $params_json = '{}'): string|false
/// 1 required, 1 optional
static ARGINFO_PHPTORO: [zend_internal_arg_info; 3] = [
    zend_internal_arg_info::returns(1, MAY_BE_STRING | MAY_BE_FALSE),
    zend_internal_arg_info::arg(c"command".as_ptr(), MAY_BE_STRING, ptr::null()),
    zend_internal_arg_info::arg(
        c"params_json".as_ptr(),
        MAY_BE_STRING | MAY_BE_NULL,
        c"'{}'".as_ptr(),
    ),
];

/// Function table for `additional_functions` in the SAPI module.
pub static PHPTORO_FUNCTIONS: [zend_function_entry; 2] = [
    zend_function_entry {
        fname: FNAME_PHPTORO.as_ptr() as *const c_char,
        handler: Some(zif_phptoro),
        arg_info: ARGINFO_PHPTORO.as_ptr(),
        num_args: 2, // array_len(3) - 1
        flags: 0,
        frameless_function_infos: ptr::null(),
        doc_comment: ptr::null(),
    },
    // Null terminator (required by PHP)
    zend_function_entry::NULL,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_table_size() {
        // 1 function + 1 null terminator
        assert_eq!(PHPTORO_FUNCTIONS.len(), 2);
        assert_eq!(PHPTORO_FUNCTIONS[0].num_args as usize, ARGINFO_PHPTORO.len() - 1);
    }

    #[test]
    fn test_function_name() {
        assert_eq!(FNAME_PHPTORO.last(), Some(&0u8));
        let name = unsafe { CStr::from_ptr(PHPTORO_FUNCTIONS[0].fname) };
        assert_eq!(name, c"phptoro");
    }

    #[test]
    fn test_arginfo() {
        // Required arg count is smuggled through the name pointer
        assert_eq!(ARGINFO_PHPTORO[0].name as usize, 1);

        let command = &ARGINFO_PHPTORO[1];
        assert_eq!(command.type_.type_mask, MAY_BE_STRING);
        assert!(command.default_value.is_null());

        let params = &ARGINFO_PHPTORO[2];
        assert_eq!(params.type_.type_mask, MAY_BE_STRING | MAY_BE_NULL);
        assert_eq!(unsafe { CStr::from_ptr(params.default_value) }, c"'{}'");
    }

    #[test]
    fn test_null_terminator() {
        let last = &PHPTORO_FUNCTIONS[1];
        assert!(last.fname.is_null());
        assert!(last.handler.is_none());
    }
}
