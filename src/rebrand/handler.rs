//! Zend side of the branded phpinfo(): the replacement handler and its
//! installation into the function table.

use std::ffi::{c_char, c_int};

use crate::sapi::ffi::*;

static FNAME_PHPINFO: &[u8] = b"phpinfo";

/// Result of [`install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installed {
    /// The internal `phpinfo` now runs the branded handler.
    Replaced,
    /// No `phpinfo` in the function table.
    Missing,
    /// `phpinfo` exists but is not an internal function; left alone.
    NotInternal,
}

/// phpinfo(int $flags = INFO_ALL): true
///
/// Same contract as the stock function; the output carries the embedder
/// stylesheet.
pub unsafe extern "C" fn zif_phptoro_phpinfo(
    execute_data: *mut zend_execute_data,
    return_value: *mut zval,
) {
    let mut flag: zend_long = PHP_INFO_ALL;

    let num_args = get_num_args(execute_data);
    if zend_parse_parameters(num_args, c"|l".as_ptr(), &mut flag as *mut zend_long) != SUCCESS {
        return;
    }

    php_output_start_default();
    php_print_info(flag as c_int);

    let mut buf = zval::undef();
    php_output_get_contents(&mut buf);
    php_output_discard();

    if buf.type_() != IS_STRING || (*buf.value.str_).len == 0 {
        zval_ptr_dtor(&mut buf);
        (*return_value).set_bool(true);
        return;
    }

    let spliced = super::splice(buf.as_bytes());
    for chunk in spliced.chunks() {
        php_output_write(chunk.as_ptr() as *const c_char, chunk.len());
    }

    zval_ptr_dtor(&mut buf);
    (*return_value).set_bool(true);
}

/// Replace the interpreter's `phpinfo` handler with [`zif_phptoro_phpinfo`].
///
/// Call after `sapi::init()` and before any script runs. Only an internal
/// function is touched; the handler signature is unchanged and the
/// replacement still renders the stock report. Calling it twice is harmless.
pub fn install() -> Installed {
    let installed = unsafe { install_into(function_table()) };

    match installed {
        Installed::Replaced => tracing::debug!("phpinfo() handler replaced"),
        other => tracing::debug!(result = ?other, "phpinfo() left as is"),
    }
    installed
}

unsafe fn install_into(table: *mut HashTable) -> Installed {
    if table.is_null() {
        return Installed::Missing;
    }

    let entry = zend_hash_str_find(
        table,
        FNAME_PHPINFO.as_ptr() as *const c_char,
        FNAME_PHPINFO.len(),
    );
    if entry.is_null() {
        return Installed::Missing;
    }

    let func = (*entry).value.func;
    if func.is_null() {
        return Installed::Missing;
    }

    if (*func).type_ != ZEND_INTERNAL_FUNCTION {
        return Installed::NotInternal;
    }

    (*func).handler = Some(zif_phptoro_phpinfo);
    Installed::Replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_table_is_missing() {
        assert_eq!(unsafe { install_into(std::ptr::null_mut()) }, Installed::Missing);
    }

    #[test]
    fn test_lookup_key() {
        // zend_hash_str_find takes an explicit length, no terminator
        assert_eq!(FNAME_PHPINFO, b"phpinfo");
    }
}
