//! Startup profile: interpreter configuration defaults.
//!
//! The block is handed to PHP through the SAPI `ini_defaults` hook, which
//! runs during module startup just before PHP parses `ini_entries`. It
//! replaces whatever `ini_entries` the host had set.

macro_rules! ini_block {
    () => {
        "variables_order=EGPCS\n\
         request_order=GP\n\
         output_buffering=4096\n\
         implicit_flush=0\n\
         html_errors=0\n\
         display_errors=1\n\
         log_errors=1\n\
         opcache.enable=0\n\
         opcache.enable_cli=0\n"
    };
}

/// The directives as text (newline separated, no terminator).
pub const INI_TEXT: &str = ini_block!();

/// The directives as PHP expects them in `sapi_module.ini_entries`.
pub static INI_ENTRIES: &[u8] = concat!(ini_block!(), "\0").as_bytes();

/// Iterate over `(key, value)` pairs in block order.
pub fn directives() -> impl Iterator<Item = (&'static str, &'static str)> {
    INI_TEXT.lines().filter_map(|line| line.split_once('='))
}

/// Look up one directive.
pub fn get(key: &str) -> Option<&'static str> {
    directives().find(|(k, _)| *k == key).map(|(_, v)| v)
}

/// Log the profile at debug level.
pub fn log_summary() {
    for (key, value) in directives() {
        tracing::debug!(key, value, "ini default");
    }
}

/// SAPI `ini_defaults` hook: point `sapi_module.ini_entries` at the block.
#[cfg(feature = "php")]
pub unsafe extern "C" fn ini_defaults(_configuration_hash: *mut crate::sapi::ffi::HashTable) {
    use crate::sapi::ffi::sapi_module;

    let module = &raw mut sapi_module;
    (*module).ini_entries = INI_ENTRIES.as_ptr() as *const std::ffi::c_char;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_verbatim() {
        let all: Vec<_> = directives().collect();
        assert_eq!(
            all,
            vec![
                ("variables_order", "EGPCS"),
                ("request_order", "GP"),
                ("output_buffering", "4096"),
                ("implicit_flush", "0"),
                ("html_errors", "0"),
                ("display_errors", "1"),
                ("log_errors", "1"),
                ("opcache.enable", "0"),
                ("opcache.enable_cli", "0"),
            ]
        );
    }

    #[test]
    fn test_block_terminated() {
        assert_eq!(INI_ENTRIES.last(), Some(&0u8));
        assert_eq!(&INI_ENTRIES[..INI_ENTRIES.len() - 1], INI_TEXT.as_bytes());
        // Exactly one nul, at the end
        assert_eq!(INI_ENTRIES.iter().filter(|&&b| b == 0).count(), 1);
        assert!(INI_TEXT.ends_with('\n'));
    }

    #[test]
    fn test_get() {
        assert_eq!(get("output_buffering"), Some("4096"));
        assert_eq!(get("opcache.enable_cli"), Some("0"));
        assert_eq!(get("memory_limit"), None);
    }
}
