//! Dispatch bridge between PHP scripts and the host.
//!
//! Scripts call the `phptoro(string $command, ?string $params_json = '{}')`
//! built-in; the call crosses synchronously into a host-supplied dispatcher
//! and returns its response string, or `false`.
//!
//! # Lifecycle
//!
//! ```rust,ignore
//! use phptoro::bridge;
//!
//! // Before interpreter startup: register the dispatcher, the function
//! // table and the startup defaults hook.
//! bridge::prepare(my_dispatcher);
//!
//! // ... start PHP, run scripts ...
//! ```
//!
//! There is no `unprepare`; the dispatcher slot is write-once per process.
//!
//! # Ownership
//!
//! Strings passed to the dispatcher are borrowed from the script's argument
//! frame and must not be retained past the call. A non-null return value is
//! transferred to the bridge, which copies it and releases the original with
//! `free(3)`. Dispatchers must therefore allocate responses with the C
//! allocator (`malloc`, `strdup`), never with Rust's global allocator.

use std::ffi::{c_char, CStr};

use once_cell::sync::OnceCell;

#[cfg(feature = "php")]
pub mod functions;

/// Host dispatcher: `(command, json_args) -> malloc'd response or NULL`.
pub type DispatchFn =
    unsafe extern "C" fn(command: *const c_char, json_args: *const c_char) -> *mut c_char;

/// Process-wide dispatcher, published before the interpreter starts.
static DISPATCHER: OnceCell<DispatchFn> = OnceCell::new();

/// Params passed when a script omits `$params_json` or passes null/"".
pub const DEFAULT_PARAMS: &CStr = c"{}";

/// What a `phptoro()` call resolved to.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// No dispatcher was registered.
    NotInitialised,
    /// The dispatcher returned NULL.
    Failed,
    /// The dispatcher's response, copied into caller-chosen storage.
    Response(T),
}

/// Register the dispatcher and publish the built-in function table.
///
/// Must be called before the interpreter starts. The first dispatcher wins;
/// later calls keep it and log a warning.
pub fn prepare(dispatcher: DispatchFn) {
    if DISPATCHER.set(dispatcher).is_err() {
        tracing::warn!("phptoro dispatcher already registered, keeping the first one");
    } else {
        tracing::debug!("phptoro dispatcher registered");
    }

    publish();
}

/// Publish the `phptoro` function table and the startup defaults hook into
/// the interpreter's SAPI module, without registering a dispatcher.
///
/// `prepare()` calls this. On its own it is only useful to test harnesses:
/// scripts can then call `phptoro()` but get a warning and `false`.
#[cfg(feature = "php")]
pub fn publish() {
    use crate::sapi::ffi::sapi_module;

    unsafe {
        let module = &raw mut sapi_module;
        (*module).additional_functions = functions::PHPTORO_FUNCTIONS.as_ptr();
        (*module).ini_defaults = Some(crate::profile::ini_defaults);
    }

    tracing::debug!(functions = 1, "phptoro function table published");
}

/// Without the `php` feature there is no interpreter to publish into.
#[cfg(not(feature = "php"))]
pub fn publish() {
    tracing::debug!("built without PHP support, nothing to publish");
}

/// The registered dispatcher, if any.
#[inline]
pub fn dispatcher() -> Option<DispatchFn> {
    DISPATCHER.get().copied()
}

/// Whether `prepare()` has registered a dispatcher.
#[inline]
pub fn is_prepared() -> bool {
    DISPATCHER.get().is_some()
}

/// Substitute `"{}"` for missing or empty params.
#[inline]
pub fn params_or_default(params: Option<&CStr>) -> &CStr {
    match params {
        Some(p) if !p.is_empty() => p,
        _ => DEFAULT_PARAMS,
    }
}

/// Call the registered dispatcher.
///
/// `copy` receives the response bytes while the dispatcher's buffer is still
/// alive and must copy them into storage it owns.
pub fn invoke<T>(
    command: &CStr,
    params: Option<&CStr>,
    copy: impl FnOnce(&[u8]) -> T,
) -> Outcome<T> {
    invoke_with(dispatcher(), command, params, copy)
}

/// Call `dispatcher` (or report that there is none).
///
/// Carries no state between calls, so a dispatcher that re-enters the
/// interpreter (which calls `phptoro()` again) is fine.
pub fn invoke_with<T>(
    dispatcher: Option<DispatchFn>,
    command: &CStr,
    params: Option<&CStr>,
    copy: impl FnOnce(&[u8]) -> T,
) -> Outcome<T> {
    let Some(dispatch) = dispatcher else {
        return Outcome::NotInitialised;
    };

    let json = params_or_default(params);
    tracing::trace!(command = %command.to_string_lossy(), "phptoro call");

    let result = unsafe { dispatch(command.as_ptr(), json.as_ptr()) };

    let copy = |bytes: &[u8]| {
        tracing::trace!(
            command = %command.to_string_lossy(),
            bytes = bytes.len(),
            "dispatcher responded"
        );
        copy(bytes)
    };

    match unsafe { take_response(result, copy) } {
        Some(value) => Outcome::Response(value),
        None => {
            tracing::trace!(command = %command.to_string_lossy(), "dispatcher returned NULL");
            Outcome::Failed
        }
    }
}

/// Copy a dispatcher response out, then release it with `free(3)`.
///
/// Returns `None` for NULL.
///
/// # Safety
/// `ptr` must be NULL or a nul-terminated string allocated by the C
/// allocator that nothing else will free.
pub unsafe fn take_response<T>(ptr: *mut c_char, copy: impl FnOnce(&[u8]) -> T) -> Option<T> {
    if ptr.is_null() {
        return None;
    }

    let value = copy(CStr::from_ptr(ptr).to_bytes());
    release(ptr);
    Some(value)
}

unsafe fn release(ptr: *mut c_char) {
    #[cfg(test)]
    tests::RELEASED.with(|r| r.borrow_mut().push(ptr as usize));

    libc::free(ptr.cast());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::ffi::CString;

    thread_local! {
        pub(super) static RELEASED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
        static RETURNED: Cell<usize> = const { Cell::new(0) };
        static SEEN_PARAMS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn strdup(s: &str) -> *mut c_char {
        let c = CString::new(s).unwrap();
        unsafe { libc::strdup(c.as_ptr()) }
    }

    /// Returns strdup(command + "|" + json) and remembers the pointer.
    unsafe extern "C" fn echo(command: *const c_char, json: *const c_char) -> *mut c_char {
        let command = CStr::from_ptr(command).to_string_lossy();
        let json = CStr::from_ptr(json).to_string_lossy();
        SEEN_PARAMS.with(|p| p.borrow_mut().push(json.to_string()));

        let ptr = strdup(&format!("{}|{}", command, json));
        RETURNED.with(|r| r.set(ptr as usize));
        ptr
    }

    unsafe extern "C" fn always_null(_: *const c_char, _: *const c_char) -> *mut c_char {
        std::ptr::null_mut()
    }

    fn call(dispatcher: Option<DispatchFn>, cmd: &CStr, params: Option<&CStr>) -> Outcome<Vec<u8>> {
        invoke_with(dispatcher, cmd, params, <[u8]>::to_vec)
    }

    #[test]
    fn test_echo_response() {
        let out = call(Some(echo), c"ping", Some(c"{\"x\":1}"));
        assert_eq!(out, Outcome::Response(b"ping|{\"x\":1}".to_vec()));
    }

    #[test]
    fn test_default_params() {
        SEEN_PARAMS.with(|p| p.borrow_mut().clear());

        assert_eq!(
            call(Some(echo), c"ping", None),
            Outcome::Response(b"ping|{}".to_vec())
        );
        assert_eq!(
            call(Some(echo), c"ping", Some(c"")),
            Outcome::Response(b"ping|{}".to_vec())
        );

        SEEN_PARAMS.with(|p| assert_eq!(*p.borrow(), vec!["{}", "{}"]));
    }

    #[test]
    fn test_params_or_default() {
        assert_eq!(params_or_default(None), c"{}");
        assert_eq!(params_or_default(Some(c"")), c"{}");
        assert_eq!(params_or_default(Some(c"[1]")), c"[1]");
    }

    #[test]
    fn test_null_dispatcher_result() {
        RELEASED.with(|r| r.borrow_mut().clear());

        assert_eq!(call(Some(always_null), c"x", None), Outcome::Failed);

        // Nothing to free
        RELEASED.with(|r| assert!(r.borrow().is_empty()));
    }

    #[test]
    fn test_not_initialised() {
        assert_eq!(call(None, c"x", None), Outcome::NotInitialised);
    }

    #[test]
    fn test_response_released_once() {
        RELEASED.with(|r| r.borrow_mut().clear());

        let out = call(Some(echo), c"ping", Some(c"[]"));
        assert_eq!(out, Outcome::Response(b"ping|[]".to_vec()));

        let returned = RETURNED.with(|r| r.get());
        RELEASED.with(|r| {
            let released = r.borrow();
            assert_eq!(released.iter().filter(|&&p| p == returned).count(), 1);
            assert_eq!(released.len(), 1);
        });
    }

    #[test]
    fn test_copy_sees_bytes_before_release() {
        RELEASED.with(|r| r.borrow_mut().clear());

        let out = invoke_with(Some(echo), c"len", None, |bytes| {
            // Still alive: not released yet
            RELEASED.with(|r| assert!(r.borrow().is_empty()));
            bytes.len()
        });
        assert_eq!(out, Outcome::Response("len|{}".len()));
    }

    #[test]
    fn test_call_traces_response_size() {
        use std::sync::{Arc, Mutex};
        use tracing_subscriber::fmt::MakeWriter;

        #[derive(Clone, Default)]
        struct Buf(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Buf {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> MakeWriter<'a> for Buf {
            type Writer = Buf;
            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let buf = Buf::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(buf.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            call(Some(echo), c"ping", Some(c"[1]"));
        });

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        // "ping|[1]"
        assert!(out.contains("bytes=8"), "{}", out);
        assert!(out.contains("dispatcher responded"), "{}", out);
    }

    #[test]
    fn test_prepare_keeps_first_dispatcher() {
        prepare(echo);
        prepare(always_null);

        assert!(is_prepared());
        let out = invoke(c"ping", None, <[u8]>::to_vec);
        assert_eq!(out, Outcome::Response(b"ping|{}".to_vec()));
    }
}
