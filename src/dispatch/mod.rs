//! Host-side command routing for `phptoro()` calls.
//!
//! A [`Router`] maps command names to handlers over `serde_json::Value`.
//! [`install`] publishes it process-wide and returns the C-ABI dispatcher to
//! hand to `bridge::prepare()`:
//!
//! ```rust,ignore
//! use phptoro::dispatch::{self, Router};
//! use serde_json::json;
//!
//! let router = Router::new()
//!     .route("app.version", |_| Ok(json!({ "version": phptoro::PKG_VERSION })));
//!
//! phptoro::bridge::prepare(dispatch::install(router));
//! ```
//!
//! Responses are allocated with `malloc`, matching the bridge's `free`.

mod error;

use std::collections::HashMap;
use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::bridge::DispatchFn;

pub use error::DispatchError;

/// Command handler.
pub type Handler = Box<dyn Fn(Value) -> Result<Value, DispatchError> + Send + Sync>;

/// Process-wide router behind [`dispatch`].
static ROUTER: OnceCell<Router> = OnceCell::new();

/// Command name to handler table.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A later registration for the same name wins.
    pub fn route<F>(mut self, command: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Value, DispatchError> + Send + Sync + 'static,
    {
        self.routes.insert(command.into(), Box::new(handler));
        self
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run one command: parse params, call the handler, serialize the result.
    pub fn handle(&self, command: &str, json_args: &str) -> Result<String, DispatchError> {
        let handler = self
            .routes
            .get(command)
            .ok_or_else(|| DispatchError::UnknownCommand(command.to_string()))?;

        let args: Value =
            serde_json::from_str(json_args).map_err(|e| DispatchError::InvalidArgs {
                command: command.to_string(),
                error: e.to_string(),
            })?;

        let result = handler(args)?;

        serde_json::to_string(&result).map_err(|e| DispatchError::Response(e.to_string()))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("commands", &self.commands())
            .finish()
    }
}

/// Publish `router` process-wide and return the dispatcher for
/// `bridge::prepare()`. The first router wins.
pub fn install(router: Router) -> DispatchFn {
    let commands = router.commands().len();
    if ROUTER.set(router).is_err() {
        tracing::warn!("command router already installed, keeping the first one");
    } else {
        tracing::debug!(commands, "command router installed");
    }
    dispatch
}

/// C-ABI dispatcher over the installed [`Router`].
///
/// Returns a `malloc`'d JSON string, or NULL on any failure. Never unwinds.
pub unsafe extern "C" fn dispatch(command: *const c_char, json_args: *const c_char) -> *mut c_char {
    let Some(router) = ROUTER.get() else {
        tracing::warn!("phptoro dispatch without an installed router");
        return ptr::null_mut();
    };

    if command.is_null() {
        return ptr::null_mut();
    }

    let (command, args) = match (
        CStr::from_ptr(command).to_str(),
        if json_args.is_null() {
            Ok("{}")
        } else {
            CStr::from_ptr(json_args).to_str()
        },
    ) {
        (Ok(c), Ok(a)) => (c, a),
        _ => {
            tracing::warn!(error = %DispatchError::InvalidUtf8, "phptoro dispatch failed");
            return ptr::null_mut();
        }
    };

    let result = catch_unwind(AssertUnwindSafe(|| router.handle(command, args)))
        .unwrap_or_else(|_| Err(DispatchError::Panicked(command.to_string())));

    match result {
        Ok(response) => {
            let out = into_c_string(&response);
            if out.is_null() {
                tracing::warn!(command, "response contains a nul byte");
            }
            out
        }
        Err(e) => {
            tracing::warn!(command, error = %e, "phptoro dispatch failed");
            ptr::null_mut()
        }
    }
}

/// Copy `s` into a `malloc`'d nul-terminated buffer.
///
/// Returns NULL if `s` contains a nul byte or allocation fails. The caller
/// owns the buffer and must release it with `free(3)`.
pub fn into_c_string(s: &str) -> *mut c_char {
    let bytes = s.as_bytes();
    if bytes.contains(&0) {
        return ptr::null_mut();
    }

    unsafe {
        let buf = libc::malloc(bytes.len() + 1) as *mut u8;
        if buf.is_null() {
            return ptr::null_mut();
        }
        ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        *buf.add(bytes.len()) = 0;
        buf as *mut c_char
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{self, Outcome};
    use serde_json::json;

    fn router() -> Router {
        Router::new()
            .route("echo", Ok)
            .route("sum", |args| {
                let a = args["a"].as_i64().unwrap_or(0);
                let b = args["b"].as_i64().unwrap_or(0);
                Ok(json!({ "sum": a + b }))
            })
            .route("fail", |_| Err(DispatchError::failed("nope")))
            .route("boom", |_| panic!("handler exploded"))
    }

    #[test]
    fn test_handle_ok() {
        let r = router();
        assert_eq!(r.handle("echo", r#"{"x":1}"#).unwrap(), r#"{"x":1}"#);
        assert_eq!(r.handle("sum", r#"{"a":2,"b":40}"#).unwrap(), r#"{"sum":42}"#);
    }

    #[test]
    fn test_handle_errors() {
        let r = router();
        assert!(matches!(
            r.handle("missing", "{}"),
            Err(DispatchError::UnknownCommand(c)) if c == "missing"
        ));
        assert!(matches!(
            r.handle("echo", "{not json"),
            Err(DispatchError::InvalidArgs { .. })
        ));
        assert!(matches!(r.handle("fail", "{}"), Err(DispatchError::Failed(m)) if m == "nope"));
    }

    #[test]
    fn test_commands_sorted() {
        assert_eq!(router().commands(), vec!["boom", "echo", "fail", "sum"]);
    }

    #[test]
    fn test_into_c_string() {
        let p = into_c_string("héllo");
        assert!(!p.is_null());
        unsafe {
            assert_eq!(CStr::from_ptr(p).to_str().unwrap(), "héllo");
            libc::free(p.cast());
        }

        assert!(into_c_string("a\0b").is_null());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            DispatchError::UnknownCommand("x.y".into()).to_string(),
            "unknown command: x.y"
        );
        assert_eq!(DispatchError::failed("disk full").to_string(), "disk full");
    }

    // The only test that touches the process-wide router
    #[test]
    fn test_installed_dispatcher_through_bridge() {
        let dispatcher = install(router());

        let call = |cmd: &CStr, params: Option<&CStr>| {
            bridge::invoke_with(Some(dispatcher), cmd, params, |b| {
                String::from_utf8_lossy(b).into_owned()
            })
        };

        assert_eq!(
            call(c"sum", Some(c"{\"a\":1,\"b\":2}")),
            Outcome::Response(r#"{"sum":3}"#.to_string())
        );
        // Missing params reach the handler as {}
        assert_eq!(call(c"echo", None), Outcome::Response("{}".to_string()));

        assert_eq!(call(c"nope", None), Outcome::Failed);
        assert_eq!(call(c"fail", None), Outcome::Failed);
        assert_eq!(call(c"echo", Some(c"[1,")), Outcome::Failed);
        assert_eq!(call(c"boom", None), Outcome::Failed);
    }
}
