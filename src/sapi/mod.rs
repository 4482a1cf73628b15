//! Embedded PHP SAPI implemented in Rust.
//!
//! This is the host harness the bridge plugs into: it owns the interpreter
//! lifecycle and runs scripts, capturing their output in memory.
//!
//! # Usage
//!
//! ```rust,ignore
//! use phptoro::{bridge, rebrand, sapi};
//!
//! bridge::prepare(dispatcher);      // before startup
//! sapi::init()?;                    // start PHP
//! rebrand::install();               // after startup, before any script
//!
//! let out = sapi::execute_file(Path::new("app.php"))?;
//! println!("{}", out.body_string());
//!
//! sapi::shutdown();
//! ```
//!
//! PHP is started once per process and, for NTS builds, must only be
//! driven from one thread.

pub mod callbacks;
mod error;
pub mod ffi;
pub mod module;
pub mod run;

// Re-exports for convenience
pub use error::SapiError;
pub use module::{init, is_initialized, name, shutdown};
pub use run::{execute_file, ScriptOutput};
