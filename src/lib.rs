//! phptoro - embed PHP in a Rust host and let scripts call back into it.
//!
//! Scripts get one extra built-in, `phptoro(string $command, ?string
//! $params_json = '{}'): string|false`, which forwards the call to a
//! host-registered dispatcher. The interpreter also starts with a fixed
//! INI profile and a rebranded `phpinfo()`.
//!
//! # Modules
//!
//! - [`bridge`] - dispatcher registration and the `phptoro()` built-in
//! - [`profile`] - startup INI directives
//! - [`rebrand`] - `phpinfo()` stylesheet injection
//! - [`dispatch`] - JSON command router that implements a dispatcher
//! - `sapi` - minimal embed SAPI that starts PHP and runs scripts (`php` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use phptoro::dispatch::{self, Router};
//! use phptoro::{bridge, rebrand, sapi};
//! use serde_json::json;
//!
//! let router = Router::new().route("app.ping", |_| Ok(json!("pong")));
//!
//! bridge::prepare(dispatch::install(router));
//! sapi::init()?;
//! rebrand::install();
//!
//! let out = sapi::execute_file("index.php".as_ref())?;
//! print!("{}", out.body_string());
//! sapi::shutdown();
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod profile;
pub mod rebrand;

#[cfg(feature = "php")]
pub mod sapi;

// Re-exports for convenience
pub use config::Config;
