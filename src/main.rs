use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use tracing::{error, info, warn};

use phptoro::dispatch::{self, DispatchError, Router};
use phptoro::rebrand::{self, Installed};
use phptoro::{bridge, logging, profile, sapi, Config, PKG_VERSION};

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("phptoro: {}", e);
            return ExitCode::from(2);
        }
    };

    logging::init(&config.logging);
    config.log_summary();

    let script = config.embed.resolve_script(std::env::args_os().nth(1).map(PathBuf::from));
    let Some(script) = script else {
        eprintln!("usage: phptoro <script.php>  (or set PHPTORO_SCRIPT)");
        return ExitCode::from(2);
    };

    match run(&config, &script) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "phptoro failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, script: &std::path::Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    bridge::prepare(dispatch::install(router()));

    sapi::init()?;
    profile::log_summary();

    if config.embed.branding {
        match rebrand::install() {
            Installed::Replaced => info!("phpinfo branding installed"),
            other => warn!(?other, "phpinfo branding not installed"),
        }
    }

    let result = sapi::execute_file(script);
    sapi::shutdown();
    let output = result?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output.body)?;
    stdout.flush()?;

    if !output.diagnostics.is_empty() {
        info!(count = output.diagnostics.len(), "script emitted diagnostics");
    }

    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    sapi: &'static str,
}

/// Commands available to scripts run by the CLI.
fn router() -> Router {
    Router::new()
        .route("toro.version", |_| {
            let info = VersionInfo {
                name: "phptoro",
                version: PKG_VERSION,
                sapi: sapi::name(),
            };
            serde_json::to_value(info).map_err(|e| DispatchError::failed(e.to_string()))
        })
        .route("toro.echo", Ok)
}
