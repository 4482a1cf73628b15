//! Test helpers shared by the embed test binaries.
//!
//! PHP starts once per process and NTS builds must be driven from a single
//! thread, so each binary runs all of its scenarios inside one `#[test]`.

use std::io::Write;

use phptoro::sapi::{self, ScriptOutput};
use tempfile::NamedTempFile;

/// Write `source` to a temporary `.php` file and execute it.
pub fn run_php(source: &str) -> ScriptOutput {
    let mut file = tempfile::Builder::new()
        .suffix(".php")
        .tempfile()
        .expect("Failed to create script file");
    file.write_all(source.as_bytes())
        .expect("Failed to write script");
    file.flush().expect("Failed to flush script");

    execute(&file)
}

fn execute(file: &NamedTempFile) -> ScriptOutput {
    sapi::execute_file(file.path()).expect("Script execution failed")
}

/// Assert the script output contains `needle`.
#[allow(dead_code)]
pub fn assert_body_contains(output: &ScriptOutput, needle: &str) {
    let body = output.body_string();
    assert!(
        body.contains(needle),
        "Expected body to contain {:?}, got: {}",
        needle,
        body
    );
}

/// Assert the script emitted no diagnostics.
#[allow(dead_code)]
pub fn assert_no_diagnostics(output: &ScriptOutput) {
    assert!(
        output.diagnostics.is_empty(),
        "Expected no diagnostics, got: {:?}",
        output.diagnostics
    );
}
