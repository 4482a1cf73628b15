use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=PHP_CONFIG");

    // Only link PHP when the "php" feature is enabled
    if env::var("CARGO_FEATURE_PHP").is_err() {
        return;
    }

    // Try php-config first (official images), then php-config84 (Alpine)
    let php_config = env::var("PHP_CONFIG").unwrap_or_else(|_| {
        if Command::new("php-config").arg("--version").output().is_ok() {
            "php-config".to_string()
        } else {
            "php-config84".to_string()
        }
    });

    let ldflags = Command::new(&php_config)
        .arg("--ldflags")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    let libs = Command::new(&php_config)
        .arg("--libs")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    // php-config --prefix gives us <prefix>/lib for the embed library
    let prefix = Command::new(&php_config)
        .arg("--prefix")
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    for flag in ldflags.split_whitespace() {
        if let Some(path) = flag.strip_prefix("-L") {
            println!("cargo:rustc-link-search=native={}", path);
        }
    }

    if !prefix.is_empty() {
        println!("cargo:rustc-link-search=native={}/lib", prefix);
    }

    // Common paths for different PHP installations
    println!("cargo:rustc-link-search=native=/usr/lib");
    println!("cargo:rustc-link-search=native=/lib");
    println!("cargo:rustc-link-search=native=/usr/lib/php84");
    println!("cargo:rustc-link-search=native=/usr/local/lib");

    // libphp.so from --enable-embed
    println!("cargo:rustc-link-lib=dylib=php");

    for flag in libs.split_whitespace() {
        if let Some(lib) = flag.strip_prefix("-l") {
            if lib != "php" {
                println!("cargo:rustc-link-lib={}", lib);
            }
        }
    }
}
