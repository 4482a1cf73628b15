//! Embedded interpreter configuration.

use std::path::PathBuf;

use super::parse::{env_opt, env_switch};
use super::ConfigError;

/// What the `phptoro` binary runs, loaded from environment.
#[derive(Clone, Debug)]
pub struct EmbedConfig {
    /// Script to execute when no path argument is given (PHPTORO_SCRIPT).
    pub script: Option<PathBuf>,
    /// Replace `phpinfo()` with the branded variant (PHPINFO_BRANDING).
    pub branding: bool,
}

impl EmbedConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            script: env_opt("PHPTORO_SCRIPT").map(PathBuf::from),
            branding: env_switch("PHPINFO_BRANDING", true)?,
        })
    }

    /// Command-line path wins over PHPTORO_SCRIPT.
    pub fn resolve_script(&self, arg: Option<PathBuf>) -> Option<PathBuf> {
        arg.or_else(|| self.script.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_script() {
        let config = EmbedConfig {
            script: Some(PathBuf::from("/srv/app/index.php")),
            branding: true,
        };

        assert_eq!(
            config.resolve_script(Some(PathBuf::from("info.php"))),
            Some(PathBuf::from("info.php"))
        );
        assert_eq!(
            config.resolve_script(None),
            Some(PathBuf::from("/srv/app/index.php"))
        );

        let config = EmbedConfig {
            script: None,
            branding: false,
        };
        assert_eq!(config.resolve_script(None), None);
    }
}
