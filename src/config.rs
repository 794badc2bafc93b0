use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::paths::paths;

/// Configuration loaded from `config.toml` under the cngit home.
///
/// Every key is optional and the file itself may be absent, in which case
/// all defaults apply.
///
/// Example TOML:
/// ```toml
/// git_exe   = "/usr/local/bin/git"
/// nodes_dir = "/opt/app/custom_nodes"
/// app_dir   = "/opt/app"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Path to an external git executable. When set, cngit shells out to
    /// this binary instead of using the in-process git library.
    #[serde(default)]
    pub git_exe: Option<String>,
    /// Directory that holds custom node checkouts. Used by `apply-snapshot`
    /// when `--nodes-dir` is not given.
    #[serde(default)]
    pub nodes_dir: Option<PathBuf>,
    /// Application repository checkout. Used by `apply-snapshot` when
    /// `--app-dir` is not given.
    #[serde(default)]
    pub app_dir: Option<PathBuf>,
}

/// Load and parse `config.toml` into a [`Config`] structure.
///
/// A missing file is not an error: it yields the default configuration.
///
/// # Errors
/// - Returns an error if the file exists but cannot be read.
/// - Returns an error if parsing the TOML fails.
pub fn load_config() -> Result<Config> {
    let p = paths()?;
    let txt = match fs::read_to_string(&p.config) {
        Ok(txt) => txt,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", p.config.display()));
        }
    };
    let cfg: Config = toml::from_str(&txt).context("failed to parse config.toml")?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let cfg: Config = toml::from_str(
            r#"
            git_exe   = "/usr/bin/git"
            nodes_dir = "/opt/app/custom_nodes"
            app_dir   = "/opt/app"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.git_exe.as_deref(), Some("/usr/bin/git"));
        assert_eq!(cfg.nodes_dir.unwrap(), PathBuf::from("/opt/app/custom_nodes"));
        assert_eq!(cfg.app_dir.unwrap(), PathBuf::from("/opt/app"));
    }

    #[test]
    fn empty_config_yields_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert!(cfg.git_exe.is_none());
        assert!(cfg.nodes_dir.is_none());
        assert!(cfg.app_dir.is_none());
    }
}
