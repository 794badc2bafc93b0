use anyhow::Result;
use std::{env, path::PathBuf};

#[derive(Clone)]
pub struct Paths {
    pub config: PathBuf,
    pub snapshots: PathBuf,
}

pub fn cngit_home() -> Result<PathBuf> {
    let xdg = env::var_os("XDG_CONFIG_HOME");
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    Ok(base.join(".cngit"))
}

pub fn paths() -> Result<Paths> {
    let home = cngit_home()?;
    Ok(Paths {
        config: home.join("config.toml"),
        snapshots: home.join("snapshots"),
    })
}
