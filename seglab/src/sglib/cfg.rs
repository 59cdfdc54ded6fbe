use crate::file_util::DEFAULT_HOMEDIR;
use seglab_domain::{to_sl, SlResult};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::info;

const CFG_DEFAULT: &str = r#"
    db_filename = "seglab.db"
    vertex_size = 8.0
    closing_tolerance = 10.0
    # logfolder = "some/folder"
    "#;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Cfg {
    /// database file inside the home folder
    pub db_filename: String,
    /// side of the square vertex handles in scene coordinates
    pub vertex_size: f64,
    /// side of the square around a polygon's first point that closes it
    pub closing_tolerance: f64,
    logfolder: Option<String>,
}

impl Cfg {
    pub fn logfolder(&self) -> PathBuf {
        self.logfolder
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| DEFAULT_HOMEDIR.join("logs"))
    }
    pub fn db_path(&self) -> PathBuf {
        DEFAULT_HOMEDIR.join(&self.db_filename)
    }
}

pub fn get_default_cfg() -> Cfg {
    toml::from_str(CFG_DEFAULT).expect("default config broken")
}

pub fn get_cfg_path() -> PathBuf {
    DEFAULT_HOMEDIR.join("sl_cfg.toml")
}

pub fn read_cfg() -> SlResult<Cfg> {
    let cfg_path = get_cfg_path();
    if cfg_path.exists() {
        let toml_str = fs::read_to_string(&cfg_path).map_err(to_sl)?;
        toml::from_str(&toml_str).map_err(to_sl)
    } else {
        info!("no config file at {cfg_path:?}, using defaults");
        Ok(get_default_cfg())
    }
}

pub fn write_cfg(cfg: &Cfg) -> SlResult<()> {
    let cfg_path = get_cfg_path();
    if let Some(parent) = cfg_path.parent() {
        fs::create_dir_all(parent).map_err(to_sl)?;
    }
    let toml_str = toml::to_string_pretty(cfg).map_err(to_sl)?;
    fs::write(&cfg_path, toml_str).map_err(to_sl)
}

#[test]
fn test_default_cfg() {
    let cfg = get_default_cfg();
    assert_eq!(cfg.db_filename, "seglab.db");
    assert_eq!(cfg.vertex_size, 8.0);
    assert_eq!(cfg.closing_tolerance, 10.0);
    assert_eq!(cfg.logfolder(), DEFAULT_HOMEDIR.join("logs"));
}
