//! Runtime configuration: where the database, daemon socket and logs live.
//!
//! Resolution order: `ATELIER_HOME` env var, then `~/.atelier`. An optional
//! `config.toml` inside the data dir may override individual paths.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AtelierError, Result};

/// Resolved runtime paths.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub socket_path: PathBuf,
    pub log_dir: PathBuf,
}

/// Optional overrides read from `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    socket_path: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

/// Resolve the atelier data directory.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("ATELIER_HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|h| h.join(".atelier"))
        .ok_or_else(|| AtelierError::InvalidArgument("cannot determine home directory".into()))
}

/// Load the configuration, applying `config.toml` overrides when present.
pub fn load() -> Result<Config> {
    let dir = data_dir()?;
    load_from(&dir)
}

fn load_from(dir: &Path) -> Result<Config> {
    let file = dir.join("config.toml");
    let overrides: ConfigFile = if file.exists() {
        let raw = std::fs::read_to_string(&file)?;
        toml::from_str(&raw)
            .map_err(|e| AtelierError::InvalidArgument(format!("config.toml: {}", e)))?
    } else {
        ConfigFile::default()
    };

    Ok(Config {
        data_dir: dir.to_path_buf(),
        db_path: overrides.db_path.unwrap_or_else(|| dir.join("atelier.db")),
        socket_path: overrides
            .socket_path
            .unwrap_or_else(|| dir.join("atelierd.sock")),
        log_dir: overrides.log_dir.unwrap_or_else(|| dir.join("logs")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let tmp = std::env::temp_dir().join("atelier-config-test-defaults");
        let cfg = load_from(&tmp).unwrap();
        assert_eq!(cfg.db_path, tmp.join("atelier.db"));
        assert_eq!(cfg.socket_path, tmp.join("atelierd.sock"));
        assert_eq!(cfg.log_dir, tmp.join("logs"));
    }

    #[test]
    fn test_config_file_overrides_db_path() {
        let tmp = std::env::temp_dir().join("atelier-config-test-overrides");
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join("config.toml"), "db_path = \"/tmp/other.db\"\n").unwrap();
        let cfg = load_from(&tmp).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(cfg.log_dir, tmp.join("logs"));
    }
}
