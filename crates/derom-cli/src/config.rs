//! User-level configuration: locating profiles by name.
//!
//! `deromtool` accepts either a direct path to a profile or a schema name
//! declared in the user config (`./.derom.yml`, then
//! `~/.config/derom/config.yml`). The config's `schemas` entry is a
//! directory to scan for `*.yml` files, or an explicit list of paths;
//! either way profiles are addressed by file stem.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("YAML parse error in {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("no profile named {0:?} (and no such file)")]
    UnknownProfile(String),
}

#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    schemas: Option<Schemas>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Schemas {
    Path(String),
    Files(Vec<String>),
}

#[derive(Debug, Default)]
pub struct Config {
    schemas: BTreeMap<String, PathBuf>,
}

impl Config {
    /// Load the first user config found on the search path. A missing
    /// config is not an error: profiles can always be given as paths.
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::from_path(&path);
            }
        }
        Ok(Config::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".derom.yml")];
        if let Ok(home) = std::env::var("HOME") {
            paths.push(
                Path::new(&home)
                    .join(".config")
                    .join("derom")
                    .join("config.yml"),
            );
        }
        paths
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let user: UserConfig = serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut schemas = BTreeMap::new();
        match user.schemas {
            None => {}
            Some(Schemas::Path(p)) => {
                let p = PathBuf::from(p);
                if p.is_dir() {
                    scan_dir(&p, &mut schemas);
                } else {
                    insert_by_stem(p, &mut schemas);
                }
            }
            Some(Schemas::Files(files)) => {
                for file in files {
                    insert_by_stem(PathBuf::from(file), &mut schemas);
                }
            }
        }
        Ok(Config { schemas })
    }

    /// Resolve a profile argument: an existing path wins, otherwise the
    /// name is looked up among the configured schemas.
    pub fn resolve(&self, name_or_path: &str) -> Result<PathBuf, ConfigError> {
        let direct = PathBuf::from(name_or_path);
        if direct.exists() {
            return Ok(direct);
        }
        self.schemas
            .get(name_or_path)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProfile(name_or_path.to_string()))
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}

fn scan_dir(dir: &Path, schemas: &mut BTreeMap<String, PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml")
        {
            insert_by_stem(path, schemas);
        }
    }
}

fn insert_by_stem(path: PathBuf, schemas: &mut BTreeMap<String, PathBuf>) {
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) {
        schemas.insert(stem, path);
    }
}
