//! Configuration loaded from TOML. Every field has a default, so an empty
//! or missing file is valid.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV: &str = "CXXDOC_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub comments: CommentConfig,
    pub organize: OrganizeConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Marker after the comment opener that starts a named group
    pub group_marker: String,
    /// Markers after the comment opener that document the preceding declaration
    pub trailing_markers: Vec<String>,
    /// Ignore comments without a doc opener (`///`, `//!`, `/**`, `/*!`)
    pub doc_only: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Turn `public:`/`protected:`/`private:` into explicit groups
    pub access_sections: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads for per-pass analysis (0 = rayon default)
    pub threads: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            group_marker: "!!".to_string(),
            trailing_markers: vec!["<".to_string(), "!<".to_string()],
            doc_only: false,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from `CXXDOC_CONFIG`, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(&p).map_err(|source| Error::Read {
                    path: p.clone(),
                    source,
                })?;
                Self::parse(&content)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
