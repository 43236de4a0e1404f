use serde::Deserialize;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConversionConfig;

/// The full config file
#[derive(Debug, Deserialize)]
pub struct ProjectManifest {
    /// The HTML document to convert, relative to the manifest.
    pub html: PathBuf,

    /// Glob patterns for images and stylesheets, relative to the manifest.
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Where to write the JSON warning report, if anywhere.
    #[serde(default)]
    pub report: Option<PathBuf>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

fn default_output() -> PathBuf {
    PathBuf::from("output.html")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read manifest {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub fn load_project_manifest(path: impl AsRef<Path>) -> Result<ProjectManifest, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| {
        ConfigError::Io { path: path.to_path_buf(), source }
    })?;
    toml::from_str(&text).map_err(|source| {
        ConfigError::Toml { path: path.to_path_buf(), source }
    })
}

impl ProjectManifest {
    /// Rebases every relative path onto `manifest_dir`.
    pub fn rooted_at(mut self, manifest_dir: impl AsRef<Path>) -> Self {
        let manifest_dir = manifest_dir.as_ref();
        self.html = manifest_dir.join(&self.html);
        self.output = manifest_dir.join(&self.output);
        self.report = self.report.map(|report| manifest_dir.join(report));
        self.resources = self.resources
            .iter()
            .map(|pattern| {
                if Path::new(pattern).is_absolute() {
                    return pattern.clone()
                }
                let escaped = glob::Pattern::escape(&manifest_dir.to_string_lossy());
                format!("{}/{}", escaped.trim_end_matches('/'), pattern)
            })
            .collect();
        self
    }
}
