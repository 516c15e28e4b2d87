//! Configuration for notegarden.
//!
//! The project config lives at `<project>/garden.toml`, falling back to
//! `~/.notegarden/garden.toml`. It is read once per process and frozen into a
//! [`ContentSourceConfig`] before any node is processed; build components only
//! ever see that frozen value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GardenError, Result};
use crate::types::ActiveSources;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "garden.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".notegarden";

// ---------------------------------------------------------------------------
// Config structs (matching garden.toml schema)
// ---------------------------------------------------------------------------

/// Top-level config file, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GardenFile {
    /// Content sources and routing.
    #[serde(default)]
    pub garden: GardenSection,

    /// Build-environment paths.
    #[serde(default)]
    pub build: BuildPathsConfig,
}

/// `[garden]` section: the content-source surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GardenSection {
    /// URL prefix prepended to every slug.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Local notes directory; also the origin label local nodes carry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,

    /// Remote knowledge-graph endpoint identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_graph: Option<String>,

    /// Slug of the note that is also published at `base_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_note: Option<String>,
}

impl Default for GardenSection {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            content_path: None,
            remote_graph: None,
            root_note: None,
        }
    }
}

fn default_base_path() -> String {
    "/".into()
}

/// `[build]` section. Relative paths resolve against the project directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPathsConfig {
    /// Directory holding the canonical templates and fragments.
    #[serde(default = "default_theme_dir")]
    pub theme_dir: PathBuf,

    /// Generated-sources area the provisioner reconciles.
    #[serde(default = "default_generated_dir")]
    pub generated_dir: PathBuf,

    /// libSQL node store file.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Where the route manifest is written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for BuildPathsConfig {
    fn default() -> Self {
        Self {
            theme_dir: default_theme_dir(),
            generated_dir: default_generated_dir(),
            store_path: default_store_path(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_theme_dir() -> PathBuf {
    "theme".into()
}
fn default_generated_dir() -> PathBuf {
    ".garden/generated".into()
}
fn default_store_path() -> PathBuf {
    ".garden/store.db".into()
}
fn default_output_dir() -> PathBuf {
    "public".into()
}

impl BuildPathsConfig {
    /// Resolve every relative path against `project_dir`.
    pub fn resolve(&self, project_dir: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                project_dir.join(p)
            }
        };
        Self {
            theme_dir: join(&self.theme_dir),
            generated_dir: join(&self.generated_dir),
            store_path: join(&self.store_path),
            output_dir: join(&self.output_dir),
        }
    }
}

// ---------------------------------------------------------------------------
// Frozen content-source config
// ---------------------------------------------------------------------------

/// Immutable content-source configuration, built once per process.
///
/// Fields are private so nothing can mutate it after [`ContentSourceConfig::freeze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSourceConfig {
    base_path: String,
    local_content_dir: Option<String>,
    remote_graph_endpoint: Option<String>,
    root_note_slug: Option<String>,
}

impl ContentSourceConfig {
    /// Freeze the `[garden]` section. Empty strings count as unset and the
    /// base path is normalized to a leading `/` without a trailing one.
    pub fn freeze(section: &GardenSection) -> Result<Self> {
        let base_path = normalize_base_path(&section.base_path)?;
        let config = Self {
            base_path,
            local_content_dir: non_empty(section.content_path.as_deref()),
            remote_graph_endpoint: non_empty(section.remote_graph.as_deref()),
            root_note_slug: non_empty(section.root_note.as_deref()),
        };

        tracing::debug!(
            base_path = %config.base_path,
            local = config.local_content_dir.is_some(),
            remote = config.remote_graph_endpoint.is_some(),
            root_note = ?config.root_note_slug,
            "content source config frozen"
        );

        Ok(config)
    }

    /// Builder-style constructor used by tests and embedders.
    pub fn new(base_path: &str) -> Result<Self> {
        Self::freeze(&GardenSection {
            base_path: base_path.into(),
            ..GardenSection::default()
        })
    }

    /// Enable the local-file source.
    pub fn with_local_content_dir(mut self, dir: impl Into<String>) -> Self {
        let dir: String = dir.into();
        self.local_content_dir = non_empty(Some(dir.as_str()));
        self
    }

    /// Enable the remote-graph source.
    pub fn with_remote_graph_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        self.remote_graph_endpoint = non_empty(Some(endpoint.as_str()));
        self
    }

    /// Set the root-note slug.
    pub fn with_root_note_slug(mut self, slug: impl Into<String>) -> Self {
        let slug: String = slug.into();
        self.root_note_slug = non_empty(Some(slug.as_str()));
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn local_content_dir(&self) -> Option<&str> {
        self.local_content_dir.as_deref()
    }

    pub fn remote_graph_endpoint(&self) -> Option<&str> {
        self.remote_graph_endpoint.as_deref()
    }

    pub fn root_note_slug(&self) -> Option<&str> {
        self.root_note_slug.as_deref()
    }

    /// The one predicate that gates both adapters and artifact provisioning.
    pub fn active_sources(&self) -> ActiveSources {
        ActiveSources {
            local: self.local_content_dir.is_some(),
            remote: self.remote_graph_endpoint.is_some(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn normalize_base_path(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.contains(char::is_whitespace) {
        return Err(GardenError::config(format!(
            "base_path must not contain whitespace: {raw:?}"
        )));
    }

    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    Ok(format!("/{}", segments.join("/")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.notegarden/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| GardenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Default config path for a project (`<project>/garden.toml`).
pub fn default_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}

/// Load the config for a project: `<project>/garden.toml`, then the user
/// config, then defaults.
pub fn load_config(project_dir: &Path) -> Result<GardenFile> {
    let project_path = default_config_path(project_dir);
    if project_path.exists() {
        return load_config_from(&project_path);
    }

    let user_path = config_dir()?.join(CONFIG_FILE_NAME);
    if user_path.exists() {
        tracing::debug!(path = ?user_path, "using user config");
        return load_config_from(&user_path);
    }

    tracing::debug!(path = ?project_path, "config file not found, using defaults");
    Ok(GardenFile::default())
}

/// Load the config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<GardenFile> {
    let content = std::fs::read_to_string(path).map_err(|e| GardenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| GardenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `path`, creating parent directories.
/// Refuses to overwrite an existing file.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(GardenError::config(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| GardenError::io(parent, e))?;
    }

    let mut config = GardenFile::default();
    config.garden.content_path = Some("content".into());
    let content = toml::to_string_pretty(&config).map_err(|e| GardenError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| GardenError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}
