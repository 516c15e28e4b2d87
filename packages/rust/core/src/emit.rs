//! Page-creation boundary.
//!
//! The pipeline hands each route, together with the generated template it is
//! bound to, to a [`PageSink`]. [`RouteManifestWriter`] is the sink used by
//! the CLI: it collects pages and writes `routes.json` for the rendering layer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use notegarden_artifacts::ArtifactKind;
use notegarden_shared::{BuildId, GardenError, NodeKind, PageRoute, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::routes::AliasOutcome;

/// Current version of the `routes.json` layout.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// File name of the route manifest inside the output directory.
pub const MANIFEST_FILE: &str = "routes.json";

/// Site-wide values published next to the routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteRecord {
    pub base_path: String,
}

/// A generated artifact present at the end of the build.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub sha256: String,
}

/// Everything a sink may need once all pages were created.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub build_id: BuildId,
    pub generated_at: DateTime<Utc>,
    pub site: SiteRecord,
    pub alias: AliasOutcome,
    pub artifacts: Vec<ArtifactRecord>,
}

/// Receives one call per route, then a single `finish` if the build succeeded.
pub trait PageSink {
    /// Create the page for `route`, rendered with the template at `template`.
    fn create_page(&mut self, route: &PageRoute, template: &Path) -> Result<()>;

    /// Called exactly once, after every page was created.
    fn finish(&mut self, _summary: &BuildSummary) -> Result<()> {
        Ok(())
    }
}

/// One page entry in `routes.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub path: String,
    pub template_kind: NodeKind,
    pub template: PathBuf,
    pub context_id: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_alias: bool,
}

#[derive(Serialize)]
struct RouteManifest<'a> {
    schema_version: u32,
    #[serde(flatten)]
    summary: &'a BuildSummary,
    page_count: usize,
    pages: &'a [PageRecord],
}

/// Collects pages in memory and writes them as `routes.json` on finish.
#[derive(Debug)]
pub struct RouteManifestWriter {
    output_dir: PathBuf,
    pages: Vec<PageRecord>,
}

impl RouteManifestWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            pages: Vec::new(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }
}

impl PageSink for RouteManifestWriter {
    fn create_page(&mut self, route: &PageRoute, template: &Path) -> Result<()> {
        debug!(path = %route.path, kind = %route.template_kind, "page created");
        self.pages.push(PageRecord {
            path: route.path.clone(),
            template_kind: route.template_kind,
            template: template.to_path_buf(),
            context_id: route.context_id.clone(),
            is_alias: route.is_alias,
        });
        Ok(())
    }

    #[instrument(skip_all, fields(build_id = %summary.build_id, pages = self.pages.len()))]
    fn finish(&mut self, summary: &BuildSummary) -> Result<()> {
        let manifest = RouteManifest {
            schema_version: MANIFEST_SCHEMA_VERSION,
            summary,
            page_count: self.pages.len(),
            pages: &self.pages,
        };
        let path = self.manifest_path();
        write_json_atomic(&path, &manifest)?;
        info!(path = %path.display(), "route manifest written");
        Ok(())
    }
}

/// Write pretty-printed JSON through a temp sibling and rename.
fn write_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| GardenError::validation(format!("JSON serialization failed: {e}")))?;

    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| GardenError::io(dir, e))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{filename}.tmp"));
    std::fs::write(&temp, json).map_err(|e| GardenError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| GardenError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("ng-emit-{}", uuid::Uuid::now_v7()))
    }

    fn summary() -> BuildSummary {
        BuildSummary {
            build_id: BuildId::new(),
            generated_at: Utc::now(),
            site: SiteRecord {
                base_path: "/garden".into(),
            },
            alias: AliasOutcome::NotConfigured,
            artifacts: vec![ArtifactRecord {
                kind: ArtifactKind::LocalFileTemplate,
                path: "templates/local-file.js".into(),
                sha256: "ab".repeat(32),
            }],
        }
    }

    #[test]
    fn manifest_written_only_on_finish() {
        let tmp = temp_dir();
        let mut writer = RouteManifestWriter::new(&tmp);
        let route = PageRoute {
            path: "/garden/a".into(),
            template_kind: NodeKind::LocalFile,
            context_id: "f1".into(),
            is_alias: false,
        };
        writer
            .create_page(&route, Path::new("templates/local-file.js"))
            .unwrap();
        assert!(!writer.manifest_path().exists());

        writer.finish(&summary()).unwrap();
        let raw = std::fs::read_to_string(writer.manifest_path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["site"]["base_path"], "/garden");
        assert_eq!(json["page_count"], 1);
        assert_eq!(json["pages"][0]["template_kind"], "local-file");
        assert_eq!(json["pages"][0]["path"], "/garden/a");
        assert!(json["pages"][0].get("is_alias").is_none());
        assert_eq!(json["artifacts"][0]["kind"], "local-file-template");
        assert_eq!(json["alias"]["status"], "not-configured");
        assert!(!tmp.join(".routes.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
