//! Phase-ordered build pipeline: bootstrap → fragment → retrieval → routes → emission.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use notegarden_artifacts::{
    ArtifactGroup, ArtifactKind, ArtifactPlan, ProvisionReport, Provisioner, Transition,
};
use notegarden_ingest::{ensure_content_dir, resolve_content_dir};
use notegarden_shared::{
    BuildId, BuildPathsConfig, ContentQuery, ContentSourceConfig, GardenError, Result,
};
use notegarden_sources::AdapterRegistry;
use tracing::{debug, info, instrument};

use crate::emit::{ArtifactRecord, BuildSummary, PageSink, SiteRecord};
use crate::routes::{NodeSnapshot, RouteTable, build_route_table};

/// Filesystem locations for one build.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    /// Relative content paths are resolved against this.
    pub project_dir: PathBuf,
    /// Canonical templates and fragments.
    pub theme_dir: PathBuf,
    /// Generated-sources area written by the provisioner.
    pub generated_dir: PathBuf,
}

impl BuildPaths {
    pub fn from_config(project_dir: &Path, paths: &BuildPathsConfig) -> Self {
        let resolved = paths.resolve(project_dir);
        Self {
            project_dir: project_dir.to_path_buf(),
            theme_dir: resolved.theme_dir,
            generated_dir: resolved.generated_dir,
        }
    }
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildResult {
    pub build_id: BuildId,
    pub table: RouteTable,
    pub fragments: ProvisionReport,
    pub templates: ProvisionReport,
    pub pages_created: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page is handed to the sink.
    fn page_created(&self, path: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_created(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run one build.
///
/// Phases run strictly in order and the first failure aborts the rest:
///
/// 1. Bootstrap: create the local content directory if it is missing
/// 2. Provision the query fragment
/// 3. Retrieve node listings for the active sources
/// 4. Build the route table, then provision the page templates
/// 5. Hand every route to the sink, then let it finish
#[instrument(skip_all, fields(
    base_path = %config.base_path(),
    local = config.local_content_dir().is_some(),
    remote = config.remote_graph_endpoint().is_some()
))]
pub async fn build_site<Q: ContentQuery>(
    config: &ContentSourceConfig,
    paths: &BuildPaths,
    query: &Q,
    sink: &mut dyn PageSink,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    let build_id = BuildId::new();
    let sources = config.active_sources();
    let registry = AdapterRegistry::new();
    let provisioner = Provisioner::new(
        &paths.theme_dir,
        &paths.generated_dir,
        ArtifactPlan::for_sources(sources),
    );

    info!(%build_id, "starting build");

    // --- Phase 1: Bootstrap ---
    progress.phase("Preparing content directory");
    if let Some(content_path) = config.local_content_dir() {
        let dir = resolve_content_dir(&paths.project_dir, content_path);
        ensure_content_dir(&dir)?;
    }

    // --- Phase 2: Query fragment ---
    progress.phase("Provisioning query fragment");
    let fragments = provisioner.reconcile(ArtifactGroup::QueryFragments)?;

    // --- Phase 3: Retrieval ---
    progress.phase("Retrieving content");
    let snapshot = NodeSnapshot::retrieve(query, &registry, sources).await?;
    info!(nodes = snapshot.node_count(), "content retrieved");

    // --- Phase 4: Routes + templates ---
    progress.phase("Building routes");
    let table = build_route_table(&snapshot, config, &registry);
    let templates = provisioner.reconcile(ArtifactGroup::Templates)?;

    // --- Phase 5: Emission ---
    progress.phase("Creating pages");
    let total = table.routes.len();
    for (i, route) in table.routes.iter().enumerate() {
        let template = provisioner.generated_path(ArtifactKind::template_for(route.template_kind));
        if !template.is_file() {
            return Err(GardenError::validation(format!(
                "route {} needs template {} which was not provisioned",
                route.path,
                template.display()
            )));
        }
        sink.create_page(route, &template)?;
        progress.page_created(&route.path, i + 1, total);
    }

    let summary = BuildSummary {
        build_id: build_id.clone(),
        generated_at: Utc::now(),
        site: SiteRecord {
            base_path: config.base_path().to_string(),
        },
        alias: table.alias.clone(),
        artifacts: present_artifacts(&[&fragments, &templates]),
    };
    sink.finish(&summary)?;

    let result = BuildResult {
        build_id,
        pages_created: total,
        table,
        fragments,
        templates,
        elapsed: start.elapsed(),
    };

    info!(
        pages = result.pages_created,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "build complete"
    );
    progress.done(&result);

    Ok(result)
}

fn present_artifacts(reports: &[&ProvisionReport]) -> Vec<ArtifactRecord> {
    let records: Vec<ArtifactRecord> = reports
        .iter()
        .flat_map(|report| report.outcomes.iter())
        .filter_map(|outcome| match &outcome.transition {
            Transition::Copied { sha256, .. } => Some(ArtifactRecord {
                kind: outcome.kind,
                path: outcome.path.clone(),
                sha256: sha256.clone(),
            }),
            Transition::Removed | Transition::AlreadyAbsent => None,
        })
        .collect();
    debug!(count = records.len(), "artifacts present");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegarden_shared::{ContentNode, MemorySnapshot, NodeKind, PageRoute};

    use crate::emit::{MANIFEST_FILE, RouteManifestWriter};
    use crate::routes::AliasOutcome;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ng-pipeline-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_paths(root: &Path) -> BuildPaths {
        let theme = root.join("theme");
        for (rel, body) in [
            ("templates/local-file.template", "local"),
            ("templates/remote-page.template", "page"),
            ("templates/remote-block.template", "block"),
            ("fragments/file.fragment", "file"),
            ("fragments/remote.fragment", "remote"),
            ("fragments/file-and-remote.fragment", "file+remote"),
        ] {
            let path = theme.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        }
        BuildPaths {
            project_dir: root.to_path_buf(),
            theme_dir: theme,
            generated_dir: root.join("generated"),
        }
    }

    /// Records every call, for asserting order and finish semantics.
    #[derive(Default)]
    struct RecordingSink {
        pages: Vec<(PageRoute, PathBuf)>,
        finished: Option<BuildSummary>,
    }

    impl PageSink for RecordingSink {
        fn create_page(&mut self, route: &PageRoute, template: &Path) -> Result<()> {
            self.pages.push((route.clone(), template.to_path_buf()));
            Ok(())
        }

        fn finish(&mut self, summary: &BuildSummary) -> Result<()> {
            self.finished = Some(summary.clone());
            Ok(())
        }
    }

    fn both(root: &Path) -> ContentSourceConfig {
        ContentSourceConfig::new("/")
            .unwrap()
            .with_local_content_dir(root.join("notes").to_string_lossy())
            .with_remote_graph_endpoint("graph")
    }

    fn mixed_snapshot(local_origin: &str) -> MemorySnapshot {
        MemorySnapshot::new(vec![
            ContentNode::local_file("f1", local_origin, "", "index"),
            ContentNode::remote_page("p1", "graph", "Hello World!"),
            ContentNode::remote_block("b1", "graph", "text", Some("blk1")),
        ])
    }

    #[tokio::test]
    async fn bootstrap_creates_content_dir() {
        let tmp = temp_dir();
        let paths = make_paths(&tmp);
        let config = ContentSourceConfig::new("/")
            .unwrap()
            .with_local_content_dir("notes");
        let mut sink = RecordingSink::default();

        build_site(
            &config,
            &paths,
            &MemorySnapshot::default(),
            &mut sink,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert!(tmp.join("notes").is_dir());
        assert!(sink.pages.is_empty());
        assert!(sink.finished.is_some());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn pages_are_bound_to_generated_templates() {
        let tmp = temp_dir();
        let paths = make_paths(&tmp);
        let config = both(&tmp);
        let origin = config.local_content_dir().unwrap().to_string();
        let mut sink = RecordingSink::default();

        let result = build_site(
            &config,
            &paths,
            &mixed_snapshot(&origin),
            &mut sink,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(result.pages_created, 3);
        let bound: Vec<(&str, PathBuf)> = sink
            .pages
            .iter()
            .map(|(route, template)| {
                let rel = template.strip_prefix(&paths.generated_dir).unwrap();
                (route.path.as_str(), rel.to_path_buf())
            })
            .collect();
        assert_eq!(
            bound,
            vec![
                ("/index", PathBuf::from("templates/local-file.js")),
                ("/hello-world", PathBuf::from("templates/remote-page.js")),
                ("/blk1", PathBuf::from("templates/remote-block.js")),
            ]
        );

        let summary = sink.finished.unwrap();
        assert_eq!(summary.artifacts.len(), 4);
        assert_eq!(summary.site.base_path, "/");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn disabling_remote_source_between_builds() {
        let tmp = temp_dir();
        let paths = make_paths(&tmp);
        let config = both(&tmp);
        let origin = config.local_content_dir().unwrap().to_string();
        let snapshot = mixed_snapshot(&origin);

        build_site(
            &config,
            &paths,
            &snapshot,
            &mut RecordingSink::default(),
            &SilentProgress,
        )
        .await
        .unwrap();

        let local_only = ContentSourceConfig::new("/")
            .unwrap()
            .with_local_content_dir(origin.clone());
        let result = build_site(
            &local_only,
            &paths,
            &snapshot,
            &mut RecordingSink::default(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(result.table.count_by_kind(NodeKind::LocalFile), 1);
        assert_eq!(result.table.count_by_kind(NodeKind::RemotePage), 0);
        assert_eq!(result.table.count_by_kind(NodeKind::RemoteBlock), 0);
        assert!(!paths.generated_dir.join("templates/remote-page.js").exists());
        assert!(!paths.generated_dir.join("templates/remote-block.js").exists());
        assert!(paths.generated_dir.join("templates/local-file.js").exists());
        assert_eq!(
            std::fs::read_to_string(paths.generated_dir.join("fragments/garden-fragments.js"))
                .unwrap(),
            "file"
        );
        assert_eq!(result.templates.removed(), 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn rebuild_is_idempotent() {
        let tmp = temp_dir();
        let paths = make_paths(&tmp);
        let config = both(&tmp).with_root_note_slug("/hello-world");
        let origin = config.local_content_dir().unwrap().to_string();
        let snapshot = mixed_snapshot(&origin);

        let first = build_site(
            &config,
            &paths,
            &snapshot,
            &mut RecordingSink::default(),
            &SilentProgress,
        )
        .await
        .unwrap();
        let second = build_site(
            &config,
            &paths,
            &snapshot,
            &mut RecordingSink::default(),
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(first.table.routes, second.table.routes);
        assert_eq!(second.table.len(), 4);
        assert!(matches!(second.table.alias, AliasOutcome::Resolved { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn retrieval_failure_aborts_before_templates() {
        let tmp = temp_dir();
        let paths = make_paths(&tmp);
        let config = ContentSourceConfig::new("/")
            .unwrap()
            .with_remote_graph_endpoint("graph");
        let mut sink = RecordingSink::default();

        let err = build_site(
            &config,
            &paths,
            &MemorySnapshot::failing("store offline"),
            &mut sink,
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GardenError::Retrieval { .. }));
        // fragment phase already ran, template phase did not
        assert!(paths.generated_dir.join("fragments/garden-fragments.js").exists());
        assert!(!paths.generated_dir.join("templates/remote-page.js").exists());
        assert!(sink.finished.is_none());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn missing_theme_is_fatal() {
        let tmp = temp_dir();
        let paths = BuildPaths {
            project_dir: tmp.clone(),
            theme_dir: tmp.join("missing-theme"),
            generated_dir: tmp.join("generated"),
        };
        let config = ContentSourceConfig::new("/")
            .unwrap()
            .with_remote_graph_endpoint("graph");

        let err = build_site(
            &config,
            &paths,
            &MemorySnapshot::default(),
            &mut RecordingSink::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GardenError::ArtifactIo { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn manifest_writer_end_to_end() {
        let tmp = temp_dir();
        let paths = make_paths(&tmp);
        let config = ContentSourceConfig::new("/")
            .unwrap()
            .with_remote_graph_endpoint("graph")
            .with_root_note_slug("/hello-world");
        let snapshot = MemorySnapshot::new(vec![ContentNode::remote_page(
            "p1",
            "graph",
            "Hello World!",
        )]);
        let out = tmp.join("public");
        let mut writer = RouteManifestWriter::new(&out);

        let result = build_site(&config, &paths, &snapshot, &mut writer, &SilentProgress)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(out.join(MANIFEST_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["build_id"], result.build_id.to_string());
        assert_eq!(json["page_count"], 2);
        assert_eq!(json["pages"][1]["path"], "/");
        assert_eq!(json["pages"][1]["is_alias"], true);
        assert_eq!(json["pages"][1]["context_id"], "p1");
        assert_eq!(json["alias"]["status"], "resolved");
        // remote fragment + two remote templates
        assert_eq!(json["artifacts"].as_array().unwrap().len(), 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
