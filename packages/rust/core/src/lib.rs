//! Route building and build orchestration for notegarden.
//!
//! - [`routes`]: snapshot retrieval and the route table builder
//! - [`emit`]: page-creation boundary and the `routes.json` writer
//! - [`pipeline`]: the phase-ordered [`build_site`] entry point

pub mod emit;
pub mod pipeline;
pub mod routes;

pub use emit::{
    ArtifactRecord, BuildSummary, MANIFEST_FILE, PageRecord, PageSink, RouteManifestWriter,
    SiteRecord,
};
pub use pipeline::{BuildPaths, BuildResult, ProgressReporter, SilentProgress, build_site};
pub use routes::{AliasOutcome, NodeSnapshot, RouteTable, build_route_table, compute_routes};
