//! Artifact kinds and the per-build plan derived from the active sources.

use notegarden_shared::{ActiveSources, NodeKind};
use serde::Serialize;

/// One of the four generated-artifact slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    LocalFileTemplate,
    RemotePageTemplate,
    RemoteBlockTemplate,
    QueryFragment,
}

/// Artifacts are provisioned in two groups at two different build phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactGroup {
    /// Provisioned before any query referencing the fragment runs.
    QueryFragments,
    /// Provisioned before pages are bound to templates.
    Templates,
}

impl ArtifactGroup {
    pub const fn kinds(self) -> &'static [ArtifactKind] {
        match self {
            Self::QueryFragments => &[ArtifactKind::QueryFragment],
            Self::Templates => &[
                ArtifactKind::LocalFileTemplate,
                ArtifactKind::RemotePageTemplate,
                ArtifactKind::RemoteBlockTemplate,
            ],
        }
    }
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        Self::LocalFileTemplate,
        Self::RemotePageTemplate,
        Self::RemoteBlockTemplate,
        Self::QueryFragment,
    ];

    /// Template slot a route of `kind` is bound to.
    pub const fn template_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::LocalFile => Self::LocalFileTemplate,
            NodeKind::RemotePage => Self::RemotePageTemplate,
            NodeKind::RemoteBlock => Self::RemoteBlockTemplate,
        }
    }

    /// Slot path, relative to the generated-sources directory.
    pub const fn generated_path(self) -> &'static str {
        match self {
            Self::LocalFileTemplate => "templates/local-file.js",
            Self::RemotePageTemplate => "templates/remote-page.js",
            Self::RemoteBlockTemplate => "templates/remote-block.js",
            Self::QueryFragment => "fragments/garden-fragments.js",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalFileTemplate => "local-file-template",
            Self::RemotePageTemplate => "remote-page-template",
            Self::RemoteBlockTemplate => "remote-block-template",
            Self::QueryFragment => "query-fragment",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which query fragment matches the active source set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentVariant {
    FileOnly,
    RemoteOnly,
    FileAndRemote,
}

impl FragmentVariant {
    /// `None` when no source is active.
    pub const fn for_sources(sources: ActiveSources) -> Option<Self> {
        match (sources.local, sources.remote) {
            (true, true) => Some(Self::FileAndRemote),
            (true, false) => Some(Self::FileOnly),
            (false, true) => Some(Self::RemoteOnly),
            (false, false) => None,
        }
    }

    /// Canonical fragment, relative to the theme directory.
    pub const fn canonical_path(self) -> &'static str {
        match self {
            Self::FileOnly => "fragments/file.fragment",
            Self::RemoteOnly => "fragments/remote.fragment",
            Self::FileAndRemote => "fragments/file-and-remote.fragment",
        }
    }
}

/// The desired artifact set for one build: a pure function of the active sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactPlan {
    sources: ActiveSources,
}

impl ArtifactPlan {
    pub const fn for_sources(sources: ActiveSources) -> Self {
        Self { sources }
    }

    /// Whether `kind` must exist after this build.
    pub const fn is_present(&self, kind: ArtifactKind) -> bool {
        self.canonical_path(kind).is_some()
    }

    /// Canonical source for `kind`, relative to the theme directory, or
    /// `None` if the artifact must be absent.
    pub const fn canonical_path(&self, kind: ArtifactKind) -> Option<&'static str> {
        match kind {
            ArtifactKind::LocalFileTemplate if self.sources.local => {
                Some("templates/local-file.template")
            }
            ArtifactKind::RemotePageTemplate if self.sources.remote => {
                Some("templates/remote-page.template")
            }
            ArtifactKind::RemoteBlockTemplate if self.sources.remote => {
                Some("templates/remote-block.template")
            }
            ArtifactKind::QueryFragment => match FragmentVariant::for_sources(self.sources) {
                Some(variant) => Some(variant.canonical_path()),
                None => None,
            },
            _ => None,
        }
    }

    pub const fn fragment_variant(&self) -> Option<FragmentVariant> {
        FragmentVariant::for_sources(self.sources)
    }
}
