//! Core domain types for the notegarden content pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BuildId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one build invocation (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(pub Uuid);

impl BuildId {
    /// Generate a new time-sortable build identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Sources and node kinds
// ---------------------------------------------------------------------------

/// A configured origin of note data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// A local directory of files.
    Local,
    /// A remote knowledge-graph export.
    RemoteGraph,
}

/// Closed set of content node shapes. Also selects the page template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    LocalFile,
    RemotePage,
    RemoteBlock,
}

impl NodeKind {
    /// All kinds, in route-table order.
    pub const ALL: [NodeKind; 3] = [Self::LocalFile, Self::RemotePage, Self::RemoteBlock];

    /// The source this kind of node comes from.
    pub const fn source(self) -> SourceKind {
        match self {
            Self::LocalFile => SourceKind::Local,
            Self::RemotePage | Self::RemoteBlock => SourceKind::RemoteGraph,
        }
    }

    /// Stable string form, used by the node store.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalFile => "local-file",
            Self::RemotePage => "remote-page",
            Self::RemoteBlock => "remote-block",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local-file" => Ok(Self::LocalFile),
            "remote-page" => Ok(Self::RemotePage),
            "remote-block" => Ok(Self::RemoteBlock),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

/// Which content sources are configured for this build.
///
/// Derived once from the frozen config; adapters and the artifact provisioner
/// both read this same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSources {
    pub local: bool,
    pub remote: bool,
}

impl ActiveSources {
    /// Whether the given source is active.
    pub const fn contains(&self, source: SourceKind) -> bool {
        match source {
            SourceKind::Local => self.local,
            SourceKind::RemoteGraph => self.remote,
        }
    }

    /// Whether nodes of `kind` should be retrieved and routed.
    pub const fn includes_kind(&self, kind: NodeKind) -> bool {
        self.contains(kind.source())
    }

    pub const fn is_empty(&self) -> bool {
        !self.local && !self.remote
    }
}

// ---------------------------------------------------------------------------
// ContentNode
// ---------------------------------------------------------------------------

/// Directory portion and extension-less file name of a local file, relative
/// to the content directory. `dir` is empty for top-level files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativePath {
    pub dir: String,
    pub name: String,
}

/// One discovered item, as delivered by the content query boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Opaque id, stable within one store snapshot.
    pub id: String,
    pub kind: NodeKind,
    /// Origin label the node reports (content dir label or graph endpoint).
    pub source_origin: String,
    /// Title for remote pages, file name for local files, block text for blocks.
    pub title: String,
    /// Required for remote blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Required for local files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<RelativePath>,
}

impl ContentNode {
    /// A local file node at `dir/name` (name without extension).
    pub fn local_file(
        id: impl Into<String>,
        origin: impl Into<String>,
        dir: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            kind: NodeKind::LocalFile,
            source_origin: origin.into(),
            title: name.clone(),
            uid: None,
            relative_path: Some(RelativePath {
                dir: dir.into(),
                name,
            }),
        }
    }

    /// A remote page node.
    pub fn remote_page(
        id: impl Into<String>,
        origin: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::RemotePage,
            source_origin: origin.into(),
            title: title.into(),
            uid: None,
            relative_path: None,
        }
    }

    /// A remote block node; `uid` may be absent in malformed exports.
    pub fn remote_block(
        id: impl Into<String>,
        origin: impl Into<String>,
        text: impl Into<String>,
        uid: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::RemoteBlock,
            source_origin: origin.into(),
            title: text.into(),
            uid: uid.map(String::from),
            relative_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PageRoute
// ---------------------------------------------------------------------------

/// One entry of the route table handed to the page-creation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRoute {
    /// URL slug, or the base path for the root alias.
    pub path: String,
    /// Selects the template the page is bound to.
    pub template_kind: NodeKind,
    /// Owning node id, passed through opaquely.
    pub context_id: String,
    /// Set only on the synthetic root-alias entry.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_alias: bool,
}
