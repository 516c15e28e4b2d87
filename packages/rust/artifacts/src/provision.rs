//! Reconciles the generated-artifact slots against an [`ArtifactPlan`].
//!
//! Each slot is a two-state machine: present when its source is active,
//! absent otherwise. Reconciliation always overwrites a present slot with the
//! canonical bytes and treats an already-missing slot as success, so running
//! it twice in a row is a no-op in effect.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use notegarden_shared::{GardenError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use crate::plan::{ArtifactGroup, ArtifactKind, ArtifactPlan};

/// What happened to one slot during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Transition {
    /// Canonical content written; `replaced` is true if a file was already there.
    Copied {
        replaced: bool,
        sha256: String,
        size_bytes: u64,
    },
    /// A stale generated file was deleted.
    Removed,
    /// The slot was already empty.
    AlreadyAbsent,
}

impl Transition {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Copied { .. })
    }
}

/// Outcome for a single slot.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactOutcome {
    pub kind: ArtifactKind,
    /// Absolute path of the generated slot.
    pub path: PathBuf,
    pub transition: Transition,
}

/// Outcome for one reconciled group, in slot order.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub group: ArtifactGroup,
    pub outcomes: Vec<ArtifactOutcome>,
}

impl ProvisionReport {
    pub fn outcome(&self, kind: ArtifactKind) -> Option<&ArtifactOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }

    pub fn copied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.transition.is_present())
            .count()
    }

    pub fn removed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.transition == Transition::Removed)
            .count()
    }
}

/// Copies canonical theme files into the generated-sources directory, or
/// deletes them, according to a plan.
#[derive(Debug, Clone)]
pub struct Provisioner {
    theme_dir: PathBuf,
    generated_dir: PathBuf,
    plan: ArtifactPlan,
}

impl Provisioner {
    pub fn new(
        theme_dir: impl Into<PathBuf>,
        generated_dir: impl Into<PathBuf>,
        plan: ArtifactPlan,
    ) -> Self {
        Self {
            theme_dir: theme_dir.into(),
            generated_dir: generated_dir.into(),
            plan,
        }
    }

    /// Absolute path of the generated slot for `kind`.
    pub fn generated_path(&self, kind: ArtifactKind) -> PathBuf {
        self.generated_dir.join(kind.generated_path())
    }

    /// Bring every slot of `group` to the state the plan requires.
    ///
    /// The first I/O failure aborts the group with [`GardenError::ArtifactIo`].
    #[instrument(skip_all, fields(group = ?group))]
    pub fn reconcile(&self, group: ArtifactGroup) -> Result<ProvisionReport> {
        let mut outcomes = Vec::with_capacity(group.kinds().len());

        for &kind in group.kinds() {
            let target = self.generated_path(kind);
            let transition = match self.plan.canonical_path(kind) {
                Some(canonical) => copy_artifact(&self.theme_dir.join(canonical), &target)?,
                None => remove_artifact(&target)?,
            };
            debug!(%kind, path = %target.display(), ?transition, "artifact reconciled");
            outcomes.push(ArtifactOutcome {
                kind,
                path: target,
                transition,
            });
        }

        let report = ProvisionReport { group, outcomes };
        info!(
            copied = report.copied(),
            removed = report.removed(),
            "artifact group provisioned"
        );
        Ok(report)
    }

    /// Whether the slot for `kind` currently matches the plan: byte-identical
    /// to its canonical source when present, missing when absent.
    pub fn verify(&self, kind: ArtifactKind) -> Result<bool> {
        let target = self.generated_path(kind);
        match self.plan.canonical_path(kind) {
            Some(canonical) => {
                let expected = read_artifact(&self.theme_dir.join(canonical))?;
                match std::fs::read(&target) {
                    Ok(actual) => Ok(sha256_hex(&actual) == sha256_hex(&expected)),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                    Err(e) => Err(GardenError::artifact_io(&target, e)),
                }
            }
            None => match std::fs::symlink_metadata(&target) {
                Ok(_) => Ok(false),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
                Err(e) => Err(GardenError::artifact_io(&target, e)),
            },
        }
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| GardenError::artifact_io(path, e))
}

/// Write `source` over `target` atomically (temp file in the same directory, then rename).
fn copy_artifact(source: &Path, target: &Path) -> Result<Transition> {
    let content = read_artifact(source)?;

    let parent = target.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| GardenError::artifact_io(parent, e))?;

    let replaced = target.exists();
    let filename = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{filename}.tmp"));

    if let Err(e) = std::fs::write(&temp, &content) {
        let _ = std::fs::remove_file(&temp);
        return Err(GardenError::artifact_io(&temp, e));
    }
    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(GardenError::artifact_io(target, e));
    }

    Ok(Transition::Copied {
        replaced,
        sha256: sha256_hex(&content),
        size_bytes: content.len() as u64,
    })
}

fn remove_artifact(target: &Path) -> Result<Transition> {
    match std::fs::remove_file(target) {
        Ok(()) => Ok(Transition::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Transition::AlreadyAbsent),
        Err(e) => Err(GardenError::artifact_io(target, e)),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
