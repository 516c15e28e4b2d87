//! Generated-artifact provisioning.
//!
//! The page templates and the shared query fragment exist in the generated
//! sources directory only while the content source that needs them is
//! configured. [`ArtifactPlan`] computes the desired state from the active
//! sources; [`Provisioner`] reconciles the filesystem towards it.

mod plan;
mod provision;

pub use plan::{ArtifactGroup, ArtifactKind, ArtifactPlan, FragmentVariant};
pub use provision::{ArtifactOutcome, ProvisionReport, Provisioner, Transition};
