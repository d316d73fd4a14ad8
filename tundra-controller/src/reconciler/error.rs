//! Reconciliation errors

use thiserror::Error;
use tundra_client::ClientError;
use tundra_core::domain::manifest::ManifestError;
use tundra_core::domain::repo::InvalidSourceUrl;

/// Reasons a reconciliation pass stops early
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A collaborator call failed
    #[error("{context}: {source}")]
    Collaborator {
        context: &'static str,
        #[source]
        source: ClientError,
    },

    /// A collaborator call did not answer within the call timeout
    #[error("{context}: timed out")]
    Timeout { context: &'static str },

    /// The repo's source url cannot be mapped to owner/name
    #[error(transparent)]
    InvalidSource(#[from] InvalidSourceUrl),

    /// The manifest at the resolved commit is malformed
    #[error("invalid manifest: {0}")]
    Config(#[from] ManifestError),
}

impl ReconcileError {
    /// Whether the failure only means an object vanished underneath us
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Collaborator { source, .. } if source.is_not_found())
    }
}
