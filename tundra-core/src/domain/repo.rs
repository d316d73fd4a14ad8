//! Repo domain types
//!
//! A repo is the resource under management: the user owns its spec (where
//! the source lives and which cluster it deploys to) and the controller owns
//! its status (what it last saw and what it ran).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::domain::manifest::PipelineConfig;
use crate::history::RunHistory;

/// Kind recorded on owner references pointing at a repo
pub const REPO_KIND: &str = "Repo";

/// Length of the abbreviated commit used for names and status
pub const SHORT_SHA_LEN: usize = 7;

/// Identity of a repo within the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoId {
    pub namespace: String,
    pub name: String,
}

impl RepoId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Store-assigned metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub uid: Uuid,
    /// Bumped by the store on every write, status included
    #[serde(default)]
    pub resource_version: u64,
    /// Bumped by the store only when the spec changes
    #[serde(default)]
    pub generation: u64,
}

/// A managed repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub metadata: ObjectMeta,
    pub spec: RepoSpec,
    #[serde(default)]
    pub status: RepoStatus,
}

impl Repo {
    pub fn id(&self) -> RepoId {
        RepoId::new(&self.metadata.namespace, &self.metadata.name)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Owner reference stamped on every engine object created for this repo
    pub fn owner_ref(&self) -> OwnerRef {
        OwnerRef {
            kind: REPO_KIND.to_string(),
            name: self.metadata.name.clone(),
            uid: self.metadata.uid,
        }
    }
}

/// Desired state, written by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    pub url: String,
    pub branch: String,
    /// Name of the cluster-target binding runs deploy to
    #[serde(default)]
    pub cluster: String,
}

impl RepoSpec {
    pub fn source_repo(&self) -> Result<SourceRepo, InvalidSourceUrl> {
        SourceRepo::parse(&self.url)
    }
}

/// Observed state, written only by the controller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStatus {
    /// Short SHA of the last commit a run was triggered for
    #[serde(rename = "commitSHA", default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,

    /// Manifest that commit was deployed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PipelineConfig>,

    /// Git binding the engine runs check the repo out from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_ref: Option<ObjectRef>,

    #[serde(default, skip_serializing_if = "RunHistory::is_empty")]
    pub runs: RunHistory,
}

/// Reference to an object held by a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,
}

impl ObjectRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            uid: None,
        }
    }
}

/// Back-link from a created object to the repo that owns it
///
/// The engine deletes every object carrying an owner reference once the
/// owning repo is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
    pub uid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot derive owner/name from source url `{0}`")]
pub struct InvalidSourceUrl(pub String);

/// Owner and name of a repository on the source-control host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRepo {
    pub owner: String,
    pub name: String,
}

impl SourceRepo {
    /// Extracts owner and repository name from a clone URL
    ///
    /// Accepts `https://host/owner/name(.git)` and `git@host:owner/name(.git)`.
    pub fn parse(url: &str) -> Result<Self, InvalidSourceUrl> {
        let repo = match Url::parse(url) {
            Ok(parsed) if !parsed.cannot_be_a_base() => {
                parsed.path_segments().and_then(Self::from_segments)
            }
            // scp-style `git@host:owner/name`
            _ => url
                .split_once(':')
                .and_then(|(_, path)| Self::from_segments(path.split('/'))),
        };

        repo.ok_or_else(|| InvalidSourceUrl(url.to_string()))
    }

    fn from_segments<'a>(segments: impl Iterator<Item = &'a str>) -> Option<Self> {
        let mut segments = segments.filter(|s| !s.is_empty());

        let owner = segments.next()?;
        let name = segments.next()?;
        let name = name.strip_suffix(".git").unwrap_or(name);

        if name.is_empty() {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for SourceRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Abbreviates a commit SHA to [`SHORT_SHA_LEN`] characters
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(SHORT_SHA_LEN) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}
