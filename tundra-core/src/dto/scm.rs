//! Source-control DTOs
//!
//! Subset of the GitHub REST payloads the controller reads.

use serde::{Deserialize, Serialize};

/// `GET /repos/{owner}/{repo}/branches/{branch}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: Commit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
}

/// `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub path: String,
    /// Encoded file body, see `encoding`
    pub content: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_encoding() -> String {
    "base64".to_string()
}
