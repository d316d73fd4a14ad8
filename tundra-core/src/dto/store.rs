//! Resource store DTOs

use serde::{Deserialize, Serialize};

use crate::domain::repo::RepoSpec;

/// Request to create a new repo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepo {
    pub name: String,
    pub spec: RepoSpec,
}
