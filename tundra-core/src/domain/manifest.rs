//! Manifest domain types
//!
//! The manifest is the file committed to a managed repository that declares
//! which paths get deployed and whether they run in parallel or one after the
//! other. It is fetched fresh for every commit and never mutated.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::plan::Param;

/// Prefix shared by every executor template name
pub const EXECUTOR_TEMPLATE_PREFIX: &str = "tundra";

/// Errors raised while turning manifest bytes into a [`PipelineConfig`]
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Transport encoding was not valid base64
    #[error("manifest is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Decoded bytes were not UTF-8 text
    #[error("manifest is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Document did not match the manifest structure
    #[error("manifest could not be parsed: {0}")]
    Parse(#[from] serde_yml::Error),
}

/// Which execution template deploys a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecutorKind {
    /// Plain manifests applied with kubectl
    #[default]
    #[serde(rename = "kubectl", alias = "default")]
    Default,

    /// A chart installed with helm
    #[serde(rename = "helm")]
    Helm,
}

impl ExecutorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorKind::Default => "kubectl",
            ExecutorKind::Helm => "helm",
        }
    }

    /// Name of the cluster-scoped template that runs this kind of step
    pub fn template_name(&self) -> String {
        format!("{}-{}-executor", EXECUTOR_TEMPLATE_PREFIX, self.as_str())
    }

    /// Builds the task parameters for a step deployed from `path`
    ///
    /// `path` always comes first. Helm steps also get a `release` named after
    /// the last path segment, so a chart directory doubles as its release name.
    pub fn params(&self, path: &str) -> Vec<Param> {
        match self {
            ExecutorKind::Default => vec![Param::new("path", path)],
            ExecutorKind::Helm => vec![
                Param::new("path", path),
                Param::new("release", basename(path)),
            ],
        }
    }
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the tasks of a plan are ordered relative to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Parallel,
    Sequential,
}

/// One deployable unit declared in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestStep {
    pub path: String,
    #[serde(rename = "type", default)]
    pub executor: ExecutorKind,
}

impl ManifestStep {
    pub fn new(path: impl Into<String>, executor: ExecutorKind) -> Self {
        Self {
            path: path.into(),
            executor,
        }
    }
}

/// Parsed manifest for one commit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "paths", alias = "steps", default)]
    pub steps: Vec<ManifestStep>,
    #[serde(default)]
    pub strategy: Strategy,
}

impl PipelineConfig {
    /// Parses a YAML manifest document
    ///
    /// An empty document is a valid manifest with no steps.
    pub fn from_yaml(text: &str) -> Result<Self, ManifestError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yml::from_str(text)?)
    }

    /// Decodes base64 file content as served by the source-control API and
    /// parses it
    ///
    /// The API wraps encoded content across lines, so whitespace is dropped
    /// before decoding.
    pub fn from_base64(encoded: &str) -> Result<Self, ManifestError> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD.decode(compact)?;
        let text = String::from_utf8(bytes)?;
        Self::from_yaml(&text)
    }
}

fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit('/').next() {
        Some(last) if !last.is_empty() => last,
        _ => path,
    }
}
