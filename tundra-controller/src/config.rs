//! Controller configuration
//!
//! Every setting is a command-line flag with an environment fallback and an
//! explicit default, so a bare `tundra-controller` runs against local
//! services.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tundra_client::scm::GITHUB_API_URL;

use crate::reconciler::ReconcilerSettings;

/// Controller configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "tundra-controller")]
#[command(about = "Keeps deployment pipelines in step with their git branches", long_about = None)]
pub struct Config {
    /// Resource store base URL
    #[arg(long, env = "TUNDRA_STORE_URL", default_value = "http://localhost:8080")]
    pub store_url: String,

    /// Pipeline engine base URL
    #[arg(long, env = "TUNDRA_ENGINE_URL", default_value = "http://localhost:8081")]
    pub engine_url: String,

    /// Source-control API base URL
    #[arg(long, env = "TUNDRA_SCM_URL", default_value = GITHUB_API_URL)]
    pub scm_url: String,

    /// Bearer token for the source-control API
    #[arg(long, env = "TUNDRA_SCM_TOKEN", hide_env_values = true)]
    pub scm_token: Option<String>,

    /// Manifest location inside each managed repository
    #[arg(long, env = "TUNDRA_MANIFEST_PATH", default_value = "tundra.yaml")]
    pub manifest_path: String,

    /// Seconds between passes while a run is still going
    #[arg(long, env = "TUNDRA_REQUEUE_AFTER", default_value_t = 3)]
    pub requeue_after_secs: u64,

    /// Upper bound in seconds for a single collaborator call
    #[arg(long, env = "TUNDRA_CALL_TIMEOUT", default_value_t = 10)]
    pub call_timeout_secs: u64,

    /// Seconds between store listings
    #[arg(long, env = "TUNDRA_WATCH_INTERVAL", default_value_t = 2)]
    pub watch_interval_secs: u64,

    /// Seconds between full resyncs of every repo
    #[arg(long, env = "TUNDRA_RESYNC_INTERVAL", default_value_t = 60)]
    pub resync_interval_secs: u64,

    /// Passes allowed to run at the same time
    #[arg(long, env = "TUNDRA_MAX_CONCURRENT_RECONCILES", default_value_t = 4)]
    pub max_concurrent_reconciles: usize,

    /// Listen address of the health endpoint
    #[arg(long, env = "TUNDRA_HEALTH_ADDR", default_value = "0.0.0.0:9090")]
    pub health_addr: SocketAddr,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, url) in [
            ("store_url", &self.store_url),
            ("engine_url", &self.engine_url),
            ("scm_url", &self.scm_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.manifest_path.trim().is_empty() {
            anyhow::bail!("manifest_path cannot be empty");
        }

        for (name, secs) in [
            ("requeue_after_secs", self.requeue_after_secs),
            ("call_timeout_secs", self.call_timeout_secs),
            ("watch_interval_secs", self.watch_interval_secs),
            ("resync_interval_secs", self.resync_interval_secs),
        ] {
            if secs == 0 {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        if self.max_concurrent_reconciles == 0 {
            anyhow::bail!("max_concurrent_reconciles must be greater than 0");
        }

        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            manifest_path: self.manifest_path.clone(),
            requeue_after: Duration::from_secs(self.requeue_after_secs),
            call_timeout: self.call_timeout(),
        }
    }
}
