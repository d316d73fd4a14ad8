//! Configuration module
//!
//! Service endpoints the CLI talks to.

use tundra_client::{EngineClient, StoreClient};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the resource store
    pub store_url: String,
    /// URL of the pipeline engine
    pub engine_url: String,
}

impl Config {
    pub fn store(&self) -> StoreClient {
        StoreClient::new(&self.store_url)
    }

    pub fn engine(&self) -> EngineClient {
        EngineClient::new(&self.engine_url)
    }
}
