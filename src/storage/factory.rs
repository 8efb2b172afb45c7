use std::sync::Arc;

use tracing::debug;

use super::adapter::Adapter;
use super::config::AdapterConfig;
use super::error::StorageResult;
use super::local::LocalAdapter;
use super::{alioss, hwobs, minio, txcos};

/// Factory for creating storage adapters
pub struct AdapterFactory;

impl AdapterFactory {
    /// Create a storage adapter from a configuration.
    ///
    /// Every adapter is built from a configuration record only, and no
    /// request is sent to the backend. Call
    /// [`Adapter::validate_connection`] to check reachability.
    ///
    /// # Arguments
    ///
    /// * `config` - The backend configuration
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Arc<dyn Adapter>)` - A thread-safe reference to the initialized adapter
    /// * `Err(StorageError)` - If the adapter cannot be created
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The local base path does not exist or is not a directory
    /// * An endpoint, bucket or base URL is malformed
    /// * The underlying client cannot be initialized
    pub async fn from_config(config: AdapterConfig) -> StorageResult<Arc<dyn Adapter>> {
        debug!("Creating {} adapter", config.backend_name());
        let adapter: Arc<dyn Adapter> = match config {
            AdapterConfig::Local(config) => Arc::new(LocalAdapter::new(&config)?),
            AdapterConfig::AliOss(config) => Arc::new(alioss::build(&config)?),
            AdapterConfig::HwObs(config) => Arc::new(hwobs::build(&config)?),
            AdapterConfig::TxCos(config) => Arc::new(txcos::build(&config)?),
            AdapterConfig::Minio(config) => Arc::new(minio::build(&config)?),
        };
        Ok(adapter)
    }
}

/// Shorthand for [`AdapterFactory::from_config`].
pub async fn new_adapter(config: impl Into<AdapterConfig>) -> StorageResult<Arc<dyn Adapter>> {
    AdapterFactory::from_config(config.into()).await
}
