//! Shared state every command starts from.

use std::path::PathBuf;
use std::sync::Arc;

use romm_sync_client::{Host, Platform, RommClient};
use romm_sync_lib::settings::settings_path;
use romm_sync_lib::{CatalogCache, Config, DevicePaths, SignatureStore};

use crate::CliError;

pub(crate) struct AppContext {
    pub config_path: PathBuf,
    pub config: Config,
    pub quiet: bool,
}

impl AppContext {
    pub(crate) fn load(config_path: Option<PathBuf>, quiet: bool) -> Result<Self, CliError> {
        let config_path = config_path.unwrap_or_else(settings_path);
        let config = Config::load(&config_path)?;
        Ok(Self {
            config_path,
            config,
            quiet,
        })
    }

    pub(crate) fn host(&self) -> Result<&Host, CliError> {
        self.config.primary_host().ok_or_else(|| {
            CliError::config(format!(
                "no host configured; add a [[hosts]] entry to {}",
                self.config_path.display()
            ))
        })
    }

    /// Client for API calls.
    pub(crate) fn client(&self) -> Result<RommClient, CliError> {
        Ok(RommClient::new(self.host()?, self.config.api_timeout())?)
    }

    /// Client with the longer timeout used for file transfers.
    pub(crate) fn download_client(&self) -> Result<RommClient, CliError> {
        Ok(RommClient::new(self.host()?, self.config.download_timeout())?)
    }

    pub(crate) fn paths(&self) -> Result<DevicePaths, CliError> {
        Ok(DevicePaths::resolve(&self.config)?)
    }

    pub(crate) fn cache(&self) -> Arc<CatalogCache> {
        Arc::new(CatalogCache::in_root(&self.config.cache_root()))
    }

    pub(crate) fn signatures(&self) -> Arc<SignatureStore> {
        Arc::new(SignatureStore::in_root(&self.config.cache_root()))
    }
}

/// Keep the platforms named in `wanted`, or all of them when it is `None`.
/// Unknown names are an error.
pub(crate) fn select_platforms(
    all: Vec<Platform>,
    wanted: Option<&[String]>,
) -> Result<Vec<Platform>, CliError> {
    let Some(wanted) = wanted else {
        return Ok(all);
    };
    for slug in wanted {
        if !all.iter().any(|p| &p.slug == slug) {
            return Err(CliError::not_found(format!("platform '{slug}' on the server")));
        }
    }
    Ok(all.into_iter().filter(|p| wanted.contains(&p.slug)).collect())
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create tokio runtime: {}", e)))
}
