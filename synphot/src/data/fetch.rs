//! Retrieval of remote data files

use std::time::Duration;

use crate::config::PhotometryConfig;
use crate::error::PhotometryError;

/// Anything that can hand back the bytes behind a URL
pub trait DataSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PhotometryError>;
}

/// Blocking HTTP(S) source
pub struct HttpSource {
    agent: ureq::Agent,
}

impl HttpSource {
    /// Create a source whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }

    pub fn from_config(config: &PhotometryConfig) -> Self {
        Self::new(config.timeout())
    }
}

impl DataSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PhotometryError> {
        log::info!("Downloading {url}");

        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| PhotometryError::acquisition(url, e))?;

        let bytes = response
            .body_mut()
            .with_config()
            .limit(64 * 1024 * 1024)
            .read_to_vec()
            .map_err(|e| PhotometryError::acquisition(url, e))?;

        log::debug!("Downloaded {} bytes from {url}", bytes.len());
        Ok(bytes)
    }
}
