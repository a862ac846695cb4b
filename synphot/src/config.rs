//! Configuration for the local data store.
//!
//! Stored as `synphot_config.json` in the data store root. Every key is
//! optional; missing keys take their default value.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PhotometryError;
use crate::photometry::{DetectorType, DEFAULT_VEGA_MAG};

/// File name of the configuration inside the data store root
pub const CONFIG_FILE_NAME: &str = "synphot_config.json";

/// SVO Filter Profile Service data endpoint
pub const DEFAULT_FILTER_URL: &str = "https://svo2.cab.inta-csic.es/theory/fps/getdata.php";

/// SVO Filter Profile Service metadata endpoint (VOTable)
pub const DEFAULT_FILTER_METADATA_URL: &str = "https://svo2.cab.inta-csic.es/theory/fps/fps.php";

/// CALSPEC STIS spectrum of Vega
pub const DEFAULT_VEGA_URL: &str =
    "https://archive.stsci.edu/hlsps/reference-atlases/cdbs/current_calspec/alpha_lyr_stis_011.fits";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotometryConfig {
    /// Magnitude of Vega used by new converters
    pub vega_mag: f64,

    /// Base URL of the filter profile service
    pub filter_url: String,

    /// Base URL of the filter metadata service
    pub filter_metadata_url: String,

    /// URL of the Vega reference spectrum (FITS)
    pub vega_url: String,

    /// Timeout for each download, in seconds
    pub timeout_secs: u64,

    /// Detector type for filters whose metadata does not declare one
    pub detector_type: DetectorType,
}

impl Default for PhotometryConfig {
    fn default() -> Self {
        Self {
            vega_mag: DEFAULT_VEGA_MAG,
            filter_url: DEFAULT_FILTER_URL.to_string(),
            filter_metadata_url: DEFAULT_FILTER_METADATA_URL.to_string(),
            vega_url: DEFAULT_VEGA_URL.to_string(),
            timeout_secs: 60,
            detector_type: DetectorType::Energy,
        }
    }
}

impl PhotometryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), PhotometryError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, PhotometryError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;

        if !config.vega_mag.is_finite() {
            return Err(PhotometryError::domain(format!(
                "vega_mag in {} must be finite",
                path.display()
            )));
        }
        Ok(config)
    }
}
