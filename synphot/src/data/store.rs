//! Local data store for filter profiles and calibration spectra.
//!
//! Downloads are cached under a root directory (`~/.synphot` by default).
//! Files are written once and never overwritten:
//!
//! ```text
//! <root>/synphot_config.json
//! <root>/filters/<Facility>/<Instrument>.<Band>.dat
//! <root>/filters/<Facility>/<Instrument>.<Band>.xml
//! <root>/calibration/alpha_lyr_stis_011.fits
//! ```

use std::path::{Path, PathBuf};

use crate::config::{PhotometryConfig, CONFIG_FILE_NAME};
use crate::error::PhotometryError;
use crate::photometry::{FilterId, FilterProfile, SampledSpectrum};

use super::calspec::read_calspec;
use super::fetch::DataSource;
use super::svo::{read_svo_file, read_svo_metadata, svo_metadata_url, svo_url};

/// Outcome of [`DataStore::initialize`]
#[derive(Debug, Clone, PartialEq)]
pub struct InitReport {
    pub root: PathBuf,
    pub config_path: PathBuf,

    /// Whether the configuration file was written by this call
    pub created: bool,
}

/// Data store manager for cached photometric data
#[derive(Debug, Clone)]
pub struct DataStore {
    /// Root directory for all cached data (e.g., ~/.synphot)
    root_path: PathBuf,

    config: PhotometryConfig,
}

impl DataStore {
    /// Open the store at the default path (~/.synphot)
    pub fn new() -> Result<Self, PhotometryError> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set")
        })?;
        Self::with_path(PathBuf::from(home).join(".synphot"))
    }

    /// Open the store at a custom root path
    ///
    /// Reads the configuration file when present, defaults otherwise. The
    /// directory does not need to exist yet.
    pub fn with_path(root_path: PathBuf) -> Result<Self, PhotometryError> {
        let config_path = root_path.join(CONFIG_FILE_NAME);
        let config = if config_path.exists() {
            PhotometryConfig::load_from_file(&config_path)?
        } else {
            PhotometryConfig::default()
        };

        Ok(Self { root_path, config })
    }

    /// Use an explicit configuration instead of the one on disk
    pub fn with_config(mut self, config: PhotometryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config(&self) -> &PhotometryConfig {
        &self.config
    }

    pub fn config_path(&self) -> PathBuf {
        self.root_path.join(CONFIG_FILE_NAME)
    }

    fn filters_dir(&self) -> PathBuf {
        self.root_path.join("filters")
    }

    fn calibration_dir(&self) -> PathBuf {
        self.root_path.join("calibration")
    }

    /// Cache location of a filter's transmission table
    pub fn filter_path(&self, id: &FilterId) -> PathBuf {
        let facility = sanitize(&id.facility);
        let file_name = format!("{}.{}.dat", sanitize(&id.instrument), sanitize(&id.band));
        self.filters_dir().join(facility).join(file_name)
    }

    /// Cache location of a filter's VOTable metadata
    pub fn filter_metadata_path(&self, id: &FilterId) -> PathBuf {
        self.filter_path(id).with_extension("xml")
    }

    /// Cache location of the Vega spectrum, named after the source file
    pub fn vega_path(&self) -> PathBuf {
        let file_name = self
            .config
            .vega_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(sanitize)
            .unwrap_or_else(|| "vega.fits".to_string());
        self.calibration_dir().join(file_name)
    }

    /// Create the store directories and configuration file if absent
    ///
    /// Safe to call repeatedly; an existing configuration is left untouched.
    pub fn initialize(&self) -> Result<InitReport, PhotometryError> {
        std::fs::create_dir_all(self.filters_dir())?;
        std::fs::create_dir_all(self.calibration_dir())?;

        let config_path = self.config_path();
        let created = !config_path.exists();
        if created {
            self.config.save_to_file(&config_path)?;
            log::info!("Created configuration file: {}", config_path.display());
        } else {
            log::info!("Configuration file already exists: {}", config_path.display());
        }
        log::info!("Data folder: {}", self.root_path.display());

        Ok(InitReport {
            root: self.root_path.clone(),
            config_path,
            created,
        })
    }

    /// Load a filter profile, fetching it from the filter service if not cached
    ///
    /// The detector type comes from the filter's metadata document. The
    /// configured `detector_type` applies only when the metadata has none.
    pub fn load_filter(
        &self,
        id: &FilterId,
        source: &dyn DataSource,
    ) -> Result<FilterProfile, PhotometryError> {
        let url = svo_url(&self.config.filter_url, id)?;
        let profile = self.acquire(&self.filter_path(id), &url, source, |path| {
            read_svo_file(path, id)
        })?;

        let metadata_url = svo_metadata_url(&self.config.filter_metadata_url, id)?;
        let fallback = self.config.detector_type;
        let detector_type =
            self.acquire(&self.filter_metadata_path(id), &metadata_url, source, |path| {
                read_svo_metadata(path, id, fallback)
            })?;

        Ok(profile.with_detector_type(detector_type))
    }

    /// Load the Vega spectrum, fetching it if not cached
    pub fn load_vega(&self, source: &dyn DataSource) -> Result<SampledSpectrum, PhotometryError> {
        self.acquire(&self.vega_path(), &self.config.vega_url, source, read_calspec)
    }

    /// Read `path`, or download `url` into it first when missing
    ///
    /// Downloads go to a sibling `.part` file that is parsed before being
    /// renamed into place, so the cache never holds a file that failed to parse.
    fn acquire<T, F>(
        &self,
        path: &Path,
        url: &str,
        source: &dyn DataSource,
        parse: F,
    ) -> Result<T, PhotometryError>
    where
        F: Fn(&Path) -> Result<T, PhotometryError>,
    {
        if path.exists() {
            log::debug!("Using cached {}", path.display());
            return parse(path);
        }

        let bytes = source.fetch(url)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let partial = partial_path(path);
        std::fs::write(&partial, bytes)?;

        match parse(&partial) {
            Ok(value) => {
                std::fs::rename(&partial, path)?;
                log::info!("Cached {url} at {}", path.display());
                Ok(value)
            }
            Err(e) => {
                std::fs::remove_file(&partial).ok();
                Err(e)
            }
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Make a name component safe to use as a single path segment
fn sanitize(component: &str) -> String {
    if component == "." || component == ".." {
        return "_".repeat(component.len());
    }

    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}
