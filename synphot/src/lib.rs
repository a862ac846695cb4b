//! Synthetic photometry calibrated against Vega
//!
//! Converts apparent magnitudes to flux densities and back for a named
//! filter. Filter transmission curves come from the SVO Filter Profile
//! Service and the Vega spectrum from CALSPEC; both are downloaded on first
//! use and cached in a local data store.
//!
//! ```no_run
//! use synphot::{DataStore, SyntheticPhotometry};
//!
//! let store = DataStore::new()?;
//! store.initialize()?;
//!
//! let photometry = SyntheticPhotometry::new("JWST/NIRCam.F115W", &store)?;
//! let (flux, error) = photometry.magnitude_to_flux(15.0, Some(0.2))?;
//! let (apparent, absolute) = photometry.flux_to_magnitude(flux, 30.0)?;
//! # Ok::<(), synphot::PhotometryError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod photometry;

pub use config::PhotometryConfig;
pub use data::{DataSource, DataStore, HttpSource, InitReport};
pub use error::PhotometryError;
pub use photometry::{
    DetectorType, FilterId, FilterProfile, Magnitude, SampledSpectrum, Spectrum,
    SyntheticPhotometry, DEFAULT_VEGA_MAG,
};
