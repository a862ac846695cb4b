//! Crate-level error type

use thiserror::Error;

use crate::photometry::{FilterError, SpectrumError, TrapezoidError};

/// Errors returned by photometric conversions and data acquisition
#[derive(Debug, Error)]
pub enum PhotometryError {
    /// Input outside the mathematical domain of a conversion
    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Spectrum error: {0}")]
    Spectrum(#[from] SpectrumError),

    #[error("Integration error: {0}")]
    Integration(#[from] TrapezoidError),

    #[error("Spectrum covers {spectrum_um:?} µm but filter {filter} spans {filter_um:?} µm")]
    Coverage {
        filter: String,
        filter_um: (f64, f64),
        spectrum_um: (f64, f64),
    },

    /// Filter or reference data could not be obtained
    #[error("Failed to acquire {resource}: {reason}")]
    Acquisition { resource: String, reason: String },

    #[error("FITS error: {0}")]
    Fits(#[from] fitsio::errors::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl PhotometryError {
    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub(crate) fn acquisition(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::Acquisition {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}
