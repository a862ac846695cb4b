//! Filter transmission profiles
//!
//! A filter is identified by a `Facility/Instrument.Band` name, the naming
//! used by the SVO Filter Profile Service, and carries a sampled
//! wavelength-dependent transmission curve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::trapezoid::{interpolate, trap_integrate, TrapezoidError};

/// Errors that can occur when building a filter profile
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Invalid filter name '{0}', expected Facility/Instrument.Band")]
    InvalidId(String),

    #[error("Wavelength and transmission vectors must have the same length")]
    LengthMismatch,

    #[error("Filter profile needs at least 2 samples, got {0}")]
    TooFewPoints(usize),

    #[error("Wavelengths must be positive and in ascending order")]
    NotAscending,

    #[error("Transmission values must be finite and non-negative")]
    InvalidTransmission,

    #[error("Filter {0} has no transmission")]
    Opaque(String),
}

/// How a detector weights the incoming flux when averaging over a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorType {
    /// Bolometric detector, weight = T(λ)
    #[default]
    Energy,
    /// Photon counting detector (CCD, HgCdTe), weight = λ·T(λ)
    Photon,
}

/// Parsed `Facility/Instrument.Band` filter name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterId {
    pub facility: String,
    pub instrument: String,
    pub band: String,
}

impl FilterId {
    pub fn parse(name: &str) -> Result<Self, FilterError> {
        let invalid = || FilterError::InvalidId(name.to_string());

        let (facility, rest) = name.trim().split_once('/').ok_or_else(invalid)?;
        // Band names can contain dots (e.g. "Paranal/NACO.NB4.05"), so split at the first one
        let (instrument, band) = rest.split_once('.').ok_or_else(invalid)?;
        let (facility, instrument, band) = (facility.trim(), instrument.trim(), band.trim());

        // Each part becomes a cache path component
        let is_valid_part = |part: &str| {
            !part.is_empty()
                && part != "."
                && part != ".."
                && !part
                    .chars()
                    .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
        };
        if ![facility, instrument, band].into_iter().all(is_valid_part) {
            return Err(invalid());
        }

        Ok(Self {
            facility: facility.to_string(),
            instrument: instrument.to_string(),
            band: band.to_string(),
        })
    }
}

impl FromStr for FilterId {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.facility, self.instrument, self.band)
    }
}

/// Wavelength-dependent transmission of an instrument/filter combination
///
/// Wavelengths are stored in micrometers. The profile is immutable once
/// built; the transmission is linearly interpolated between samples and is
/// zero outside the sampled range.
#[derive(Debug, Clone)]
pub struct FilterProfile {
    id: FilterId,

    /// Wavelengths in micrometers (µm), strictly ascending
    wavelengths: Vec<f64>,

    /// Transmission at each wavelength
    transmissions: Vec<f64>,

    detector_type: DetectorType,
}

impl FilterProfile {
    /// Create a new filter profile from wavelength and transmission tables
    ///
    /// # Arguments
    ///
    /// * `id` - Filter name
    /// * `wavelengths` - Wavelengths in µm, must be positive and strictly ascending
    /// * `transmissions` - Transmission at each wavelength, finite and ≥ 0
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The vectors have different lengths
    /// - Fewer than two samples are given
    /// - Wavelengths are not positive and ascending
    /// - Any transmission is negative or non-finite
    /// - The transmission is zero everywhere
    pub fn from_table(
        id: FilterId,
        wavelengths: Vec<f64>,
        transmissions: Vec<f64>,
    ) -> Result<Self, FilterError> {
        if wavelengths.len() != transmissions.len() {
            return Err(FilterError::LengthMismatch);
        }

        if wavelengths.len() < 2 {
            return Err(FilterError::TooFewPoints(wavelengths.len()));
        }

        if !wavelengths.iter().all(|w| w.is_finite() && *w > 0.0)
            || wavelengths.windows(2).any(|pair| pair[1] <= pair[0])
        {
            return Err(FilterError::NotAscending);
        }

        if !transmissions.iter().all(|t| t.is_finite() && *t >= 0.0) {
            return Err(FilterError::InvalidTransmission);
        }

        if transmissions.iter().all(|&t| t == 0.0) {
            return Err(FilterError::Opaque(id.to_string()));
        }

        Ok(Self {
            id,
            wavelengths,
            transmissions,
            detector_type: DetectorType::default(),
        })
    }

    /// Create a top-hat filter with constant transmission between two wavelengths
    ///
    /// The edges drop to zero over a negligible distance so the profile
    /// integrates like an ideal box.
    pub fn top_hat(
        id: FilterId,
        lower_um: f64,
        upper_um: f64,
        transmission: f64,
    ) -> Result<Self, FilterError> {
        let smol = 1e-9;
        let wavelengths = vec![lower_um - smol, lower_um, upper_um, upper_um + smol];
        let transmissions = vec![0.0, transmission, transmission, 0.0];
        Self::from_table(id, wavelengths, transmissions)
    }

    pub fn with_detector_type(mut self, detector_type: DetectorType) -> Self {
        self.detector_type = detector_type;
        self
    }

    pub fn id(&self) -> &FilterId {
        &self.id
    }

    pub fn detector_type(&self) -> DetectorType {
        self.detector_type
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn transmissions(&self) -> &[f64] {
        &self.transmissions
    }

    /// Get the transmission at a specific wavelength
    ///
    /// Returns 0.0 outside the sampled range.
    pub fn at(&self, wavelength_um: f64) -> f64 {
        interpolate(&self.wavelengths, &self.transmissions, wavelength_um)
    }

    /// First and last sampled wavelength in µm
    pub fn wavelength_range(&self) -> (f64, f64) {
        // from_table guarantees at least two samples
        (
            self.wavelengths[0],
            self.wavelengths[self.wavelengths.len() - 1],
        )
    }

    /// Integrate `T(λ) · f(λ)` over the filter's own wavelength grid
    pub fn integrate<F>(&self, f: F) -> Result<f64, TrapezoidError>
    where
        F: Fn(f64) -> f64,
    {
        trap_integrate(&self.wavelengths, |wl| self.at(wl) * f(wl))
    }

    /// Transmission-weighted mean wavelength, ∫λT dλ / ∫T dλ, in µm
    pub fn mean_wavelength(&self) -> Result<f64, TrapezoidError> {
        let weighted = self.integrate(|wl| wl)?;
        let total = self.integrate(|_| 1.0)?;
        Ok(weighted / total)
    }

    /// Width of a box with the peak transmission and the same area, in µm
    pub fn effective_width(&self) -> Result<f64, TrapezoidError> {
        let total = self.integrate(|_| 1.0)?;
        let peak = self.transmissions.iter().cloned().fold(0.0, f64::max);
        Ok(total / peak)
    }
}
