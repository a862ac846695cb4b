//! Spectrum model for synthetic photometry
//!
//! All spectra are expressed with wavelengths in micrometers and flux
//! densities in W m⁻² µm⁻¹.

use thiserror::Error;

use super::extinction::ism_extinction;
use super::trapezoid::interpolate;

/// Unit conversion factors into the µm / W m⁻² µm⁻¹ system
pub struct Units {}

impl Units {
    /// Angstrom to micrometer
    pub const ANGSTROM_TO_MICRON: f64 = 1e-4;

    /// erg s⁻¹ cm⁻² Å⁻¹ to W m⁻² µm⁻¹
    /// 1e-7 W per erg, 1e4 cm² per m², 1e4 Å per µm
    pub const FLAM_TO_W_M2_UM: f64 = 10.0;
}

/// Errors that can occur when building a spectrum
#[derive(Debug, Error, PartialEq)]
pub enum SpectrumError {
    #[error("Wavelength and flux vectors must have the same length")]
    LengthMismatch,

    #[error("Spectrum needs at least 2 samples, got {0}")]
    TooFewPoints(usize),

    #[error("Wavelengths must be positive and in ascending order")]
    NotAscending,

    #[error("Flux densities must be finite")]
    NonFinite,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Trait representing a spectral energy distribution
pub trait Spectrum: Send + Sync {
    /// Flux density at the given wavelength in W m⁻² µm⁻¹
    ///
    /// Returns 0.0 outside the spectrum's range.
    fn flux_density(&self, wavelength_um: f64) -> f64;

    /// Wavelength range covered by the spectrum, `None` when unbounded
    fn wavelength_range(&self) -> Option<(f64, f64)>;

    /// Wavelengths at which the spectrum is sampled
    ///
    /// Integration grids include these points so narrow features are not
    /// skipped over. Analytic spectra return an empty slice.
    fn sample_wavelengths(&self) -> &[f64] {
        &[]
    }
}

/// A spectrum with constant flux density per unit wavelength
#[derive(Debug, Clone)]
pub struct FlatSpectrum {
    /// Flux density in W m⁻² µm⁻¹
    flux_density: f64,
}

impl FlatSpectrum {
    pub fn new(flux_density: f64) -> Self {
        Self { flux_density }
    }

    pub fn unit() -> Self {
        Self::new(1.0)
    }
}

impl Spectrum for FlatSpectrum {
    fn flux_density(&self, wavelength_um: f64) -> f64 {
        if wavelength_um <= 0.0 {
            return 0.0;
        }
        self.flux_density
    }

    fn wavelength_range(&self) -> Option<(f64, f64)> {
        None
    }
}

/// A tabulated spectrum, linearly interpolated between samples
#[derive(Debug, Clone)]
pub struct SampledSpectrum {
    /// Wavelengths in micrometers (µm), strictly ascending
    wavelengths: Vec<f64>,

    /// Flux densities in W m⁻² µm⁻¹
    fluxes: Vec<f64>,
}

impl SampledSpectrum {
    /// Create a new spectrum from wavelength and flux density tables
    ///
    /// # Arguments
    ///
    /// * `wavelengths` - Wavelengths in µm, positive and strictly ascending
    /// * `fluxes` - Flux densities in W m⁻² µm⁻¹
    pub fn new(wavelengths: Vec<f64>, fluxes: Vec<f64>) -> Result<Self, SpectrumError> {
        if wavelengths.len() != fluxes.len() {
            return Err(SpectrumError::LengthMismatch);
        }

        if wavelengths.len() < 2 {
            return Err(SpectrumError::TooFewPoints(wavelengths.len()));
        }

        if !wavelengths.iter().all(|w| w.is_finite() && *w > 0.0)
            || wavelengths.windows(2).any(|pair| pair[1] <= pair[0])
        {
            return Err(SpectrumError::NotAscending);
        }

        if !fluxes.iter().all(|f| f.is_finite()) {
            return Err(SpectrumError::NonFinite);
        }

        Ok(Self {
            wavelengths,
            fluxes,
        })
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn fluxes(&self) -> &[f64] {
        &self.fluxes
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Copy of this spectrum with every flux density multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Result<Self, SpectrumError> {
        if !factor.is_finite() {
            return Err(SpectrumError::InvalidParameter(format!(
                "scale factor must be finite, got {factor}"
            )));
        }

        let fluxes = self.fluxes.iter().map(|f| f * factor).collect();
        Self::new(self.wavelengths.clone(), fluxes)
    }

    /// Copy of this spectrum dimmed by interstellar extinction
    ///
    /// # Arguments
    ///
    /// * `av_mag` - Extinction in the V band (mag), finite
    /// * `rv` - Total-to-selective extinction ratio, `R_V = A_V / E(B-V)`, positive
    pub fn with_extinction(&self, av_mag: f64, rv: f64) -> Result<Self, SpectrumError> {
        if !av_mag.is_finite() {
            return Err(SpectrumError::InvalidParameter(format!(
                "A_V must be finite, got {av_mag}"
            )));
        }
        if !(rv.is_finite() && rv > 0.0) {
            return Err(SpectrumError::InvalidParameter(format!(
                "R_V must be positive, got {rv}"
            )));
        }

        let extinction = ism_extinction(av_mag, rv, &self.wavelengths);
        let fluxes = self
            .fluxes
            .iter()
            .zip(extinction)
            .map(|(flux, a_mag)| flux * 10f64.powf(-0.4 * a_mag))
            .collect();

        // Extreme extinction can still overflow, new() rejects that
        Self::new(self.wavelengths.clone(), fluxes)
    }
}

impl Spectrum for SampledSpectrum {
    fn flux_density(&self, wavelength_um: f64) -> f64 {
        interpolate(&self.wavelengths, &self.fluxes, wavelength_um)
    }

    fn wavelength_range(&self) -> Option<(f64, f64)> {
        Some((
            self.wavelengths[0],
            self.wavelengths[self.wavelengths.len() - 1],
        ))
    }

    fn sample_wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sampled_spectrum_interpolation() {
        let spectrum = SampledSpectrum::new(vec![1.0, 2.0, 3.0], vec![4.0, 2.0, 1.0]).unwrap();

        assert_eq!(spectrum.flux_density(1.0), 4.0);
        assert_relative_eq!(spectrum.flux_density(1.5), 3.0);
        assert_relative_eq!(spectrum.flux_density(2.5), 1.5);
        assert_eq!(spectrum.flux_density(0.5), 0.0);
        assert_eq!(spectrum.flux_density(3.5), 0.0);
        assert_eq!(spectrum.wavelength_range(), Some((1.0, 3.0)));
        assert_eq!(spectrum.len(), 3);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(
            SampledSpectrum::new(vec![1.0, 2.0], vec![1.0]).unwrap_err(),
            SpectrumError::LengthMismatch
        );
        assert_eq!(
            SampledSpectrum::new(vec![1.0], vec![1.0]).unwrap_err(),
            SpectrumError::TooFewPoints(1)
        );
        assert_eq!(
            SampledSpectrum::new(vec![1.0, 1.0], vec![1.0, 1.0]).unwrap_err(),
            SpectrumError::NotAscending
        );
        assert_eq!(
            SampledSpectrum::new(vec![-1.0, 1.0], vec![1.0, 1.0]).unwrap_err(),
            SpectrumError::NotAscending
        );
        assert_eq!(
            SampledSpectrum::new(vec![1.0, 2.0], vec![1.0, f64::NAN]).unwrap_err(),
            SpectrumError::NonFinite
        );
    }

    #[test]
    fn test_scaled() {
        let spectrum = SampledSpectrum::new(vec![1.0, 2.0], vec![1.0, 3.0]).unwrap();
        let brighter = spectrum.scaled(100.0).unwrap();

        assert_eq!(brighter.fluxes(), &[100.0, 300.0]);
        assert_eq!(brighter.wavelengths(), spectrum.wavelengths());
    }

    #[test]
    fn test_extinction_dims_blue_more_than_red() {
        let spectrum = SampledSpectrum::new(vec![0.4, 0.55, 2.2], vec![1.0, 1.0, 1.0]).unwrap();
        let reddened = spectrum.with_extinction(1.0, 3.1).unwrap();

        let fluxes = reddened.fluxes();
        assert!(fluxes[0] < fluxes[1]);
        assert!(fluxes[1] < fluxes[2]);
        assert!(fluxes[2] < 1.0);

        // A_V = 1 at 0.55 µm dims by ~40%
        assert_relative_eq!(fluxes[1], 10f64.powf(-0.4), epsilon = 0.02);
    }

    #[test]
    fn test_scaled_rejects_non_finite_factor() {
        let spectrum = SampledSpectrum::new(vec![1.0, 2.0], vec![1.0, 1.0]).unwrap();

        assert!(matches!(
            spectrum.scaled(f64::NAN),
            Err(SpectrumError::InvalidParameter(_))
        ));
        assert!(matches!(
            spectrum.scaled(f64::INFINITY),
            Err(SpectrumError::InvalidParameter(_))
        ));

        // Finite factor that overflows the fluxes
        let bright = SampledSpectrum::new(vec![1.0, 2.0], vec![1e300, 1e300]).unwrap();
        assert_eq!(bright.scaled(1e300).unwrap_err(), SpectrumError::NonFinite);
    }

    #[test]
    fn test_extinction_rejects_bad_parameters() {
        let spectrum = SampledSpectrum::new(vec![1.0, 2.0], vec![1.0, 1.0]).unwrap();

        for (av_mag, rv) in [
            (1.0, 0.0),
            (1.0, -3.1),
            (1.0, f64::NAN),
            (f64::INFINITY, 3.1),
            (f64::NAN, 3.1),
        ] {
            assert!(
                matches!(
                    spectrum.with_extinction(av_mag, rv),
                    Err(SpectrumError::InvalidParameter(_))
                ),
                "A_V {av_mag} R_V {rv} should be rejected"
            );
        }
    }

    #[test]
    fn test_flat_spectrum() {
        let spectrum = FlatSpectrum::new(2.5);

        assert_eq!(spectrum.flux_density(0.5), 2.5);
        assert_eq!(spectrum.flux_density(5.0), 2.5);
        assert_eq!(spectrum.flux_density(0.0), 0.0);
        assert!(spectrum.wavelength_range().is_none());
        assert!(spectrum.sample_wavelengths().is_empty());
    }

    #[test]
    fn test_unit_conversions() {
        // Vega at 5556 Å is ~3.44e-9 erg s⁻¹ cm⁻² Å⁻¹
        let wavelength_um = 5556.0 * Units::ANGSTROM_TO_MICRON;
        let flux = 3.44e-9 * Units::FLAM_TO_W_M2_UM;

        assert_relative_eq!(wavelength_um, 0.5556, epsilon = 1e-12);
        assert_relative_eq!(flux, 3.44e-8, epsilon = 1e-20);
    }
}
