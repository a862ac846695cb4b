//! Vega-calibrated synthetic photometry
//!
//! Converts between magnitudes and flux densities for a single filter. The
//! zero point is the Vega spectrum averaged over the filter's transmission,
//! anchored to a reference magnitude for Vega (0.03 by default).

use std::f64::consts::LN_10;

use super::filter::{DetectorType, FilterId, FilterProfile};
use super::spectrum::{SampledSpectrum, Spectrum};
use super::trapezoid::trap_integrate;
use crate::data::{DataSource, DataStore, HttpSource};
use crate::error::PhotometryError;

/// Default magnitude of Vega in every band
pub const DEFAULT_VEGA_MAG: f64 = 0.03;

/// A magnitude with an optional 1σ uncertainty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Magnitude {
    pub value: f64,
    pub error: Option<f64>,
}

/// Converter between magnitudes and flux densities through one filter
///
/// Built once per filter; the zero-point flux is computed at construction.
/// Only the reference magnitude can change afterwards, and results are plain
/// values, so changing it never affects results already returned.
#[derive(Debug, Clone)]
pub struct SyntheticPhotometry {
    filter: FilterProfile,
    vega: SampledSpectrum,

    /// Vega flux density averaged over the filter, W m⁻² µm⁻¹
    zero_point: f64,

    vega_mag: f64,
}

impl SyntheticPhotometry {
    /// Build a converter for a named filter, downloading data if needed
    ///
    /// The filter profile and the Vega spectrum are read from the data store
    /// when present, otherwise fetched over HTTP and cached there.
    ///
    /// # Arguments
    ///
    /// * `filter_name` - Filter name, e.g. `JWST/NIRCam.F115W`
    /// * `store` - Local data store
    pub fn new(filter_name: &str, store: &DataStore) -> Result<Self, PhotometryError> {
        let source = HttpSource::from_config(store.config());
        Self::with_source(filter_name, store, &source)
    }

    /// Build a converter for a named filter, fetching missing data from `source`
    pub fn with_source(
        filter_name: &str,
        store: &DataStore,
        source: &dyn DataSource,
    ) -> Result<Self, PhotometryError> {
        let id = FilterId::parse(filter_name)?;
        let filter = store.load_filter(&id, source)?;
        let vega = store.load_vega(source)?;

        let mut photometry = Self::from_parts(filter, vega)?;
        photometry.set_vega_mag(store.config().vega_mag)?;
        Ok(photometry)
    }

    /// Build a converter from an already loaded filter and Vega spectrum
    pub fn from_parts(filter: FilterProfile, vega: SampledSpectrum) -> Result<Self, PhotometryError> {
        let zero_point = band_average(&filter, &vega)?;
        if !(zero_point.is_finite() && zero_point > 0.0) {
            return Err(PhotometryError::domain(format!(
                "Vega zero point for {} is not positive: {zero_point}",
                filter.id()
            )));
        }

        log::debug!(
            "Zero point for {}: {:.4e} W m-2 um-1",
            filter.id(),
            zero_point
        );

        Ok(Self {
            filter,
            vega,
            zero_point,
            vega_mag: DEFAULT_VEGA_MAG,
        })
    }

    pub fn filter(&self) -> &FilterProfile {
        &self.filter
    }

    pub fn vega_spectrum(&self) -> &SampledSpectrum {
        &self.vega
    }

    /// Flux density of Vega averaged over the filter, in W m⁻² µm⁻¹
    pub fn zero_point(&self) -> f64 {
        self.zero_point
    }

    pub fn vega_mag(&self) -> f64 {
        self.vega_mag
    }

    /// Change the reference magnitude used by subsequent conversions
    pub fn set_vega_mag(&mut self, vega_mag: f64) -> Result<(), PhotometryError> {
        if !vega_mag.is_finite() {
            return Err(PhotometryError::domain(format!(
                "Vega magnitude must be finite, got {vega_mag}"
            )));
        }
        self.vega_mag = vega_mag;
        Ok(())
    }

    /// Convert an apparent magnitude to a flux density
    ///
    /// # Arguments
    ///
    /// * `magnitude` - Apparent magnitude in this filter
    /// * `error` - Optional 1σ magnitude uncertainty
    ///
    /// # Returns
    ///
    /// Flux density and its uncertainty in W m⁻² µm⁻¹. The uncertainty is
    /// `None` when no magnitude error is given.
    pub fn magnitude_to_flux(
        &self,
        magnitude: f64,
        error: Option<f64>,
    ) -> Result<(f64, Option<f64>), PhotometryError> {
        self.magnitude_to_flux_with_zero_point(magnitude, error, self.zero_point)
    }

    /// Convert a magnitude to a flux density using an external zero point
    ///
    /// Useful when a published zero-point flux should replace the one
    /// derived from the Vega spectrum.
    pub fn magnitude_to_flux_with_zero_point(
        &self,
        magnitude: f64,
        error: Option<f64>,
        zero_point: f64,
    ) -> Result<(f64, Option<f64>), PhotometryError> {
        if !magnitude.is_finite() {
            return Err(PhotometryError::domain(format!(
                "Magnitude must be finite, got {magnitude}"
            )));
        }
        if !(zero_point.is_finite() && zero_point > 0.0) {
            return Err(PhotometryError::domain(format!(
                "Zero-point flux must be positive, got {zero_point}"
            )));
        }
        if let Some(error) = error {
            if !(error.is_finite() && error >= 0.0) {
                return Err(PhotometryError::domain(format!(
                    "Magnitude error must be non-negative, got {error}"
                )));
            }
        }

        let flux = zero_point * 10f64.powf(-0.4 * (magnitude - self.vega_mag));
        if !flux.is_finite() {
            return Err(PhotometryError::domain(format!(
                "Flux density for magnitude {magnitude} overflows"
            )));
        }

        // First order propagation: dF/dm = -0.4 ln(10) F
        let flux_error = error.map(|error| flux * 0.4 * LN_10 * error);
        if let Some(flux_error) = flux_error.filter(|e| !e.is_finite()) {
            return Err(PhotometryError::domain(format!(
                "Flux density error overflows: {flux_error}"
            )));
        }

        Ok((flux, flux_error))
    }

    /// Convert a flux density to apparent and absolute magnitudes
    ///
    /// # Arguments
    ///
    /// * `flux` - Flux density in W m⁻² µm⁻¹, must be positive
    /// * `distance_pc` - Distance in parsecs, must be positive
    ///
    /// # Returns
    ///
    /// `(apparent, absolute)` magnitudes
    pub fn flux_to_magnitude(
        &self,
        flux: f64,
        distance_pc: f64,
    ) -> Result<(f64, f64), PhotometryError> {
        let apparent = self.apparent_magnitude(flux)?;
        let absolute = apparent - distance_modulus(distance_pc)?;
        Ok((apparent, absolute))
    }

    /// Convert a flux density to magnitudes, propagating uncertainties
    ///
    /// # Arguments
    ///
    /// * `flux` - Flux density in W m⁻² µm⁻¹, must be positive
    /// * `flux_error` - Optional 1σ flux uncertainty
    /// * `distance` - Optional distance and its uncertainty in parsecs
    ///
    /// # Returns
    ///
    /// Apparent magnitude, and the absolute magnitude when a distance is given
    pub fn flux_to_magnitude_with_errors(
        &self,
        flux: f64,
        flux_error: Option<f64>,
        distance: Option<(f64, Option<f64>)>,
    ) -> Result<(Magnitude, Option<Magnitude>), PhotometryError> {
        let value = self.apparent_magnitude(flux)?;

        if let Some(error) = flux_error {
            if !(error.is_finite() && error >= 0.0) {
                return Err(PhotometryError::domain(format!(
                    "Flux error must be non-negative, got {error}"
                )));
            }
        }
        let apparent = Magnitude {
            value,
            error: flux_error.map(|error| 2.5 / LN_10 * error / flux),
        };

        let absolute = match distance {
            Some((distance_pc, distance_error)) => {
                let modulus = distance_modulus(distance_pc)?;
                let modulus_error = match distance_error {
                    Some(error) if error.is_finite() && error >= 0.0 => {
                        Some(5.0 / LN_10 * error / distance_pc)
                    }
                    Some(error) => {
                        return Err(PhotometryError::domain(format!(
                            "Distance error must be non-negative, got {error}"
                        )))
                    }
                    None => None,
                };

                let error = match (apparent.error, modulus_error) {
                    (None, None) => None,
                    (a, m) => Some(a.unwrap_or(0.0).hypot(m.unwrap_or(0.0))),
                };

                Some(Magnitude {
                    value: apparent.value - modulus,
                    error,
                })
            }
            None => None,
        };

        Ok((apparent, absolute))
    }

    /// Band-averaged flux density of a spectrum through this filter
    ///
    /// Energy detectors average with weight `T(λ)`, photon counters with
    /// `λ·T(λ)`.
    ///
    /// # Errors
    ///
    /// Fails when the spectrum does not cover the filter's wavelength range.
    pub fn spectrum_to_flux<S: Spectrum + ?Sized>(&self, spectrum: &S) -> Result<f64, PhotometryError> {
        band_average(&self.filter, spectrum)
    }

    /// Magnitudes of a spectrum through this filter
    ///
    /// # Returns
    ///
    /// `(apparent, absolute)` magnitudes for a source at `distance_pc`
    pub fn spectrum_to_magnitude<S: Spectrum + ?Sized>(
        &self,
        spectrum: &S,
        distance_pc: f64,
    ) -> Result<(f64, f64), PhotometryError> {
        let flux = self.spectrum_to_flux(spectrum)?;
        self.flux_to_magnitude(flux, distance_pc)
    }

    fn apparent_magnitude(&self, flux: f64) -> Result<f64, PhotometryError> {
        if !(flux.is_finite() && flux > 0.0) {
            return Err(PhotometryError::domain(format!(
                "Flux density must be positive, got {flux}"
            )));
        }
        Ok(self.vega_mag - 2.5 * (flux / self.zero_point).log10())
    }
}

/// Distance modulus `5 log10(d / 10 pc)`
fn distance_modulus(distance_pc: f64) -> Result<f64, PhotometryError> {
    if !(distance_pc.is_finite() && distance_pc > 0.0) {
        return Err(PhotometryError::domain(format!(
            "Distance must be positive, got {distance_pc} pc"
        )));
    }
    Ok(5.0 * (distance_pc / 10.0).log10())
}

/// Average a spectrum over a filter's passband
fn band_average<S: Spectrum + ?Sized>(
    filter: &FilterProfile,
    spectrum: &S,
) -> Result<f64, PhotometryError> {
    let (lower, upper) = filter.wavelength_range();

    if let Some((spec_lower, spec_upper)) = spectrum.wavelength_range() {
        if spec_lower > lower || spec_upper < upper {
            return Err(PhotometryError::Coverage {
                filter: filter.id().to_string(),
                filter_um: (lower, upper),
                spectrum_um: (spec_lower, spec_upper),
            });
        }
    }

    // Integrate on the union of both sampling grids inside the passband
    let mut grid: Vec<f64> = filter
        .wavelengths()
        .iter()
        .chain(spectrum.sample_wavelengths())
        .copied()
        .filter(|&wl| wl >= lower && wl <= upper)
        .collect();
    grid.sort_by(f64::total_cmp);
    grid.dedup();

    let weight = |wl: f64| match filter.detector_type() {
        DetectorType::Energy => filter.at(wl),
        DetectorType::Photon => wl * filter.at(wl),
    };

    let weighted_flux = trap_integrate(&grid, |wl| weight(wl) * spectrum.flux_density(wl))?;
    let total_weight = trap_integrate(&grid, weight)?;

    if total_weight <= 0.0 {
        return Err(PhotometryError::domain(format!(
            "Filter {} has no transmission",
            filter.id()
        )));
    }

    Ok(weighted_flux / total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::FlatSpectrum;
    use approx::assert_relative_eq;

    fn test_filter() -> FilterProfile {
        FilterProfile::from_table(
            FilterId::parse("Test/Camera.Y").unwrap(),
            vec![1.0, 1.1, 1.2, 1.3],
            vec![0.0, 0.9, 0.9, 0.0],
        )
        .unwrap()
    }

    /// Power-law stand-in for Vega, F ∝ λ⁻⁴ like a hot Rayleigh-Jeans tail
    fn test_vega() -> SampledSpectrum {
        let wavelengths: Vec<f64> = (0..=200).map(|i| 0.5 + i as f64 * 0.01).collect();
        let fluxes = wavelengths.iter().map(|wl| 1e-8 * wl.powi(-4)).collect();
        SampledSpectrum::new(wavelengths, fluxes).unwrap()
    }

    fn test_photometry() -> SyntheticPhotometry {
        SyntheticPhotometry::from_parts(test_filter(), test_vega()).unwrap()
    }

    #[test]
    fn test_zero_point_of_flat_vega() {
        let flat = SampledSpectrum::new(vec![0.5, 2.5], vec![3e-9, 3e-9]).unwrap();
        let photometry = SyntheticPhotometry::from_parts(test_filter(), flat).unwrap();

        assert_relative_eq!(photometry.zero_point(), 3e-9, max_relative = 1e-12);
        assert_eq!(photometry.vega_mag(), DEFAULT_VEGA_MAG);
    }

    #[test]
    fn test_vega_is_vega_mag() {
        let photometry = test_photometry();
        let (flux, error) = photometry
            .magnitude_to_flux(DEFAULT_VEGA_MAG, None)
            .unwrap();

        assert_relative_eq!(flux, photometry.zero_point(), max_relative = 1e-12);
        assert!(error.is_none());
    }

    #[test]
    fn test_five_magnitudes_is_factor_100() {
        let photometry = test_photometry();
        let (bright, _) = photometry.magnitude_to_flux(10.0, None).unwrap();
        let (faint, _) = photometry.magnitude_to_flux(15.0, None).unwrap();

        assert_relative_eq!(bright / faint, 100.0, max_relative = 1e-12);
    }

    #[test]
    fn test_flux_error_propagation() {
        let photometry = test_photometry();
        let (flux, error) = photometry.magnitude_to_flux(15.0, Some(0.2)).unwrap();

        assert_relative_eq!(
            error.unwrap(),
            flux * 0.4 * LN_10 * 0.2,
            max_relative = 1e-12
        );

        let (_, zero_error) = photometry.magnitude_to_flux(15.0, Some(0.0)).unwrap();
        assert_eq!(zero_error, Some(0.0));
    }

    #[test]
    fn test_round_trip() {
        let photometry = test_photometry();

        for magnitude in [-1.5, 0.0, 0.03, 7.25, 15.0, 28.0] {
            let (flux, _) = photometry.magnitude_to_flux(magnitude, Some(0.0)).unwrap();
            for distance in [1.0, 10.0, 30.0, 1e4] {
                let (apparent, _) = photometry.flux_to_magnitude(flux, distance).unwrap();
                assert_relative_eq!(apparent, magnitude, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_monotonic() {
        let photometry = test_photometry();
        let fluxes: Vec<f64> = (0..40)
            .map(|i| photometry.magnitude_to_flux(i as f64 * 0.5, None).unwrap().0)
            .collect();

        for pair in fluxes.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn test_distance_modulus() {
        let photometry = test_photometry();
        let (flux, _) = photometry.magnitude_to_flux(15.0, None).unwrap();

        let (apparent, absolute) = photometry.flux_to_magnitude(flux, 10.0).unwrap();
        assert_relative_eq!(apparent, absolute, epsilon = 1e-12);

        let (apparent, absolute) = photometry.flux_to_magnitude(flux, 30.0).unwrap();
        assert_relative_eq!(apparent, 15.0, epsilon = 1e-10);
        assert_relative_eq!(absolute, 12.614, epsilon = 1e-3);
    }

    #[test]
    fn test_vega_mag_override() {
        let mut photometry = test_photometry();
        let (before, _) = photometry.magnitude_to_flux(15.0, None).unwrap();
        let (mag_before, _) = photometry.flux_to_magnitude(before, 10.0).unwrap();

        photometry.set_vega_mag(0.0).unwrap();
        let (after, _) = photometry.magnitude_to_flux(15.0, None).unwrap();
        let (mag_after, _) = photometry.flux_to_magnitude(before, 10.0).unwrap();

        assert_relative_eq!(before / after, 10f64.powf(0.4 * 0.03), max_relative = 1e-12);
        assert_relative_eq!(mag_before - mag_after, 0.03, epsilon = 1e-12);
        // Earlier results are plain values
        assert_relative_eq!(mag_before, 15.0, epsilon = 1e-10);
        assert_eq!(photometry.vega_mag(), 0.0);
    }

    #[test]
    fn test_rejects_non_finite_vega_mag() {
        let mut photometry = test_photometry();
        assert!(matches!(
            photometry.set_vega_mag(f64::NAN),
            Err(PhotometryError::Domain(_))
        ));
        assert_eq!(photometry.vega_mag(), DEFAULT_VEGA_MAG);
    }

    #[test]
    fn test_domain_errors() {
        let photometry = test_photometry();

        for (flux, distance) in [(0.0, 30.0), (-1e-15, 30.0), (1e-15, 0.0), (1e-15, -5.0)] {
            assert!(
                matches!(
                    photometry.flux_to_magnitude(flux, distance),
                    Err(PhotometryError::Domain(_))
                ),
                "flux {flux} distance {distance} should fail"
            );
        }

        assert!(matches!(
            photometry.flux_to_magnitude(f64::NAN, 30.0),
            Err(PhotometryError::Domain(_))
        ));
        assert!(matches!(
            photometry.magnitude_to_flux(f64::INFINITY, None),
            Err(PhotometryError::Domain(_))
        ));
        assert!(matches!(
            photometry.magnitude_to_flux(15.0, Some(-0.1)),
            Err(PhotometryError::Domain(_))
        ));
    }

    #[test]
    fn test_overflowing_flux_is_rejected() {
        let mut photometry = test_photometry();

        // Zero point ~5e-9, so 10^400 brighter than Vega is past f64::MAX
        assert!(matches!(
            photometry.magnitude_to_flux(-1000.0, None),
            Err(PhotometryError::Domain(_))
        ));

        photometry.set_vega_mag(1000.0).unwrap();
        assert!(matches!(
            photometry.magnitude_to_flux(0.0, Some(0.1)),
            Err(PhotometryError::Domain(_))
        ));

        // Finite flux whose uncertainty overflows
        assert!(matches!(
            photometry.magnitude_to_flux_with_zero_point(1000.0, Some(f64::MAX), 1e10),
            Err(PhotometryError::Domain(_))
        ));
    }

    #[test]
    fn test_external_zero_point() {
        let photometry = test_photometry();
        let h_zero_point = 1.133e-9;

        let (flux, _) = photometry
            .magnitude_to_flux_with_zero_point(DEFAULT_VEGA_MAG, None, h_zero_point)
            .unwrap();
        assert_relative_eq!(flux, h_zero_point, max_relative = 1e-12);

        assert!(matches!(
            photometry.magnitude_to_flux_with_zero_point(10.0, None, 0.0),
            Err(PhotometryError::Domain(_))
        ));
    }

    #[test]
    fn test_magnitude_errors() {
        let photometry = test_photometry();
        let (flux, flux_error) = photometry.magnitude_to_flux(12.0, Some(0.1)).unwrap();

        let (apparent, absolute) = photometry
            .flux_to_magnitude_with_errors(flux, flux_error, Some((100.0, Some(5.0))))
            .unwrap();

        assert_relative_eq!(apparent.value, 12.0, epsilon = 1e-10);
        assert_relative_eq!(apparent.error.unwrap(), 0.1, epsilon = 1e-10);

        let absolute = absolute.unwrap();
        assert_relative_eq!(absolute.value, 7.0, epsilon = 1e-10);
        let modulus_error = 5.0 / LN_10 * 5.0 / 100.0;
        assert_relative_eq!(
            absolute.error.unwrap(),
            (0.1f64.powi(2) + modulus_error.powi(2)).sqrt(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_magnitude_errors_without_distance() {
        let photometry = test_photometry();
        let (flux, _) = photometry.magnitude_to_flux(12.0, None).unwrap();

        let (apparent, absolute) = photometry
            .flux_to_magnitude_with_errors(flux, None, None)
            .unwrap();

        assert!(apparent.error.is_none());
        assert!(absolute.is_none());

        let (_, absolute) = photometry
            .flux_to_magnitude_with_errors(flux, None, Some((10.0, None)))
            .unwrap();
        let absolute = absolute.unwrap();
        assert_relative_eq!(absolute.value, 12.0, epsilon = 1e-10);
        assert!(absolute.error.is_none());
    }

    #[test]
    fn test_spectrum_to_flux_flat() {
        let photometry = test_photometry();
        let flux = photometry.spectrum_to_flux(&FlatSpectrum::new(2e-14)).unwrap();

        assert_relative_eq!(flux, 2e-14, max_relative = 1e-12);
    }

    #[test]
    fn test_spectrum_of_scaled_vega() {
        let photometry = test_photometry();
        let faint_vega = photometry.vega_spectrum().scaled(1e-6).unwrap();

        // 1e-6 in flux is 15 magnitudes
        let (apparent, absolute) = photometry.spectrum_to_magnitude(&faint_vega, 10.0).unwrap();
        assert_relative_eq!(apparent, DEFAULT_VEGA_MAG + 15.0, epsilon = 1e-10);
        assert_relative_eq!(absolute, apparent, epsilon = 1e-12);
    }

    #[test]
    fn test_photon_weighting_shifts_red() {
        let energy = test_photometry();
        let photon = SyntheticPhotometry::from_parts(
            test_filter().with_detector_type(DetectorType::Photon),
            test_vega(),
        )
        .unwrap();

        // Weighting by λ favours the red, fainter end of a falling spectrum
        assert!(photon.zero_point() < energy.zero_point());
        assert_relative_eq!(photon.zero_point(), energy.zero_point(), max_relative = 0.1);
    }

    #[test]
    fn test_spectrum_coverage() {
        let photometry = test_photometry();
        let short = SampledSpectrum::new(vec![0.5, 1.2], vec![1.0, 1.0]).unwrap();

        assert!(matches!(
            photometry.spectrum_to_flux(&short),
            Err(PhotometryError::Coverage { .. })
        ));
        assert!(matches!(
            SyntheticPhotometry::from_parts(test_filter(), short),
            Err(PhotometryError::Coverage { .. })
        ));
    }
}
