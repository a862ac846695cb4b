//! CALSPEC reference spectra
//!
//! CALSPEC files are FITS binary tables with `WAVELENGTH` in Angstrom and
//! `FLUX` in erg s⁻¹ cm⁻² Å⁻¹ in the first extension.

use std::path::Path;

use fitsio::FitsFile;

use crate::error::PhotometryError;
use crate::photometry::{SampledSpectrum, Units};

/// Read a CALSPEC table into a spectrum in µm and W m⁻² µm⁻¹
pub fn read_calspec(path: &Path) -> Result<SampledSpectrum, PhotometryError> {
    let mut fptr = FitsFile::open(path)?;
    let hdu = fptr.hdu(1)?;

    let wavelengths: Vec<f64> = hdu.read_col(&mut fptr, "WAVELENGTH")?;
    let fluxes: Vec<f64> = hdu.read_col(&mut fptr, "FLUX")?;

    let (wavelengths, fluxes) = clean_table(&wavelengths, &fluxes);
    log::debug!(
        "Read {} CALSPEC samples from {}",
        wavelengths.len(),
        path.display()
    );

    Ok(SampledSpectrum::new(wavelengths, fluxes)?)
}

/// Convert units and drop rows that would break interpolation
///
/// Rows with a non-positive wavelength, a non-finite flux, or a wavelength
/// not above the previous kept row are skipped.
fn clean_table(wavelengths_aa: &[f64], fluxes_flam: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut wavelengths = Vec::with_capacity(wavelengths_aa.len());
    let mut fluxes = Vec::with_capacity(fluxes_flam.len());
    let mut skipped = 0usize;

    for (&wavelength_aa, &flux) in wavelengths_aa.iter().zip(fluxes_flam) {
        let wavelength_um = wavelength_aa * Units::ANGSTROM_TO_MICRON;
        let ascending = wavelengths.last().map_or(true, |&last| wavelength_um > last);

        if wavelength_um > 0.0 && flux.is_finite() && ascending {
            wavelengths.push(wavelength_um);
            fluxes.push(flux * Units::FLAM_TO_W_M2_UM);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} unusable CALSPEC rows");
    }

    (wavelengths, fluxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clean_table_units() {
        let (wavelengths, fluxes) = clean_table(&[5000.0, 5556.0], &[3.6e-9, 3.44e-9]);

        assert_relative_eq!(wavelengths[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(wavelengths[1], 0.5556, epsilon = 1e-12);
        assert_relative_eq!(fluxes[1], 3.44e-8, max_relative = 1e-12);
    }

    #[test]
    fn test_clean_table_drops_bad_rows() {
        let (wavelengths, fluxes) = clean_table(
            &[0.0, 1000.0, 900.0, 2000.0, 3000.0],
            &[1.0, 1.0, 1.0, f64::NAN, 1.0],
        );

        assert_eq!(wavelengths.len(), 2);
        assert_eq!(fluxes.len(), 2);
        assert_relative_eq!(wavelengths[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(wavelengths[1], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_calspec(&dir.path().join("missing.fits"));
        assert!(result.is_err());
    }
}
