//! Filter profiles from the SVO Filter Profile Service
//!
//! The service returns two whitespace-separated columns, wavelength in
//! Angstrom and transmission. Unknown filter IDs yield an empty document.
//! Filter metadata, including the detector type, comes as a VOTable from a
//! separate endpoint.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::PhotometryError;
use crate::photometry::{DetectorType, FilterId, FilterProfile, Units};

/// URL of the ASCII transmission table for a filter
pub fn svo_url(base: &str, id: &FilterId) -> Result<String, PhotometryError> {
    let name = id.to_string();
    let url = Url::parse_with_params(base, &[("format", "ascii"), ("id", name.as_str())])
        .map_err(|e| PhotometryError::acquisition(base, e))?;
    Ok(url.into())
}

/// URL of the VOTable metadata document for a filter
pub fn svo_metadata_url(base: &str, id: &FilterId) -> Result<String, PhotometryError> {
    let name = id.to_string();
    let url = Url::parse_with_params(base, &[("ID", name.as_str())])
        .map_err(|e| PhotometryError::acquisition(base, e))?;
    Ok(url.into())
}

static PARAM_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<PARAM\b[^>]*\bname\s*=\s*"DetectorType"[^>]*>"#).expect("valid regex")
});

static VALUE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bvalue\s*=\s*"([^"]*)""#).expect("valid regex"));

/// Detector type declared in an SVO VOTable, if any
///
/// SVO codes energy counters as `0` and photon counters as `1`.
pub fn parse_detector_type(votable: &str) -> Option<DetectorType> {
    let tag = PARAM_TAG.find(votable)?;
    let value = VALUE_ATTR.captures(tag.as_str())?.get(1)?;

    match value.as_str().trim() {
        "0" => Some(DetectorType::Energy),
        "1" => Some(DetectorType::Photon),
        _ => None,
    }
}

/// Read a cached SVO metadata document, falling back when it has no detector type
pub fn read_svo_metadata(
    path: &Path,
    id: &FilterId,
    fallback: DetectorType,
) -> Result<DetectorType, PhotometryError> {
    let text = std::fs::read_to_string(path)?;

    if !text.contains("<VOTABLE") && !text.contains("<votable") {
        return Err(PhotometryError::acquisition(
            id.to_string(),
            "filter metadata is not a VOTable document",
        ));
    }

    match parse_detector_type(&text) {
        Some(detector_type) => Ok(detector_type),
        None => {
            log::debug!("No detector type in metadata for {id}, assuming {fallback:?}");
            Ok(fallback)
        }
    }
}

/// Parse an SVO ASCII table into wavelengths (µm) and transmissions
///
/// Blank lines and `#` comments are skipped. Negative transmissions, which
/// appear as noise in some measured curves, are clipped to zero.
pub fn parse_svo_ascii(id: &FilterId, text: &str) -> Result<(Vec<f64>, Vec<f64>), PhotometryError> {
    let mut wavelengths = Vec::new();
    let mut transmissions = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut columns = line.split_whitespace();
        let parsed = match (columns.next(), columns.next()) {
            (Some(wl), Some(tr)) => wl.parse::<f64>().ok().zip(tr.parse::<f64>().ok()),
            _ => None,
        };
        let Some((wavelength_aa, transmission)) = parsed else {
            return Err(PhotometryError::acquisition(
                id.to_string(),
                format!("malformed line {}: '{line}'", line_no + 1),
            ));
        };

        wavelengths.push(wavelength_aa * Units::ANGSTROM_TO_MICRON);
        transmissions.push(transmission.max(0.0));
    }

    if wavelengths.is_empty() {
        return Err(PhotometryError::acquisition(
            id.to_string(),
            "no transmission data returned, is the filter name correct?",
        ));
    }

    Ok((wavelengths, transmissions))
}

/// Read a cached SVO table as a filter profile
///
/// The profile carries the default detector type until metadata is applied.
pub fn read_svo_file(path: &Path, id: &FilterId) -> Result<FilterProfile, PhotometryError> {
    let text = std::fs::read_to_string(path)?;
    let (wavelengths, transmissions) = parse_svo_ascii(id, &text)?;
    Ok(FilterProfile::from_table(id.clone(), wavelengths, transmissions)?)
}
