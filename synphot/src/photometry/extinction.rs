//! Interstellar extinction
//!
//! Optical and infrared extinction law of Cardelli, Clayton & Mathis (1989).
//! Valid from 0.3 to ~3.3 µm; beyond that the infrared power law is simply
//! extrapolated.

/// Extinction in magnitudes at each wavelength
///
/// # Arguments
///
/// * `av_mag` - Extinction in the V band (mag)
/// * `rv` - Total-to-selective extinction ratio, `R_V = A_V / E(B-V)`
/// * `wavelengths` - Wavelengths in µm
///
/// # Returns
///
/// `A(λ) = A_V · (a(x) + b(x) / R_V)` with `x = 1/λ` in µm⁻¹
pub fn ism_extinction(av_mag: f64, rv: f64, wavelengths: &[f64]) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wavelength| {
            let (a, b) = cardelli_coefficients(1.0 / wavelength);
            av_mag * (a + b / rv)
        })
        .collect()
}

fn cardelli_coefficients(x: f64) -> (f64, f64) {
    if x < 1.1 {
        // Infrared
        let scale = x.powf(1.61);
        return (0.574 * scale, -0.527 * scale);
    }

    // Optical / near-infrared polynomial in y = x - 1.82
    const A: [f64; 8] = [
        1.0, 0.17699, -0.50447, -0.02427, 0.72085, 0.01979, -0.77530, 0.32999,
    ];
    const B: [f64; 8] = [
        0.0, 1.41338, 2.28305, 1.07233, -5.38434, -0.62251, 5.30260, -2.09002,
    ];

    let y = x - 1.82;
    let mut a = 0.0;
    let mut b = 0.0;
    // Horner evaluation, highest order first
    for i in (0..A.len()).rev() {
        a = a * y + A[i];
        b = b * y + B[i];
    }
    (a, b)
}
