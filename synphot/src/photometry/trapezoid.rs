//! Trapezoidal integration utility

use thiserror::Error;

/// Errors that can occur during trapezoidal integration
#[derive(Debug, Error, PartialEq)]
pub enum TrapezoidError {
    #[error("Insufficient points for integration, need at least 2 points")]
    InsufficientPoints,

    #[error("Points must be in ascending order")]
    NotAscending,

    #[error("Integrand produced a non-finite value at x = {0}")]
    NonFinite(f64),
}

/// Performs trapezoidal integration of a function over a set of points.
///
/// # Arguments
///
/// * `corners` - The x coordinates of the trapezoid corners in ascending order
/// * `to_integrate` - The function to integrate
///
/// # Returns
///
/// The result of the trapezoidal integration or an error if the input is invalid.
pub fn trap_integrate<F>(corners: &[f64], to_integrate: F) -> Result<f64, TrapezoidError>
where
    F: Fn(f64) -> f64,
{
    if corners.len() < 2 {
        return Err(TrapezoidError::InsufficientPoints);
    }

    if corners.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(TrapezoidError::NotAscending);
    }

    // Evaluate each corner once, adjacent intervals share their edge value
    let mut heights = Vec::with_capacity(corners.len());
    for &x in corners {
        let y = to_integrate(x);
        if !y.is_finite() {
            return Err(TrapezoidError::NonFinite(x));
        }
        heights.push(y);
    }

    // ∫[x₁,x₂] f(x)dx ≈ (x₂-x₁) × (f(x₁)+f(x₂))/2
    let integral_sum = corners
        .windows(2)
        .zip(heights.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[0] + y[1]) / 2.0)
        .sum();

    Ok(integral_sum)
}

/// Linear interpolation into an ascending table.
///
/// Returns 0.0 outside `[xs[0], xs[last]]`. Callers guarantee `xs` is
/// ascending and the same length as `ys`.
pub(crate) fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
        return 0.0;
    };
    if x < first || x > last {
        return 0.0;
    }

    // Index of the first sample strictly greater than x
    let upper = xs.partition_point(|&v| v <= x);
    if upper == 0 {
        return ys[0];
    }
    if upper == xs.len() {
        return ys[xs.len() - 1];
    }

    let lower = upper - 1;
    let t = (x - xs[lower]) / (xs[upper] - xs[lower]);
    ys[lower] * (1.0 - t) + ys[upper] * t
}
