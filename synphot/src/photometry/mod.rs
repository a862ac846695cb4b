//! Photometry models and utilities

pub mod extinction;
pub mod filter;
pub mod spectrum;
pub mod synthetic;
pub mod trapezoid;

pub use extinction::ism_extinction;
pub use filter::{DetectorType, FilterError, FilterId, FilterProfile};
pub use spectrum::{FlatSpectrum, SampledSpectrum, Spectrum, SpectrumError, Units};
pub use synthetic::{Magnitude, SyntheticPhotometry, DEFAULT_VEGA_MAG};
pub use trapezoid::{trap_integrate, TrapezoidError};
