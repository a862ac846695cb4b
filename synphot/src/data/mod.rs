//! Data module for downloading and managing photometric data
//!
//! This module provides functionality for downloading, caching, and loading
//! filter transmission profiles and the Vega calibration spectrum.

pub mod calspec;
pub mod fetch;
pub mod store;
pub mod svo;

pub use calspec::read_calspec;
pub use fetch::{DataSource, HttpSource};
pub use store::{DataStore, InitReport};
pub use svo::{parse_detector_type, parse_svo_ascii, svo_metadata_url, svo_url};
