//! Command line front end for Vega-calibrated synthetic photometry
//!
//! # Usage
//!
//! ```bash
//! # Create ~/.synphot and its configuration file
//! cargo run --release --bin synphot -- init
//!
//! # Flux density of a 15.0 ± 0.2 mag source
//! cargo run --release --bin synphot -- mag-to-flux JWST/NIRCam.F115W 15.0 --error 0.2
//!
//! # Apparent and absolute magnitude of a flux density at 30 pc
//! cargo run --release --bin synphot -- flux-to-mag JWST/NIRCam.F115W 4.15e-15 --distance 30
//!
//! # Zero point of a filter
//! cargo run --release --bin synphot -- zero-point 2MASS/2MASS.H
//! ```
//!
//! Set `RUST_LOG=info` to see downloads and cache activity.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use synphot::{DataStore, SyntheticPhotometry};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data store directory (default: ~/.synphot)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data store and configuration file
    Init,

    /// Convert an apparent magnitude to a flux density
    MagToFlux {
        /// Filter name, e.g. JWST/NIRCam.F115W
        filter: String,

        /// Apparent magnitude
        #[arg(allow_negative_numbers = true)]
        magnitude: f64,

        /// Magnitude uncertainty
        #[arg(short, long)]
        error: Option<f64>,

        /// Override the magnitude of Vega
        #[arg(long, allow_negative_numbers = true)]
        vega_mag: Option<f64>,
    },

    /// Convert a flux density (W m-2 um-1) to apparent and absolute magnitude
    FluxToMag {
        /// Filter name, e.g. JWST/NIRCam.F115W
        filter: String,

        /// Flux density in W m-2 um-1
        flux: f64,

        /// Flux density uncertainty in W m-2 um-1
        #[arg(short, long)]
        error: Option<f64>,

        /// Distance in parsecs
        #[arg(short, long, default_value_t = 10.0)]
        distance: f64,

        /// Override the magnitude of Vega
        #[arg(long, allow_negative_numbers = true)]
        vega_mag: Option<f64>,
    },

    /// Print the zero-point flux and mean wavelength of a filter
    ZeroPoint {
        /// Filter name, e.g. JWST/NIRCam.F115W
        filter: String,
    },
}

fn open_store(data_dir: Option<PathBuf>) -> Result<DataStore, synphot::PhotometryError> {
    match data_dir {
        Some(path) => DataStore::with_path(path),
        None => DataStore::new(),
    }
}

fn photometry_for(
    store: &DataStore,
    filter: &str,
    vega_mag: Option<f64>,
) -> Result<SyntheticPhotometry, synphot::PhotometryError> {
    let mut photometry = SyntheticPhotometry::new(filter, store)?;
    if let Some(vega_mag) = vega_mag {
        photometry.set_vega_mag(vega_mag)?;
    }
    Ok(photometry)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let store = open_store(cli.data_dir)?;

    match cli.command {
        Commands::Init => {
            let report = store.initialize()?;
            if report.created {
                println!("Created configuration file: {}", report.config_path.display());
            } else {
                println!("Configuration file: {}", report.config_path.display());
            }
            println!("Data folder: {}", report.root.display());
        }
        Commands::MagToFlux {
            filter,
            magnitude,
            error,
            vega_mag,
        } => {
            let photometry = photometry_for(&store, &filter, vega_mag)?;
            let (flux, flux_error) = photometry.magnitude_to_flux(magnitude, error)?;

            match flux_error {
                Some(flux_error) => {
                    println!("Flux density (W m-2 um-1) = {flux:.2e} +/- {flux_error:.2e}")
                }
                None => println!("Flux density (W m-2 um-1) = {flux:.2e}"),
            }
        }
        Commands::FluxToMag {
            filter,
            flux,
            error,
            distance,
            vega_mag,
        } => {
            let photometry = photometry_for(&store, &filter, vega_mag)?;
            let (apparent, absolute) =
                photometry.flux_to_magnitude_with_errors(flux, error, Some((distance, None)))?;

            match apparent.error {
                Some(e) => println!("Apparent magnitude = {:.2} +/- {e:.2}", apparent.value),
                None => println!("Apparent magnitude = {:.2}", apparent.value),
            }
            if let Some(absolute) = absolute {
                match absolute.error {
                    Some(e) => println!("Absolute magnitude = {:.2} +/- {e:.2}", absolute.value),
                    None => println!("Absolute magnitude = {:.2}", absolute.value),
                }
            }
        }
        Commands::ZeroPoint { filter } => {
            let photometry = photometry_for(&store, &filter, None)?;
            let mean_wavelength = photometry.filter().mean_wavelength()?;
            let width = photometry.filter().effective_width()?;

            println!("Filter: {}", photometry.filter().id());
            println!("Detector type: {:?}", photometry.filter().detector_type());
            println!("Mean wavelength (um) = {mean_wavelength:.4}");
            println!("Effective width (um) = {width:.4}");
            println!(
                "Zero point (W m-2 um-1) = {:.4e} at Vega = {:.2} mag",
                photometry.zero_point(),
                photometry.vega_mag()
            );
        }
    }

    Ok(())
}
