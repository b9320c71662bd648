use clap::{Parser, Subcommand};
use std::path::PathBuf;
use terrain::TileType;

/// Query elevation and land cover from a directory of HGT tiles.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory searched recursively for tile files.
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Elevation in meters at a coordinate.
    Elevation {
        /// Longitude in decimal degrees.
        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// Latitude in decimal degrees.
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        /// Pick a single tier suited to this many degrees per sample.
        #[arg(short, long, conflicts_with = "tier")]
        resolution: Option<f64>,

        /// Query a single tier, e.g. `dem3_1201`.
        #[arg(short, long)]
        tier: Option<TileType>,
    },

    /// Land cover class at a coordinate.
    Cover {
        /// Longitude in decimal degrees.
        #[arg(allow_negative_numbers = true)]
        lon: f64,

        /// Latitude in decimal degrees.
        #[arg(allow_negative_numbers = true)]
        lat: f64,
    },

    /// List the elevation tiers found in `dir`.
    Tiers,
}
