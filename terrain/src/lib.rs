//! Elevation and land cover lookup over sparse, multi-resolution HGT
//! tile sets.
//!
//! An engine is built once from a directory of tiles and is then
//! immutable; queries may come from any number of threads.

mod cover;
mod discover;
mod elevation;
mod error;
mod matrix;

pub use crate::{
    cover::{CoverEngine, CoverType},
    discover::discover,
    elevation::ElevationEngine,
    error::TerrainError,
    matrix::Matrix,
};
pub use hgt::{Tile, TileType, C, VOID};

/// Validates a query coordinate, folding `lon == 180` onto `-180`.
fn normalize(lon: C, lat: C) -> Result<(C, C), TerrainError> {
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(TerrainError::Domain { lon, lat });
    }
    let lon = if lon == 180.0 { -180.0 } else { lon };
    Ok((lon, lat))
}
