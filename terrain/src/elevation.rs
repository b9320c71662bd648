//! Multi-resolution elevation lookup.

use crate::{discover, normalize, Matrix, TerrainError};
use hgt::{Tile, TileType, C, VOID};
use log::{debug, info};
use std::{collections::BTreeMap, path::Path};

/// Elevation lookup over one [Matrix] per resolution tier.
///
/// A coordinate with no tile in any tier is assumed to be open ocean
/// and has an elevation of `0`. A coordinate whose tile holds a
/// [VOID] sample has an unknown (`NaN`) elevation.
#[derive(Debug)]
pub struct ElevationEngine {
    /// Iterated most accurate tier first.
    matrices: BTreeMap<TileType, Matrix>,
}

impl ElevationEngine {
    /// Builds an engine from every tile file under `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, TerrainError> {
        let paths = discover(&root)?;
        let engine = Self::from_paths(paths)?;
        info!(
            "elevation engine {:?}; {} tiles in tiers {:?}",
            root.as_ref(),
            engine.tile_count(),
            engine.tiers().map(|t| t.to_string()).collect::<Vec<_>>()
        );
        Ok(engine)
    }

    /// Builds an engine from already discovered tile files.
    ///
    /// Each tile's tier is inferred from its size and location; see
    /// [TileType::infer].
    pub fn from_paths<I, P>(paths: I) -> Result<Self, TerrainError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut matrices = BTreeMap::new();
        for path in paths {
            let tile = Tile::open(path)?;
            let tile_type = tile.tile_type();
            debug!(
                "{:?} -> {tile_type}, {}° per sample",
                tile.path(),
                tile.resolution()
            );
            matrices
                .entry(tile_type)
                .or_insert_with(|| Matrix::new(tile_type.footprint()))
                .insert(tile)?;
        }
        Ok(Self { matrices })
    }

    /// Returns the elevation in meters at (`lon`, `lat`) from the most
    /// accurate tier with data there.
    ///
    /// When no tier has data, the last tier consulted decides: no tile
    /// yields `0`, a [VOID] sample yields `NaN`.
    pub fn elevation(&self, lon: C, lat: C) -> Result<C, TerrainError> {
        let (lon, lat) = normalize(lon, lat)?;
        let mut last = None;
        for matrix in self.matrices.values() {
            match matrix.lookup(lon, lat)? {
                Some(sample) if sample != VOID => return Ok(C::from(sample)),
                sample => last = sample,
            }
        }
        Ok(to_elevation(last))
    }

    /// Returns the elevation in meters at (`lon`, `lat`) from the tier
    /// suited to `deg_per_sample`.
    ///
    /// A resolution of `0` is the same as [elevation](Self::elevation).
    /// Otherwise only the tier chosen by [TileType::for_resolution] is
    /// consulted, or the most accurate registered tier if that one is
    /// absent. There is no fallback past that single tier.
    pub fn elevation_at_resolution(
        &self,
        lon: C,
        lat: C,
        deg_per_sample: C,
    ) -> Result<C, TerrainError> {
        if !(deg_per_sample >= 0.0) {
            return Err(TerrainError::Resolution(deg_per_sample));
        }
        if deg_per_sample == 0.0 {
            return self.elevation(lon, lat);
        }
        self.elevation_for_tier(lon, lat, TileType::for_resolution(deg_per_sample))
    }

    /// Returns the elevation in meters at (`lon`, `lat`) from
    /// `tile_type`, or from the most accurate registered tier if
    /// `tile_type` is absent.
    pub fn elevation_for_tier(
        &self,
        lon: C,
        lat: C,
        tile_type: TileType,
    ) -> Result<C, TerrainError> {
        let (lon, lat) = normalize(lon, lat)?;
        let Some(matrix) = self
            .matrices
            .get(&tile_type)
            .or_else(|| self.matrices.values().next())
        else {
            return Ok(C::NAN);
        };
        Ok(to_elevation(matrix.lookup(lon, lat)?))
    }

    /// Returns the registered tiers, most accurate first.
    pub fn tiers(&self) -> impl Iterator<Item = TileType> + '_ {
        self.matrices.keys().copied()
    }

    pub fn matrix(&self, tile_type: TileType) -> Option<&Matrix> {
        self.matrices.get(&tile_type)
    }

    /// Returns the number of tiles across all tiers.
    pub fn tile_count(&self) -> usize {
        self.matrices.values().map(Matrix::len).sum()
    }
}

fn to_elevation(sample: Option<i16>) -> C {
    match sample {
        None => 0.0,
        Some(VOID) => C::NAN,
        Some(sample) => C::from(sample),
    }
}
