//! Land cover classification lookup.

use crate::{discover, normalize, Matrix, TerrainError};
use hgt::{Tile, TileType, C};
use log::{debug, info};
use std::{cmp::Reverse, collections::BTreeMap, fmt, path::Path};

/// Land cover classes.
///
/// Codes 11 through 230 follow the GlobCover 2009 legend; open sea is
/// split out of its water bodies class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum CoverType {
    Sea = 0,
    CaspianSea = 1,
    IrrigatedCropland = 11,
    RainfedCropland = 14,
    MosaicCropland = 20,
    MosaicVegetation = 30,
    BroadleavedEvergreenForest = 40,
    ClosedBroadleavedDeciduousForest = 50,
    OpenBroadleavedDeciduousForest = 60,
    ClosedNeedleleavedEvergreenForest = 70,
    OpenNeedleleavedForest = 90,
    MixedForest = 100,
    MosaicForestShrubland = 110,
    MosaicGrassland = 120,
    Shrubland = 130,
    Grassland = 140,
    SparseVegetation = 150,
    FreshwaterFloodedForest = 160,
    SalineFloodedForest = 170,
    FloodedGrassland = 180,
    Urban = 190,
    BareAreas = 200,
    Lakes = 210,
    SnowAndIce = 220,
    NoData = 230,
}

impl CoverType {
    pub const ALL: [CoverType; 25] = [
        Self::Sea,
        Self::CaspianSea,
        Self::IrrigatedCropland,
        Self::RainfedCropland,
        Self::MosaicCropland,
        Self::MosaicVegetation,
        Self::BroadleavedEvergreenForest,
        Self::ClosedBroadleavedDeciduousForest,
        Self::OpenBroadleavedDeciduousForest,
        Self::ClosedNeedleleavedEvergreenForest,
        Self::OpenNeedleleavedForest,
        Self::MixedForest,
        Self::MosaicForestShrubland,
        Self::MosaicGrassland,
        Self::Shrubland,
        Self::Grassland,
        Self::SparseVegetation,
        Self::FreshwaterFloodedForest,
        Self::SalineFloodedForest,
        Self::FloodedGrassland,
        Self::Urban,
        Self::BareAreas,
        Self::Lakes,
        Self::SnowAndIce,
        Self::NoData,
    ];

    /// Returns the class for a raw sample. Unknown codes, including
    /// [VOID](hgt::VOID), are [NoData](CoverType::NoData).
    pub fn from_code(code: i16) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .unwrap_or(Self::NoData)
    }

    pub fn code(self) -> i16 {
        self as i16
    }

    /// Returns `true` for lakes and seas.
    pub fn is_open_water(self) -> bool {
        match self {
            Self::Sea | Self::CaspianSea | Self::Lakes => true,
            Self::IrrigatedCropland
            | Self::RainfedCropland
            | Self::MosaicCropland
            | Self::MosaicVegetation
            | Self::BroadleavedEvergreenForest
            | Self::ClosedBroadleavedDeciduousForest
            | Self::OpenBroadleavedDeciduousForest
            | Self::ClosedNeedleleavedEvergreenForest
            | Self::OpenNeedleleavedForest
            | Self::MixedForest
            | Self::MosaicForestShrubland
            | Self::MosaicGrassland
            | Self::Shrubland
            | Self::Grassland
            | Self::SparseVegetation
            | Self::FreshwaterFloodedForest
            | Self::SalineFloodedForest
            | Self::FloodedGrassland
            | Self::Urban
            | Self::BareAreas
            | Self::SnowAndIce
            | Self::NoData => false,
        }
    }
}

impl fmt::Display for CoverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Land cover lookup over one [Matrix] per tile sample-grid size.
///
/// Larger grids are treated as more accurate and consulted first.
#[derive(Debug)]
pub struct CoverEngine {
    matrices: BTreeMap<Reverse<usize>, Matrix>,
}

impl CoverEngine {
    /// Builds an engine from every tile file under `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, TerrainError> {
        let paths = discover(&root)?;
        let engine = Self::from_paths(paths)?;
        info!(
            "cover engine {:?}; {} tiles in grid sizes {:?}",
            root.as_ref(),
            engine.tile_count(),
            engine.tiers().collect::<Vec<_>>()
        );
        Ok(engine)
    }

    /// Builds an engine from already discovered tile files.
    pub fn from_paths<I, P>(paths: I) -> Result<Self, TerrainError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut matrices = BTreeMap::new();
        for path in paths {
            let tile = Tile::open(path)?;
            let dimension = tile.dimension();
            debug!("{:?} -> {dimension}", tile.path());
            matrices
                .entry(Reverse(dimension))
                .or_insert_with(|| Matrix::new(TileType::LandCover361.footprint()))
                .insert(tile)?;
        }
        Ok(Self { matrices })
    }

    /// Returns the land cover at (`lon`, `lat`) from the largest grid
    /// with a classified sample there, or [Sea](CoverType::Sea).
    pub fn cover_type(&self, lon: C, lat: C) -> Result<CoverType, TerrainError> {
        let (lon, lat) = normalize(lon, lat)?;
        for matrix in self.matrices.values() {
            if let Some(code) = matrix.lookup(lon, lat)? {
                let cover_type = CoverType::from_code(code);
                if cover_type != CoverType::NoData {
                    return Ok(cover_type);
                }
            }
        }
        Ok(CoverType::Sea)
    }

    pub fn is_open_water(cover_type: CoverType) -> bool {
        cover_type.is_open_water()
    }

    /// Returns the registered grid sizes, largest first.
    pub fn tiers(&self) -> impl Iterator<Item = usize> + '_ {
        self.matrices.keys().map(|Reverse(dimension)| *dimension)
    }

    pub fn matrix(&self, dimension: usize) -> Option<&Matrix> {
        self.matrices.get(&Reverse(dimension))
    }

    /// Returns the number of tiles across all grid sizes.
    pub fn tile_count(&self) -> usize {
        self.matrices.values().map(Matrix::len).sum()
    }
}
