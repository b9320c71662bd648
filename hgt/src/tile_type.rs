//! Resolution tiers.

use crate::C;
use std::{fmt, path::Path, str::FromStr};

/// A named resolution class of raster data.
///
/// Variants are declared from most to least accurate, so the derived
/// `Ord` is the order in which tiers are consulted when falling back.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TileType {
    /// 1 arcsecond (~30m), 3601 samples per edge, 1° footprint.
    Dem1_3601,
    /// 3 arcseconds (~93m), 1201 samples per edge, 1° footprint.
    Dem3_1201,
    /// 9 arcseconds (~278m), 401 samples per edge, 1° footprint.
    Dem9_401,
    /// 9 arcseconds, 1201 samples per edge, 3° footprint.
    Dem9_1201,
    /// Land cover classes, 361 samples per edge, 1° footprint.
    LandCover361,
    /// 27 arcseconds (~831m), 1201 samples per edge, 9° footprint.
    Dem27_1201,
    /// 81 arcseconds (~2474m), 1001 samples per edge, 22.5° footprint.
    Dem81_1001,
    Undefined,
}

struct Meta {
    name: &'static str,
    arcseconds: u8,
    dimension: usize,
    footprint: C,
}

impl TileType {
    /// Every tier, most accurate first.
    pub const ALL: [TileType; 8] = [
        Self::Dem1_3601,
        Self::Dem3_1201,
        Self::Dem9_401,
        Self::Dem9_1201,
        Self::LandCover361,
        Self::Dem27_1201,
        Self::Dem81_1001,
        Self::Undefined,
    ];

    const fn meta(self) -> Meta {
        macro_rules! meta {
            ($name:literal, $arcsec:literal, $dim:literal, $footprint:literal) => {
                Meta {
                    name: $name,
                    arcseconds: $arcsec,
                    dimension: $dim,
                    footprint: $footprint,
                }
            };
        }
        match self {
            Self::Dem1_3601 => meta!("dem1_3601", 1, 3601, 1.0),
            Self::Dem3_1201 => meta!("dem3_1201", 3, 1201, 1.0),
            Self::Dem9_401 => meta!("dem9_401", 9, 401, 1.0),
            Self::Dem9_1201 => meta!("dem9_1201", 9, 1201, 3.0),
            Self::LandCover361 => meta!("landcover361", 10, 361, 1.0),
            Self::Dem27_1201 => meta!("dem27_1201", 27, 1201, 9.0),
            Self::Dem81_1001 => meta!("dem81_1001", 81, 1001, 22.5),
            Self::Undefined => meta!("undefined", 0, 0, 1.0),
        }
    }

    /// Degrees of latitude/longitude spanned by one tile.
    pub const fn footprint(self) -> C {
        self.meta().footprint
    }

    /// Nominal samples per tile edge, `0` for [TileType::Undefined].
    pub const fn dimension(self) -> usize {
        self.meta().dimension
    }

    /// Nominal arcseconds per sample, `0` for [TileType::Undefined].
    pub const fn arcseconds(self) -> u8 {
        self.meta().arcseconds
    }

    /// Degrees per sample for a tile of this tier with `dimension`
    /// samples per edge.
    #[allow(clippy::cast_precision_loss)]
    pub fn resolution(self, dimension: usize) -> C {
        self.footprint() / dimension as C
    }

    /// Returns the tier best suited to rendering at `deg_per_sample`.
    pub fn for_resolution(deg_per_sample: C) -> Self {
        if deg_per_sample < 0.1 {
            Self::Dem1_3601
        } else if deg_per_sample < 0.5 {
            Self::Dem3_1201
        } else if deg_per_sample < 1.0 {
            Self::Dem9_401
        } else if deg_per_sample < 2.5 {
            Self::Dem27_1201
        } else {
            Self::Dem81_1001
        }
    }

    /// Returns the tier of a tile with `dimension` samples per edge
    /// stored at `path`.
    ///
    /// Several tiers share a sample count, so the enclosing
    /// directories are consulted first: the nearest one named after a
    /// tier (`dem9_1201`) or an arcsecond resolution (`9arcsecond`)
    /// that agrees with `dimension` wins. Failing that, the most
    /// accurate tier with a matching sample count is used.
    pub fn infer<P: AsRef<Path>>(dimension: usize, path: P) -> Self {
        path.as_ref()
            .ancestors()
            .skip(1)
            .filter_map(|dir| dir.file_name().and_then(std::ffi::OsStr::to_str))
            .find_map(|name| Self::from_dir_name(name, dimension))
            .unwrap_or_else(|| Self::from_dimension(dimension))
    }

    /// Most accurate tier with `dimension` samples per edge.
    pub fn from_dimension(dimension: usize) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.dimension() == dimension)
            .unwrap_or(Self::Undefined)
    }
}

/// Private API
impl TileType {
    fn from_dir_name(name: &str, dimension: usize) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if let Ok(tile_type) = name.parse::<Self>() {
            return (tile_type.dimension() == dimension).then_some(tile_type);
        }
        let arcseconds = name
            .strip_suffix("arcsecond")
            .or_else(|| name.strip_suffix("arcsec"))
            .and_then(|n| n.trim_end_matches(['-', '_']).parse::<u8>().ok())?;
        Self::ALL
            .into_iter()
            .find(|t| t.arcseconds() == arcseconds && t.dimension() == dimension)
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.meta().name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTileTypeError(String);

impl fmt::Display for ParseTileTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tile type {:?}", self.0)
    }
}

impl std::error::Error for ParseTileTypeError {}

impl FromStr for TileType {
    type Err = ParseTileTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.meta().name.eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseTileTypeError(s.to_owned()))
    }
}
