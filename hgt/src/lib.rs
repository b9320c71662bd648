//! HGT raster tile format.
//!
//! A tile is a square grid of `N`×`N` big-endian `i16` samples,
//! stored row-major with the northernmost row first. Its southwest
//! corner is encoded in the file name (`N60E024.hgt`), and `N` is
//! implied by the file length (`2·N·N` bytes).
//!
//! # References
//!
//! 1. [HGT file layout](https://www.researchgate.net/profile/Pierre-Boulanger-4/publication/228924813/figure/fig8/AS:300852653903880@1448740270695/Description-of-a-HGT-file-structure-The-name-file-in-this-case-is-N20W100HGT.png)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;
mod tile_type;

pub use crate::{
    error::HgtError,
    tile_type::{ParseTileTypeError, TileType},
};
use byteorder::{BigEndian as BE, ByteOrder};
use geo::geometry::Coord;
use log::debug;
use memmap2::{Mmap, MmapOptions};
use parking_lot::{
    MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard,
};
use std::{
    fs::File,
    mem::size_of,
    path::{Path, PathBuf},
};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// On-disk marker for a cell with no data.
pub const VOID: i16 = i16::MIN;

pub struct Tile {
    /// File backing this tile.
    path: PathBuf,

    /// Southwest corner of the tile, as encoded in its file name.
    sw_corner: Coord<i16>,

    /// Number of samples along each edge.
    dimension: usize,

    /// Resolution tier.
    tile_type: TileType,

    /// Sample storage, mapped on first access.
    samples: RwLock<Option<Mmap>>,

    #[cfg(test)]
    map_count: std::sync::atomic::AtomicUsize,
}

impl Tile {
    /// Returns a Tile for the file at `path`, inferring its tier from
    /// the sample count and enclosing directories.
    ///
    /// The file is not mapped until the first call to
    /// [`sample`](Tile::sample).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HgtError> {
        let dimension = extract_dimension(&path)?;
        let tile_type = TileType::infer(dimension, &path);
        Self::new(path.as_ref(), dimension, tile_type)
    }

    /// Returns a Tile for the file at `path` belonging to `tile_type`.
    pub fn with_type<P: AsRef<Path>>(path: P, tile_type: TileType) -> Result<Self, HgtError> {
        let dimension = extract_dimension(&path)?;
        if tile_type != TileType::Undefined && tile_type.dimension() != dimension {
            return Err(HgtError::TileType {
                tile_type,
                dimension,
                expected: tile_type.dimension(),
                path: path.as_ref().to_owned(),
            });
        }
        Self::new(path.as_ref(), dimension, tile_type)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sw_corner(&self) -> Coord<i16> {
        self.sw_corner
    }

    /// Returns the number of samples along one edge of this tile.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn tile_type(&self) -> TileType {
        self.tile_type
    }

    /// Degrees per sample.
    pub fn resolution(&self) -> C {
        self.tile_type.resolution(self.dimension)
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.dimension * self.dimension
    }

    /// Returns `true` once the backing file has been mapped.
    pub fn is_mapped(&self) -> bool {
        self.samples.read().is_some()
    }

    /// Returns the sample at column `i`, row `j`.
    ///
    /// Row 0 is the southernmost row. The sample may be [VOID].
    pub fn sample(&self, i: usize, j: usize) -> Result<i16, HgtError> {
        if i >= self.dimension || j >= self.dimension {
            return Err(HgtError::Range {
                i,
                j,
                dimension: self.dimension,
            });
        }
        let start = self.xy_to_linear_index((i, j)) * size_of::<i16>();
        let samples = self.samples()?;
        Ok(BE::read_i16(&samples[start..start + size_of::<i16>()]))
    }
}

/// Private API
impl Tile {
    fn new(path: &Path, dimension: usize, tile_type: TileType) -> Result<Self, HgtError> {
        let sw_corner = parse_sw_corner(path)?;
        Ok(Self {
            path: path.to_owned(),
            sw_corner,
            dimension,
            tile_type,
            samples: RwLock::new(None),
            #[cfg(test)]
            map_count: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    /// Returns the mapped samples, mapping the file if this is the
    /// first access.
    ///
    /// Once mapped, readers only ever take the shared lock.
    fn samples(&self) -> Result<MappedRwLockReadGuard<'_, Mmap>, HgtError> {
        if let Ok(samples) = RwLockReadGuard::try_map(self.samples.read(), Option::as_ref) {
            return Ok(samples);
        }

        // At most one upgradable guard exists at a time, so only one
        // thread can observe `None` here.
        let guard = self.samples.upgradable_read();
        let guard = if guard.is_some() {
            RwLockUpgradableReadGuard::downgrade(guard)
        } else {
            let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
            *guard = Some(self.map()?);
            RwLockWriteGuard::downgrade(guard)
        };
        RwLockReadGuard::try_map(guard, Option::as_ref)
            .map_err(|_| HgtError::HgtLen(0, self.path.clone()))
    }

    fn map(&self) -> Result<Mmap, HgtError> {
        let file = File::open(&self.path)?;
        // Private copy-on-write mapping; nothing is ever written back.
        let mmap = unsafe { MmapOptions::new().map_copy_read_only(&file)? };
        if mmap.len() != self.len() * size_of::<i16>() {
            return Err(HgtError::HgtLen(mmap.len() as u64, self.path.clone()));
        }
        #[cfg(test)]
        self.map_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        debug!("mapped {:?} ({})", self.path, self.tile_type);
        Ok(mmap)
    }

    #[cfg(test)]
    fn linear_index_to_xy(&self, idx: usize) -> (usize, usize) {
        let y = idx / self.dimension;
        let x = idx % self.dimension;
        (x, self.dimension - 1 - y)
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.dimension * (self.dimension - y - 1) + x
    }
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("path", &self.path)
            .field("sw_corner", &self.sw_corner)
            .field("dimension", &self.dimension)
            .field("tile_type", &self.tile_type)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

/// Returns `N` for a file of `2·N·N` bytes.
pub fn dimension_from_len(len: u64) -> Option<usize> {
    let samples = len / size_of::<i16>() as u64;
    if len == 0 || len % size_of::<i16>() as u64 != 0 {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let approx = (samples as f64).sqrt() as u64;
    // Float sqrt can land one off for large inputs.
    (approx.saturating_sub(1)..=approx + 1)
        .find(|n| n * n == samples)
        .and_then(|n| usize::try_from(n).ok())
}

fn extract_dimension<P: AsRef<Path>>(path: P) -> Result<usize, HgtError> {
    let len = path.as_ref().metadata()?.len();
    dimension_from_len(len).ok_or_else(|| HgtError::HgtLen(len, path.as_ref().to_owned()))
}

/// Parses the southwest corner from a `[N|S]DD[E|W]DDD` file name.
pub fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, HgtError> {
    let mk_err = || HgtError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let digits = |s: &str| {
        s.bytes()
            .all(|b| b.is_ascii_digit())
            .then(|| s.parse::<i16>().ok())
            .flatten()
            .ok_or_else(mk_err)
    };
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * digits(&name[1..3])?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * digits(&name[4..7])?;
    if !(-90..90).contains(&lat) || !(-180..180).contains(&lon) {
        return Err(mk_err());
    }
    Ok(Coord { x: lon, y: lat })
}
