//! Whole-globe tile registry.

use crate::TerrainError;
use geo::geometry::Coord;
use hgt::{Tile, C};

const LON_SLOTS: usize = 360;
const LAT_SLOTS: usize = 180;

/// One optional [Tile] per whole-degree southwest corner.
///
/// Every tile in a matrix has the same sample-grid size. Tiles whose
/// footprint is wider than a degree occupy the single slot at their
/// southwest corner.
pub struct Matrix {
    /// Degrees spanned by each tile.
    footprint: C,

    /// Samples per tile edge, set by the first insert.
    dimension: Option<usize>,

    /// Indexed by `(lon + 180) + 360 * (lat + 90)`.
    tiles: Box<[Option<Tile>]>,

    /// Number of occupied slots.
    len: usize,
}

impl Matrix {
    /// Returns an empty matrix for tiles spanning `footprint` degrees.
    pub fn new(footprint: C) -> Self {
        let tiles = std::iter::repeat_with(|| None)
            .take(LON_SLOTS * LAT_SLOTS)
            .collect();
        Self {
            footprint,
            dimension: None,
            tiles,
            len: 0,
        }
    }

    /// Takes ownership of `tile`, placing it at its southwest corner.
    pub fn insert(&mut self, tile: Tile) -> Result<(), TerrainError> {
        if let Some(expected) = self.dimension {
            if expected != tile.dimension() {
                return Err(TerrainError::MixedDimensions {
                    expected,
                    found: tile.dimension(),
                    path: tile.path().to_owned(),
                });
            }
        }
        let corner = tile.sw_corner();
        if !on_grid(corner.x + 180, self.footprint) || !on_grid(corner.y + 90, self.footprint) {
            return Err(TerrainError::Misaligned {
                footprint: self.footprint,
                path: tile.path().to_owned(),
            });
        }
        let slot = &mut self.tiles[corner_index(corner)];
        if let Some(existing) = slot {
            return Err(TerrainError::DuplicateTile {
                path: tile.path().to_owned(),
                existing: existing.path().to_owned(),
            });
        }
        self.dimension = Some(tile.dimension());
        *slot = Some(tile);
        self.len += 1;
        Ok(())
    }

    /// Returns the sample nearest to (`lon`, `lat`), or `None` if no
    /// tile covers it.
    ///
    /// `lon` must already be in `[-180, 180)`. Latitudes at or past
    /// the north pole resolve to the northernmost sample row, and
    /// longitudes that round up onto 180 resolve to the easternmost
    /// column.
    pub fn lookup(&self, lon: C, lat: C) -> Result<Option<i16>, TerrainError> {
        let Some(dimension) = self.dimension else {
            return Ok(None);
        };
        #[allow(clippy::cast_precision_loss)]
        let resolution = self.footprint / dimension as C;
        let lat = lat.min(90.0 - resolution / 2.0);

        let x = lon + 180.0;
        let x = if lon < 180.0 {
            x.min(360.0 - resolution / 2.0)
        } else {
            x
        };
        let y = lat + 90.0;
        if !(0.0..360.0).contains(&x) || !(0.0..180.0).contains(&y) {
            return Ok(None);
        }

        let tile_x = x - x % self.footprint;
        let tile_y = y - y % self.footprint;
        let Some(tile) = &self.tiles[shifted_index(tile_x, tile_y)] else {
            return Ok(None);
        };

        let i = cell(x - tile_x, resolution, dimension);
        let j = cell(y - tile_y, resolution, dimension);
        Ok(Some(tile.sample(i, j)?))
    }

    /// Returns the tile whose southwest corner is `sw_corner`.
    pub fn get(&self, sw_corner: Coord<i16>) -> Option<&Tile> {
        let in_range = (-180..180).contains(&sw_corner.x) && (-90..90).contains(&sw_corner.y);
        in_range
            .then(|| self.tiles[corner_index(sw_corner)].as_ref())
            .flatten()
    }

    /// Returns an iterator over every tile in this matrix.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().flatten()
    }

    pub fn footprint(&self) -> C {
        self.footprint
    }

    /// Samples per tile edge, `None` until a tile is inserted.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Degrees per sample, `None` until a tile is inserted.
    #[allow(clippy::cast_precision_loss)]
    pub fn resolution(&self) -> Option<C> {
        self.dimension.map(|n| self.footprint / n as C)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matrix")
            .field("footprint", &self.footprint)
            .field("dimension", &self.dimension)
            .field("len", &self.len)
            .finish()
    }
}

/// Slot index for a tile's southwest corner.
///
/// Corners are range checked when tile names are parsed.
#[allow(clippy::cast_sign_loss)]
fn corner_index(Coord { x, y }: Coord<i16>) -> usize {
    debug_assert!((-180..180).contains(&x) && (-90..90).contains(&y));
    let col = (i32::from(x) + 180) as usize;
    let row = (i32::from(y) + 90) as usize;
    col + LON_SLOTS * row
}

/// Returns `true` if `shifted` (a corner in whole shifted degrees) is
/// the floor of some multiple of `footprint`.
fn on_grid(shifted: i16, footprint: C) -> bool {
    let shifted = C::from(shifted);
    ((shifted / footprint).ceil() * footprint).floor() == shifted
}

/// Slot index for a tile origin in shifted (`[0, 360)`, `[0, 180)`)
/// degree space.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shifted_index(x: C, y: C) -> usize {
    let col = (x.floor() as usize).min(LON_SLOTS - 1);
    let row = (y.floor() as usize).min(LAT_SLOTS - 1);
    col + LON_SLOTS * row
}

/// Index of the cell `offset` degrees into a tile, clamped to absorb
/// rounding at the far edge.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell(offset: C, resolution: C, dimension: usize) -> usize {
    ((offset / resolution).floor() as usize).min(dimension - 1)
}

#[cfg(test)]
mod tests {
    use super::{corner_index, on_grid, shifted_index, Coord, Matrix};
    use crate::test_util::write_tile;
    use crate::TerrainError;
    use approx::assert_relative_eq;
    use hgt::{Tile, TileType, VOID};
    use tempfile::TempDir;

    #[test]
    fn test_index_agreement() {
        for (lon, lat) in [(-180, -90), (0, 0), (179, 89), (-72, 44), (24, -61)] {
            let corner = Coord { x: lon, y: lat };
            assert_eq!(
                corner_index(corner),
                shifted_index(f64::from(lon) + 180.0, f64::from(lat) + 90.0)
            );
        }
        assert_eq!(corner_index(Coord { x: 179, y: 89 }), 360 * 180 - 1);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = Matrix::new(1.0);
        assert!(matrix.is_empty());
        assert_eq!(matrix.dimension(), None);
        assert_eq!(matrix.resolution(), None);
        assert_eq!(matrix.lookup(0.0, 0.0).unwrap(), None);
    }

    #[test]
    fn test_lookup_cells() {
        let dir = TempDir::new().unwrap();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let value = |i: usize, j: usize| (100 * j + i) as i16;
        let path = write_tile(dir.path(), "N60E024.hgt", 10, value);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(path).unwrap()).unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.dimension(), Some(10));
        assert_relative_eq!(matrix.resolution().unwrap(), 0.1);

        // Southwest-most cell.
        assert_eq!(matrix.lookup(24.0, 60.0).unwrap(), Some(value(0, 0)));
        assert_eq!(matrix.lookup(24.05, 60.05).unwrap(), Some(value(0, 0)));
        assert_eq!(matrix.lookup(24.55, 60.25).unwrap(), Some(value(5, 2)));
        // Northeast-most cell.
        assert_eq!(matrix.lookup(24.99, 60.999).unwrap(), Some(value(9, 9)));
        // Neighbours have no tile.
        assert_eq!(matrix.lookup(23.99, 60.5).unwrap(), None);
        assert_eq!(matrix.lookup(25.0, 60.5).unwrap(), None);
        assert_eq!(matrix.lookup(24.5, 61.0).unwrap(), None);
        assert_eq!(matrix.lookup(24.5, -60.5).unwrap(), None);
    }

    #[test]
    fn test_negative_corners() {
        let dir = TempDir::new().unwrap();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let value = |i: usize, j: usize| (10 * j + i) as i16;
        let path = write_tile(dir.path(), "S01W001.hgt", 4, value);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(path).unwrap()).unwrap();
        assert_eq!(matrix.lookup(-1.0, -1.0).unwrap(), Some(value(0, 0)));
        assert_eq!(matrix.lookup(-0.1, -0.1).unwrap(), Some(value(3, 3)));
        assert_eq!(matrix.lookup(-0.6, -0.3).unwrap(), Some(value(1, 2)));
        assert_eq!(matrix.lookup(0.0, -0.5).unwrap(), None);
    }

    #[test]
    fn test_void_is_returned_as_is() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), "N00E000.hgt", 3, |_, _| VOID);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(path).unwrap()).unwrap();
        assert_eq!(matrix.lookup(0.5, 0.5).unwrap(), Some(VOID));
    }

    #[test]
    fn test_north_pole_clamps_to_last_row() {
        let dir = TempDir::new().unwrap();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let value = |i: usize, j: usize| (100 * j + i) as i16;
        let path = write_tile(dir.path(), "N89E000.hgt", 11, value);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(path).unwrap()).unwrap();
        assert_eq!(matrix.lookup(0.0, 90.0).unwrap(), Some(value(0, 10)));
        assert_eq!(matrix.lookup(0.999, 95.0).unwrap(), Some(value(10, 10)));
    }

    #[test]
    fn test_south_pole() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), "S90W180.hgt", 5, |i, j| {
            if (i, j) == (0, 0) {
                -7
            } else {
                1
            }
        });
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(path).unwrap()).unwrap();
        assert_eq!(matrix.lookup(-180.0, -90.0).unwrap(), Some(-7));
    }

    #[test]
    fn test_wide_footprint_reroutes_to_corner() {
        let dir = TempDir::new().unwrap();
        // 22.5° tiles anchored at -135°E, 67.5°N. The name floors the
        // latitude.
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let value = |i: usize, j: usize| (10 * j + i) as i16;
        let path = write_tile(dir.path(), "N67W135.hgt", 9, value);
        let mut matrix = Matrix::new(TileType::Dem81_1001.footprint());
        matrix.insert(Tile::open(path).unwrap()).unwrap();

        // 22.5 / 9 = 2.5° per sample.
        assert_eq!(matrix.lookup(-135.0, 67.5).unwrap(), Some(value(0, 0)));
        assert_eq!(matrix.lookup(-130.0, 72.6).unwrap(), Some(value(2, 2)));
        assert_eq!(matrix.lookup(-112.6, 89.9).unwrap(), Some(value(8, 8)));
        assert_eq!(matrix.lookup(-112.5, 80.0).unwrap(), None);
        assert_eq!(matrix.lookup(-120.0, 67.4).unwrap(), None);
    }

    #[test]
    fn test_nine_degree_footprint() {
        let dir = TempDir::new().unwrap();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let value = |i: usize, j: usize| (10 * j + i) as i16;
        let path = write_tile(dir.path(), "S09E000.hgt", 3, value);
        let mut matrix = Matrix::new(TileType::Dem27_1201.footprint());
        matrix.insert(Tile::open(path).unwrap()).unwrap();
        assert_eq!(matrix.lookup(0.0, -9.0).unwrap(), Some(value(0, 0)));
        assert_eq!(matrix.lookup(4.0, -4.0).unwrap(), Some(value(1, 1)));
        assert_eq!(matrix.lookup(8.99, -0.01).unwrap(), Some(value(2, 2)));
        assert_eq!(matrix.lookup(4.0, 0.0).unwrap(), None);
    }

    #[test]
    fn test_out_of_range_coordinates_have_no_tile() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), "S90W180.hgt", 2, |_, _| 1);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(path).unwrap()).unwrap();
        assert_eq!(matrix.lookup(-180.5, -89.5).unwrap(), None);
        assert_eq!(matrix.lookup(-179.5, -90.5).unwrap(), None);
        assert_eq!(matrix.lookup(f64::NAN, 0.0).unwrap(), None);
    }

    #[test]
    fn test_last_double_before_antimeridian() {
        let dir = TempDir::new().unwrap();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let value = |i: usize, j: usize| (10 * j + i) as i16;
        let path = write_tile(dir.path(), "N00E179.hgt", 4, value);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(path).unwrap()).unwrap();

        let lon = f64::from_bits(180.0_f64.to_bits() - 1);
        assert!(lon < 180.0);
        assert_eq!(lon + 180.0, 360.0);
        assert_eq!(matrix.lookup(lon, 0.5).unwrap(), Some(value(3, 2)));
        assert_eq!(matrix.lookup(179.9, 0.5).unwrap(), Some(value(3, 2)));
        assert_eq!(matrix.lookup(180.0, 0.5).unwrap(), None);
    }

    #[test]
    fn test_on_grid() {
        for shifted in [0, 1, 179, 359] {
            assert!(on_grid(shifted, 1.0));
        }
        assert!(on_grid(0, 9.0));
        assert!(on_grid(351, 9.0));
        assert!(!on_grid(1, 9.0));
        assert!(on_grid(3, 3.0));
        assert!(!on_grid(4, 3.0));
        assert!(on_grid(22, 22.5));
        assert!(on_grid(45, 22.5));
        assert!(on_grid(157, 22.5));
        assert!(!on_grid(23, 22.5));
        assert!(!on_grid(44, 22.5));
    }

    #[test]
    fn test_insert_misaligned_wide_tile() {
        let dir = TempDir::new().unwrap();
        let aligned = write_tile(dir.path(), "N00E000.hgt", 3, |_, _| 0);
        let off_lat = write_tile(dir.path(), "N01E000.hgt", 3, |_, _| 0);
        let off_lon = write_tile(dir.path(), "S09E004.hgt", 3, |_, _| 0);
        let mut matrix = Matrix::new(TileType::Dem27_1201.footprint());
        matrix.insert(Tile::open(aligned).unwrap()).unwrap();
        for path in [off_lat, off_lon] {
            let err = matrix.insert(Tile::open(path).unwrap()).unwrap_err();
            assert!(matches!(err, TerrainError::Misaligned { .. }));
            assert!(err.is_configuration());
        }
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn test_insert_mixed_dimensions() {
        let dir = TempDir::new().unwrap();
        let a = write_tile(dir.path(), "N00E000.hgt", 3, |_, _| 0);
        let b = write_tile(dir.path(), "N00E001.hgt", 4, |_, _| 0);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(a).unwrap()).unwrap();
        let err = matrix.insert(Tile::open(b).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            TerrainError::MixedDimensions {
                expected: 3,
                found: 4,
                ..
            }
        ));
        assert!(err.is_configuration());
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn test_insert_duplicate() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        let a = write_tile(&dir.path().join("a"), "N00E000.hgt", 3, |_, _| 0);
        let b = write_tile(&dir.path().join("b"), "N00E000.hgt", 3, |_, _| 0);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(a).unwrap()).unwrap();
        assert!(matches!(
            matrix.insert(Tile::open(b).unwrap()),
            Err(TerrainError::DuplicateTile { .. })
        ));
    }

    #[test]
    fn test_get() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), "N44W072.hgt", 3, |_, _| 0);
        let mut matrix = Matrix::new(1.0);
        matrix.insert(Tile::open(&path).unwrap()).unwrap();
        let corner = Coord { x: -72, y: 44 };
        assert_eq!(matrix.get(corner).unwrap().path(), path);
        assert!(matrix.get(Coord { x: -71, y: 44 }).is_none());
        assert!(matrix.get(Coord { x: 180, y: 0 }).is_none());
        assert_eq!(matrix.tiles().count(), 1);
    }
}
