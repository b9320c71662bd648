//! Tile file discovery.

use crate::TerrainError;
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Returns every tile file under `root`, sorted by path.
///
/// A tile file is a regular file whose name parses as a southwest
/// corner (`N44W072.hgt`) and whose length is `2·N·N` bytes. Anything
/// else is skipped.
pub fn discover<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>, TerrainError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(TerrainError::NotADirectory(root.to_owned()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if hgt::parse_sw_corner(path).is_err() {
            debug!("skipping {path:?}; not a tile name");
            continue;
        }
        let len = entry.metadata()?.len();
        if hgt::dimension_from_len(len).is_none() {
            debug!("skipping {path:?}; invalid len {len}");
            continue;
        }
        paths.push(entry.into_path());
    }
    paths.sort();
    Ok(paths)
}
