use crate::TileType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HgtError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid HGT name {0}")]
    HgtName(PathBuf),

    #[error("invalid HGT file len {0} for {1}")]
    HgtLen(u64, PathBuf),

    #[error("{path} has {dimension} samples per edge, {tile_type} expects {expected}")]
    TileType {
        tile_type: TileType,
        dimension: usize,
        expected: usize,
        path: PathBuf,
    },

    #[error("sample ({i}, {j}) out of range for {dimension}x{dimension} tile")]
    Range { i: usize, j: usize, dimension: usize },
}
