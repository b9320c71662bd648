use hgt::HgtError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("{0}")]
    Walk(#[from] walkdir::Error),

    #[error("{0}")]
    Hgt(#[from] HgtError),

    #[error("{path} has {found} samples per edge, matrix holds {expected}")]
    MixedDimensions {
        expected: usize,
        found: usize,
        path: PathBuf,
    },

    #[error("{path} is not aligned to the {footprint}° tile grid")]
    Misaligned { footprint: f64, path: PathBuf },

    #[error("{path} overlaps already loaded tile {existing}")]
    DuplicateTile { path: PathBuf, existing: PathBuf },

    #[error("coordinate ({lon}, {lat}) out of range")]
    Domain { lon: f64, lat: f64 },

    #[error("invalid resolution {0}")]
    Resolution(f64),
}

impl TerrainError {
    /// Returns `true` for errors raised while building an engine.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::NotADirectory(_)
            | Self::Walk(_)
            | Self::MixedDimensions { .. }
            | Self::Misaligned { .. }
            | Self::DuplicateTile { .. } => true,
            Self::Hgt(e) => !matches!(e, HgtError::Range { .. }),
            Self::Domain { .. } | Self::Resolution(_) => false,
        }
    }
}
