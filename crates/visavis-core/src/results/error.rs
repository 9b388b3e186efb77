use crate::core::io::tables::TableError;
use crate::core::models::cell::CellId;
use crate::core::models::timepoint::{Timepoint, TimepointError};
use std::path::PathBuf;
use thiserror::Error;

/// Contract violations between the simulator's output and what the store expects.
#[derive(Debug, Error)]
pub enum ResultError {
    #[error("Simulation directory does not exist: {}", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("No neighbor relation file found at {}", path.display())]
    MissingNeighbors { path: PathBuf },

    #[error("No per-timepoint state files (t_<n>h.csv / t_<n>m.csv) in {}", path.display())]
    NoStateFiles { path: PathBuf },

    #[error("Cannot decode timepoint of '{file}': {source}")]
    MalformedTimepoint {
        file: String,
        source: TimepointError,
    },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Cell {id} appears more than once at {timepoint}")]
    DuplicateRecord { id: CellId, timepoint: Timepoint },

    #[error("Unknown column: '{0}'")]
    MissingColumn(String),

    #[error("No image found for {timepoint} in {}", directory.display())]
    MissingImage {
        timepoint: Timepoint,
        directory: PathBuf,
    },

    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
