use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Reasons a raw grid cannot become a [`Board`](crate::Board).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("board must be NxN with size >= 2, got {0} rows")]
    TooSmall(usize),
    #[error("board size {size} exceeds the maximum of {max}")]
    TooLarge { size: usize, max: usize },
    #[error("board must be NxN: row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("board must contain numbers from 0 to {max}, found {value}")]
    OutOfRange { value: i64, max: usize },
    #[error("board must contain unique numbers, {value} appears more than once")]
    Duplicate { value: i64 },
    #[error("board must contain number 0")]
    MissingBlank,
}

/// Failures of a solve request. Every variant is final for that request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("invalid board: {0}")]
    Invalid(#[from] ValidationError),
    #[error("this board configuration is not solvable")]
    Unsolvable,
    #[error("time limit exceeded after {elapsed:?} ({nodes_explored} nodes explored)")]
    Timeout {
        elapsed: Duration,
        nodes_explored: u64,
    },
    /// The frontier emptied on a board the parity check accepted.
    #[error("search exhausted {nodes_explored} nodes without reaching the goal")]
    SearchExhausted { nodes_explored: u64 },
}

#[derive(Error, Debug)]
pub enum PatternDbError {
    #[error("failed to access pattern database {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode pattern database: {0}")]
    Decode(#[source] bincode::Error),
    #[error("failed to encode pattern database: {0}")]
    Encode(#[source] bincode::Error),
    #[error("unsupported pattern database format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("invalid pattern tile set {0:?}")]
    InvalidTiles(Vec<u8>),
    #[error("pattern database has {found} entries, expected {expected}")]
    TableSize { found: usize, expected: usize },
    #[error("pattern databases overlap on tile {0}")]
    Overlap(u8),
    #[error("pattern database has no entry for the goal state")]
    MissingGoal,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
