//! Error types
//!
//! None of these are fatal to a running game: layout errors are absorbed by
//! shrinking the grid, store errors are logged and dropped.

use thiserror::Error;

/// Grid geometry that cannot be drawn on the reported canvas
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("grid of {grid_size}x{grid_size} does not fit a {width}x{height} canvas")]
    Degenerate {
        grid_size: u32,
        width: u32,
        height: u32,
    },
    #[error("no target position fits after {draws} draws")]
    NoFittingTarget { draws: u32 },
}

/// Ranking store read/write failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("ranking store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("ranking document is malformed: {0}")]
    Format(#[from] serde_json::Error),
    #[error("ranking store unavailable: {0}")]
    Unavailable(String),
}

/// Settings file that exists but cannot be used
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}
