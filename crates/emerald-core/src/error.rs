//! Error types for emerald-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in emerald-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV error from the csv crate
    #[error("CSV error in '{resource}': {source}")]
    Csv {
        resource: String,
        #[source]
        source: csv::Error,
    },

    /// A CSV field could not be interpreted
    #[error("bad field in '{resource}' at row {row}: {message}")]
    CsvField {
        resource: String,
        row: usize,
        message: String,
    },

    /// Reference data could not be fetched
    #[error("reference data unavailable ({resource}): {message}")]
    ReferenceUnavailable { resource: String, message: String },

    /// The learnset source file does not exist
    #[error("could not find {0}")]
    SourceNotFound(PathBuf),

    /// Tilemap data is not a whole number of 16-bit entries
    #[error("tilemap '{name}' has odd length {len}")]
    TilemapLength { name: String, len: usize },

    /// Two tilemaps being compared differ in size
    #[error("tilemaps differ in size: {left} vs {right} entries")]
    TilemapSizeMismatch { left: usize, right: usize },

    /// A region lies outside the map
    #[error("region ({x0},{y0})-({x1},{y1}) is outside a {width}x{height} map")]
    RegionOutOfBounds {
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        width: usize,
        height: usize,
    },

    /// PNG decoding error
    #[error("failed to decode PNG '{path}': {source}")]
    PngDecode {
        path: PathBuf,
        #[source]
        source: png::DecodingError,
    },

    /// PNG encoding error
    #[error("failed to encode PNG '{path}': {source}")]
    PngEncode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    /// Image is not something the tile patcher can edit
    #[error("unsupported image '{path}': {message}")]
    UnsupportedImage { path: PathBuf, message: String },

    /// Tile index past the end of the sheet
    #[error("tile 0x{tile:02X} is outside a sheet of {count} tiles")]
    TileOutOfRange { tile: usize, count: usize },

    /// Palette index does not fit the image bit depth
    #[error("palette index 0x{value:02X} does not fit in {bit_depth}-bit pixels")]
    PixelValueOutOfRange { value: u8, bit_depth: u8 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
