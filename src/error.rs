use thiserror::Error;

/// Result type for multipolygon processing.
pub type Result<T> = std::result::Result<T, MultiPolygonError>;

/// Conditions that abort processing of the current relation (or, for input
/// and I/O errors, of the whole run).
#[derive(Error, Debug)]
pub enum MultiPolygonError {
    #[error("ring of ways {way_ids:?} is not closed")]
    OpenRing { way_ids: Vec<u64> },

    #[error("index {index} out of range for {len} {what}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
