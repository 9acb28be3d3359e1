/// Error type shared by the whole crate.
///
/// The derived-state transforms themselves never fail: empty lists, absent
/// values and unknown value kinds all map to a definable output. Errors only
/// come from parsing input and from control values supplied by the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid JSON input: {0}")]
    InvalidJson(String),

    #[error("Rows per page must be a positive integer, got {0}")]
    InvalidRowsPerPage(usize),

    #[error("Page {page} out of range [1, {total_pages}]")]
    PageOutOfRange { page: usize, total_pages: usize },

    #[error("Row {index} out of range [0, {len})")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TableError>;
