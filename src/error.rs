// Error types for the Flamingo uploader library.

use thiserror::Error;

/// Result type alias for uploader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a conversion pass or an ESDR request.
///
/// Per-line problems in the CSV (wrong field count, error code, checksum)
/// are not errors: they are reported as [`SkipReason`](crate::record::SkipReason)
/// and the pass continues.
#[derive(Debug, Error)]
pub enum Error {
    /// The data file did not yield a single line
    #[error("the data file is empty")]
    EmptyInput,

    /// The first line of the data file has no usable serial number
    #[error("failed to read the serial number from the first line")]
    MissingSerialNumber,

    /// I/O error while reading the CSV or writing the JSON body
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ESDR answered with a non-success status
    #[error("ESDR returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Invalid user configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The temp file for the upload body could not be created
    #[error("failed to create a temp file: {0}")]
    TempFile(String),
}
