//! Error types for gati-cal

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// gati-cal error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration serialize error
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Calibration blob has the wrong size
    #[error("Calibration blob size mismatch: expected {expected} bytes, got {actual}")]
    BlobSize {
        /// Expected blob size in bytes
        expected: usize,
        /// Actual number of bytes read
        actual: usize,
    },

    /// Calibration record file ended before a section was fully read
    #[error("Truncated calibration record: short read in {section} section")]
    TruncatedRecord {
        /// Name of the section that could not be read in full
        section: &'static str,
    },

    /// Unknown device type in configuration
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Operation not supported
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Device-level failure reported by the controller driver
    #[error("Device error: {0}")]
    Device(String),
}
