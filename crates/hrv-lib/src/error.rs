//! Error types for HRV spectral analysis.

use thiserror::Error;

/// Errors raised while validating inputs or estimating spectra.
#[derive(Debug, Error)]
pub enum HrvError {
    /// Invalid analysis option (method set, norm method, band, factor, window name).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Input array is not a row, a column or a flat vector.
    #[error("invalid input shape: {0}")]
    Shape(String),

    /// Interval and time arrays have different lengths.
    #[error("shape mismatch between rri ({rri}) and trr ({trr})")]
    ShapeMismatch { rri: usize, trr: usize },

    /// Not enough signal to produce an estimate.
    #[error("not enough data: {0}")]
    NoData(String),

    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for HRV operations.
pub type Result<T> = std::result::Result<T, HrvError>;
