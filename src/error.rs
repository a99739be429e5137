use qrcode::EcLevel;
use thiserror::Error;

/// Failure taxonomy for one pipeline run. Every variant is scoped to the
/// request that triggered it; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input rejected before any encoding work (missing contact names,
    /// upload over the configured ceiling, malformed base64, bad colors).
    #[error("validation error: {0}")]
    Validation(String),

    /// Encoded payload does not fit the largest allowed symbol at the
    /// requested error-correction level.
    #[error(
        "payload is {encoded_bytes} bytes but a version {max_version} symbol \
         at level {level} holds at most {capacity_bytes} bytes \
         ({overage} bytes over). {hint}"
    )]
    Capacity {
        encoded_bytes: usize,
        capacity_bytes: usize,
        overage: usize,
        level: String,
        max_version: u8,
        hint: String,
    },

    /// The QR library refused the input for a reason other than capacity.
    #[error("QR encoding error: {0}")]
    Encoding(String),

    /// Image bytes could not be read or written (source upload, logo,
    /// or raster output). An unreadable logo aborts the whole encode
    /// rather than silently producing a logo-less symbol.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl PipelineError {
    pub fn capacity(encoded_bytes: usize, capacity_bytes: usize, level: EcLevel, max_version: u8) -> Self {
        PipelineError::Capacity {
            encoded_bytes,
            capacity_bytes,
            overage: encoded_bytes.saturating_sub(capacity_bytes),
            level: crate::capacity::level_name(level).to_string(),
            max_version,
            hint: crate::capacity::remediation_hint(level),
        }
    }
}
