use serde::{Deserialize, Serialize};

use crate::contact::ContactRecord;

/// User payload, one variant per input kind the form accepts.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PayloadInput {
    Url {
        url: String,
    },
    Text {
        text: String,
    },
    Image {
        /// Raw upload bytes, base64 (optionally a full data URI).
        content_base64: String,
        #[serde(default = "default_quality")]
        quality: u8,
        #[serde(default = "default_max_dimension")]
        max_dimension: u32,
    },
    File {
        content_base64: String,
    },
    Contact(ContactRecord),
}

#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    pub payload: PayloadInput,
    #[serde(default = "default_box_size")]
    pub box_size: u32,
    #[serde(default = "default_border")]
    pub border: u32,
    #[serde(default = "default_fg_color")]
    pub fg_color: String,
    #[serde(default = "default_bg_color")]
    pub bg_color: String,
    #[serde(default = "default_error_correction")]
    pub error_correction: String,
    #[serde(default = "default_shape")]
    pub shape: String,
    /// "fit" picks the smallest symbol version that holds the payload;
    /// "max" pins to the configured maximum version.
    #[serde(default = "default_version_policy")]
    pub version_policy: String,
    /// Optional logo image as base64 data URI or raw base64, composited at
    /// the center of the symbol.
    #[serde(default)]
    pub logo: Option<String>,
    /// Logo edge as a percentage of the rendered image (5-40, default 20).
    #[serde(default = "default_logo_ratio")]
    pub logo_ratio: u8,
}

/// Capacity check without rendering; the "encoded size" info the form shows
/// before the user commits to generating.
#[derive(Debug, Deserialize)]
pub struct PreflightRequest {
    pub payload: PayloadInput,
    #[serde(default = "default_error_correction")]
    pub error_correction: String,
}

#[derive(Debug, Serialize)]
pub struct QrResponse {
    /// `data:image/png;base64,...` preview string.
    pub image_base64: String,
    pub filename: String,
    pub mime: String,
    /// Symbol version actually used (1-40).
    pub version: i16,
    /// Module-grid side length (17 + 4 * version).
    pub modules: u32,
    pub encoded_bytes: usize,
    pub capacity_bytes: usize,
    pub encoded_size: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PreflightResponse {
    pub kind: String,
    pub encoded_bytes: usize,
    pub encoded_size: String,
    pub capacity_bytes: usize,
    pub level: String,
    pub max_version: u8,
    /// Smallest symbol version that holds the payload, when one exists.
    pub version_needed: Option<u8>,
    /// "proceed", "warn", or "reject".
    pub verdict: String,
    /// Warn message or rejection hint, when applicable.
    pub detail: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    pub status: u16,
}

impl ApiError {
    pub fn new(status: u16, code: &str, error: impl Into<String>) -> Self {
        ApiError {
            error: error.into(),
            code: code.to_string(),
            status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

fn default_quality() -> u8 {
    75
}
fn default_max_dimension() -> u32 {
    800
}
fn default_box_size() -> u32 {
    10
}
fn default_border() -> u32 {
    4
}
fn default_fg_color() -> String {
    "#000000".to_string()
}
fn default_bg_color() -> String {
    "#FFFFFF".to_string()
}
fn default_error_correction() -> String {
    "M".to_string()
}
fn default_shape() -> String {
    "square".to_string()
}
fn default_version_policy() -> String {
    "fit".to_string()
}
fn default_logo_ratio() -> u8 {
    20
}
