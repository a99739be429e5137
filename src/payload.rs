use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::compress;
use crate::contact::ContactRecord;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Url,
    Text,
    Image,
    File,
    Contact,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Url => "url",
            PayloadKind::Text => "text",
            PayloadKind::Image => "image",
            PayloadKind::File => "file",
            PayloadKind::Contact => "contact",
        }
    }

    /// Download filename offered alongside the rendered PNG.
    pub fn suggested_filename(&self) -> String {
        format!("{}_qr_code.png", self.as_str())
    }
}

/// The normalized byte string handed to the symbol encoder, plus any
/// advisory warnings picked up along the way. Immutable once built;
/// discarded after the request.
#[derive(Debug)]
pub struct EncodedPayload {
    pub kind: PayloadKind,
    pub text: String,
    pub warnings: Vec<String>,
}

impl EncodedPayload {
    /// Re-measured length of what will actually be encoded. Capacity
    /// decisions use this, never a caller-declared size.
    pub fn encoded_bytes(&self) -> usize {
        self.text.len()
    }

    pub fn size_estimate(&self) -> String {
        human_size(self.text.len())
    }
}

pub fn human_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Decode a base64 content field, tolerating an optional `data:...;base64,`
/// prefix the way browser clients tend to send uploads.
pub fn decode_base64_content(value: &str, field: &str) -> Result<Vec<u8>, PipelineError> {
    let raw = match value.find(";base64,") {
        Some(pos) if value.starts_with("data:") => &value[pos + ";base64,".len()..],
        _ => value,
    };
    BASE64
        .decode(raw.trim())
        .map_err(|e| PipelineError::Validation(format!("invalid base64 in {}: {}", field, e)))
}

/// Format-only URL check. Failures surface as a warning, never a rejection;
/// encoding proceeds with the string verbatim.
fn looks_like_url(url: &str) -> bool {
    let rest = match url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split('/').next().unwrap_or("");
    !host.is_empty() && !host.contains(char::is_whitespace)
}

pub fn normalize_text(text: &str) -> Result<EncodedPayload, PipelineError> {
    if text.is_empty() {
        return Err(PipelineError::Validation("text payload cannot be empty".to_string()));
    }
    Ok(EncodedPayload {
        kind: PayloadKind::Text,
        text: text.to_string(),
        warnings: Vec::new(),
    })
}

pub fn normalize_url(url: &str) -> Result<EncodedPayload, PipelineError> {
    if url.is_empty() {
        return Err(PipelineError::Validation("url payload cannot be empty".to_string()));
    }
    let mut warnings = Vec::new();
    if !looks_like_url(url) {
        warnings.push(format!(
            "'{}' does not look like an http(s) URL; encoding it as-is",
            url
        ));
    }
    Ok(EncodedPayload {
        kind: PayloadKind::Url,
        text: url.to_string(),
        warnings,
    })
}

/// Arbitrary file bytes become a generic-binary data URL.
pub fn normalize_file(raw: &[u8]) -> Result<EncodedPayload, PipelineError> {
    if raw.is_empty() {
        return Err(PipelineError::Validation("file payload cannot be empty".to_string()));
    }
    Ok(EncodedPayload {
        kind: PayloadKind::File,
        text: format!("data:application/octet-stream;base64,{}", BASE64.encode(raw)),
        warnings: Vec::new(),
    })
}

/// Image bytes are resized/recompressed first, then wrapped in a data URL
/// whose mime type matches the compressor's output format.
pub fn normalize_image(raw: &[u8], max_dimension: u32, quality: u8) -> Result<EncodedPayload, PipelineError> {
    if raw.is_empty() {
        return Err(PipelineError::Validation("image payload cannot be empty".to_string()));
    }
    let compressed = compress::compress(raw, max_dimension, quality)?;
    Ok(EncodedPayload {
        kind: PayloadKind::Image,
        text: format!(
            "data:image/jpeg;base64,{}",
            BASE64.encode(&compressed.bytes)
        ),
        warnings: Vec::new(),
    })
}

pub fn normalize_contact(record: &ContactRecord) -> Result<EncodedPayload, PipelineError> {
    Ok(EncodedPayload {
        kind: PayloadKind::Contact,
        text: record.vcard_block()?,
        warnings: Vec::new(),
    })
}
