use qrcode::EcLevel;

use crate::capacity::{self, Verdict};
use crate::error::PipelineError;
use crate::payload::{human_size, EncodedPayload};
use crate::qr::{self, QrOptions, VersionPolicy};

/// Deployment-level guards, read once from the environment at startup.
/// The upload ceiling is a UX guard on raw input size; symbol capacity is
/// enforced separately by the gate.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_upload_bytes: usize,
    pub max_version: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_upload_bytes: 10 * 1024 * 1024,
            max_version: 40,
        }
    }
}

impl Limits {
    pub fn from_env() -> Self {
        let defaults = Limits::default();
        let max_upload_bytes = std::env::var("UPLOAD_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);
        let max_version: u8 = std::env::var("QR_MAX_VERSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_version);
        Limits {
            max_upload_bytes,
            max_version: max_version.clamp(1, 40),
        }
    }

    /// Checked against the bytes actually received, never a declared size.
    pub fn check_upload(&self, measured_bytes: usize, what: &str) -> Result<(), PipelineError> {
        if measured_bytes > self.max_upload_bytes {
            return Err(PipelineError::Validation(format!(
                "{} upload is {} but the limit is {}",
                what,
                human_size(measured_bytes),
                human_size(self.max_upload_bytes),
            )));
        }
        Ok(())
    }
}

/// Everything a caller needs to preview and download one encoded symbol.
#[derive(Debug)]
pub struct EncodeOutcome {
    pub png: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
    pub version: i16,
    /// Module-grid side length (17 + 4 * version).
    pub modules: u32,
    pub encoded_bytes: usize,
    pub capacity_bytes: usize,
    pub encoded_size: String,
    pub warnings: Vec<String>,
}

/// Run the back half of the pipeline: capacity gate, then symbol encode,
/// then raster render and optional logo overlay. The gate always runs
/// first so oversized payloads never reach the encoder.
pub fn encode(
    payload: &EncodedPayload,
    options: &QrOptions,
    policy: VersionPolicy,
    logo: Option<(&[u8], u8)>,
    max_version: u8,
) -> Result<EncodeOutcome, PipelineError> {
    let max_version = max_version.clamp(1, 40);
    let level = options.error_correction;
    let encoded_bytes = payload.encoded_bytes();
    let capacity_bytes = capacity::ceiling(level, max_version);

    let mut warnings = payload.warnings.clone();
    match capacity::evaluate(encoded_bytes, level, max_version) {
        Verdict::Reject { .. } => {
            return Err(PipelineError::capacity(
                encoded_bytes,
                capacity_bytes,
                level,
                max_version,
            ));
        }
        Verdict::Warn(msg) => warnings.push(msg),
        Verdict::Proceed => {}
    }

    if logo.is_some() && matches!(level, EcLevel::L | EcLevel::M) {
        warnings.push(
            "logo overlays obscure modules; error-correction level Q or H is \
             recommended when a logo is present"
                .to_string(),
        );
    }

    let code = qr::encode_symbol(payload.text.as_bytes(), level, policy, max_version)?;
    let mut img = qr::render_image(&code, options);
    if let Some((logo_bytes, ratio)) = logo {
        qr::overlay_logo(&mut img, logo_bytes, ratio, options.bg_color)?;
    }
    let png = qr::encode_png(&img)?;

    Ok(EncodeOutcome {
        png,
        filename: payload.kind.suggested_filename(),
        mime: "image/png",
        version: qr::symbol_version(&code),
        modules: code.width() as u32,
        encoded_bytes,
        capacity_bytes,
        encoded_size: payload.size_estimate(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{normalize_text, normalize_url, PayloadKind};
    use crate::qr::ModuleShape;

    fn options(level: EcLevel) -> QrOptions {
        QrOptions {
            box_size: 6,
            border: 4,
            fg_color: [0, 0, 0, 255],
            bg_color: [255, 255, 255, 255],
            error_correction: level,
            shape: ModuleShape::Square,
        }
    }

    #[test]
    fn text_payload_encodes_end_to_end() {
        let payload = normalize_text("hello world").unwrap();
        let out = encode(&payload, &options(EcLevel::M), VersionPolicy::Fit, None, 40).unwrap();
        assert_eq!(&out.png[0..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(out.filename, "text_qr_code.png");
        assert_eq!(out.mime, "image/png");
        assert_eq!(out.modules, 17 + 4 * out.version as u32);
        assert_eq!(out.encoded_bytes, 11);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn oversized_payload_is_rejected_before_encoding() {
        let payload = EncodedPayload {
            kind: PayloadKind::File,
            text: "x".repeat(3000),
            warnings: Vec::new(),
        };
        let err = encode(&payload, &options(EcLevel::L), VersionPolicy::Fit, None, 40).unwrap_err();
        match err {
            PipelineError::Capacity {
                encoded_bytes,
                capacity_bytes,
                overage,
                ..
            } => {
                assert_eq!(encoded_bytes, 3000);
                assert_eq!(capacity_bytes, 2953);
                assert_eq!(overage, 47);
            }
            other => panic!("expected capacity error, got {:?}", other),
        }
    }

    #[test]
    fn payload_at_exact_capacity_encodes() {
        let payload = EncodedPayload {
            kind: PayloadKind::File,
            text: "x".repeat(2953),
            warnings: Vec::new(),
        };
        // Small boxes keep the version-40 raster manageable in tests.
        let mut o = options(EcLevel::L);
        o.box_size = 1;
        let out = encode(&payload, &o, VersionPolicy::Fit, None, 40).unwrap();
        assert_eq!(out.version, 40);
        // Exact fit is over the warn threshold.
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn near_capacity_payload_warns_but_proceeds() {
        let payload = EncodedPayload {
            kind: PayloadKind::Text,
            text: "x".repeat(2500),
            warnings: Vec::new(),
        };
        let mut o = options(EcLevel::L);
        o.box_size = 1;
        let out = encode(&payload, &o, VersionPolicy::Fit, None, 40).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("level L")));
    }

    #[test]
    fn url_warning_is_carried_through() {
        let payload = normalize_url("not a url").unwrap();
        let out = encode(&payload, &options(EcLevel::M), VersionPolicy::Fit, None, 40).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("does not look like")));
    }

    #[test]
    fn logo_with_low_ec_level_adds_advisory() {
        let logo: image::RgbaImage =
            image::ImageBuffer::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        logo.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        let logo_bytes = buf.into_inner();

        let payload = normalize_text("logo advisory").unwrap();
        let out = encode(
            &payload,
            &options(EcLevel::M),
            VersionPolicy::Fit,
            Some((&logo_bytes, 20)),
            40,
        )
        .unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("Q or H")));
    }

    #[test]
    fn gate_respects_configured_max_version() {
        let payload = normalize_text(&"y".repeat(100)).unwrap();
        let err = encode(&payload, &options(EcLevel::L), VersionPolicy::Fit, None, 2).unwrap_err();
        assert!(matches!(err, PipelineError::Capacity { .. }));
    }

    #[test]
    fn upload_limit_uses_measured_bytes() {
        let limits = Limits {
            max_upload_bytes: 100,
            max_version: 40,
        };
        assert!(limits.check_upload(100, "image").is_ok());
        let err = limits.check_upload(101, "image").unwrap_err();
        assert!(err.to_string().contains("limit"));
    }
}
