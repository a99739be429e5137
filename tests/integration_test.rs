// End-to-end pipeline tests: normalize -> capacity gate -> encode -> render,
// with rqrr verifying that rendered symbols decode back to the exact payload.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use qrcode::EcLevel;

use qr_studio::contact::ContactRecord;
use qr_studio::error::PipelineError;
use qr_studio::payload::{self, EncodedPayload, PayloadKind};
use qr_studio::pipeline;
use qr_studio::qr::{ModuleShape, QrOptions, VersionPolicy};

fn options(level: EcLevel, shape: ModuleShape) -> QrOptions {
    QrOptions {
        box_size: 10,
        border: 4,
        fg_color: [0, 0, 0, 255],
        bg_color: [255, 255, 255, 255],
        error_correction: level,
        shape,
    }
}

fn decode_png(png: &[u8]) -> String {
    let img = image::load_from_memory(png).unwrap().to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(img);
    let grids = prepared.detect_grids();
    assert!(!grids.is_empty(), "no QR grid detected in rendered image");
    let (_meta, content) = grids.into_iter().next().unwrap().decode().unwrap();
    content
}

fn tiny_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img: image::RgbaImage = image::ImageBuffer::from_pixel(width, height, image::Rgba(color));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[test]
fn test_text_roundtrip_hello_world() {
    let payload = payload::normalize_text("hello world").unwrap();
    let out = pipeline::encode(
        &payload,
        &options(EcLevel::M, ModuleShape::Square),
        VersionPolicy::Fit,
        None,
        40,
    )
    .unwrap();
    assert_eq!(decode_png(&out.png), "hello world");
}

#[test]
fn test_url_roundtrip() {
    let payload = payload::normalize_url("https://example.com/a/b?c=d").unwrap();
    assert!(payload.warnings.is_empty());
    let out = pipeline::encode(
        &payload,
        &options(EcLevel::M, ModuleShape::Square),
        VersionPolicy::Fit,
        None,
        40,
    )
    .unwrap();
    assert_eq!(decode_png(&out.png), "https://example.com/a/b?c=d");
    assert_eq!(out.filename, "url_qr_code.png");
}

#[test]
fn test_contact_roundtrip_exact_block() {
    let record = ContactRecord {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        ..Default::default()
    };
    let expected = record.vcard_block().unwrap();

    let payload = payload::normalize_contact(&record).unwrap();
    let out = pipeline::encode(
        &payload,
        &options(EcLevel::M, ModuleShape::Square),
        VersionPolicy::Fit,
        None,
        40,
    )
    .unwrap();

    let decoded = decode_png(&out.png);
    assert_eq!(decoded, expected);
    assert!(decoded.contains("FN:Jane Doe"));
    assert!(decoded.contains("EMAIL:\n"));
    assert!(decoded.contains("ORG:\n"));
}

#[test]
fn test_file_roundtrip_recovers_original_bytes() {
    let original: Vec<u8> = (0u8..=63).collect();
    let payload = payload::normalize_file(&original).unwrap();
    let out = pipeline::encode(
        &payload,
        &options(EcLevel::M, ModuleShape::Square),
        VersionPolicy::Fit,
        None,
        40,
    )
    .unwrap();

    let decoded = decode_png(&out.png);
    let b64 = decoded
        .strip_prefix("data:application/octet-stream;base64,")
        .expect("decoded payload should be a generic-binary data URL");
    assert_eq!(BASE64.decode(b64).unwrap(), original);
}

#[test]
fn test_image_roundtrip_yields_loadable_jpeg() {
    let source = tiny_png(64, 48, [180, 40, 90, 255]);
    let payload = payload::normalize_image(&source, 32, 60).unwrap();
    let out = pipeline::encode(
        &payload,
        &options(EcLevel::M, ModuleShape::Square),
        VersionPolicy::Fit,
        None,
        40,
    )
    .unwrap();

    let decoded = decode_png(&out.png);
    let b64 = decoded
        .strip_prefix("data:image/jpeg;base64,")
        .expect("decoded payload should be a jpeg data URL");
    let jpeg = BASE64.decode(b64).unwrap();
    let img = image::load_from_memory(&jpeg).unwrap();
    // 64x48 capped at 32: 48 * 32 / 64 = 24.
    assert_eq!((img.width(), img.height()), (32, 24));
}

#[test]
fn test_roundtrip_every_shape() {
    for shape in [
        ModuleShape::Square,
        ModuleShape::Circle,
        ModuleShape::Rounded,
        ModuleShape::GappedSquare,
    ] {
        let payload = payload::normalize_text("shape roundtrip").unwrap();
        let out = pipeline::encode(
            &payload,
            &options(EcLevel::M, shape),
            VersionPolicy::Fit,
            None,
            40,
        )
        .unwrap();
        assert_eq!(
            decode_png(&out.png),
            "shape roundtrip",
            "shape {:?} failed to round-trip",
            shape
        );
    }
}

#[test]
fn test_roundtrip_custom_colors() {
    let payload = payload::normalize_text("colored modules").unwrap();
    let mut opts = options(EcLevel::Q, ModuleShape::Square);
    opts.fg_color = [0, 51, 102, 255]; // dark blue
    opts.bg_color = [240, 248, 255, 255]; // near white
    let out = pipeline::encode(&payload, &opts, VersionPolicy::Fit, None, 40).unwrap();
    assert_eq!(decode_png(&out.png), "colored modules");
}

#[test]
fn test_capacity_rejection_before_encoder() {
    // 3000 bytes at level L exceeds the version-40 ceiling of 2953.
    let payload = EncodedPayload {
        kind: PayloadKind::File,
        text: "z".repeat(3000),
        warnings: Vec::new(),
    };
    let err = pipeline::encode(
        &payload,
        &options(EcLevel::L, ModuleShape::Square),
        VersionPolicy::Fit,
        None,
        40,
    )
    .unwrap_err();

    match err {
        PipelineError::Capacity { overage, capacity_bytes, hint, .. } => {
            assert_eq!(capacity_bytes, 2953);
            assert_eq!(overage, 47);
            assert!(!hint.is_empty());
        }
        other => panic!("expected capacity rejection, got {:?}", other),
    }
}

#[test]
fn test_rejection_applies_at_every_level() {
    for (level, ceiling) in [
        (EcLevel::L, 2953usize),
        (EcLevel::M, 2331),
        (EcLevel::Q, 1663),
        (EcLevel::H, 1273),
    ] {
        let payload = EncodedPayload {
            kind: PayloadKind::Text,
            text: "a".repeat(ceiling + 1),
            warnings: Vec::new(),
        };
        let result = pipeline::encode(
            &payload,
            &options(level, ModuleShape::Square),
            VersionPolicy::Fit,
            None,
            40,
        );
        assert!(
            matches!(result, Err(PipelineError::Capacity { .. })),
            "level {:?} should reject {} bytes",
            level,
            ceiling + 1
        );
    }
}

#[test]
fn test_compressor_caps_larger_dimension_exactly() {
    let source = tiny_png(1500, 1000, [20, 120, 200, 255]);
    let payload = payload::normalize_image(&source, 400, 50).unwrap();
    let b64 = payload.text.strip_prefix("data:image/jpeg;base64,").unwrap();
    let jpeg = BASE64.decode(b64).unwrap();
    let img = image::load_from_memory(&jpeg).unwrap();
    // 1000 * 400 / 1500 = 266.67, floored.
    assert_eq!((img.width(), img.height()), (400, 266));
}

#[test]
fn test_max_version_policy_produces_densest_symbol() {
    let payload = payload::normalize_text("dense").unwrap();
    let mut opts = options(EcLevel::L, ModuleShape::Square);
    opts.box_size = 2;
    let out = pipeline::encode(&payload, &opts, VersionPolicy::Max, None, 40).unwrap();
    assert_eq!(out.version, 40);
    assert_eq!(out.modules, 177);
}

#[test]
fn test_logo_overlay_roundtrip_at_high_ec() {
    let logo = tiny_png(16, 16, [255, 0, 0, 255]);
    let payload = payload::normalize_text("logo overlay survives scanning").unwrap();
    let out = pipeline::encode(
        &payload,
        &options(EcLevel::H, ModuleShape::Square),
        VersionPolicy::Fit,
        Some((&logo, 15)),
        40,
    )
    .unwrap();
    // Level H tolerates the obscured center; the symbol still decodes.
    assert_eq!(decode_png(&out.png), "logo overlay survives scanning");
}
