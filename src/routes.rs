use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::LazyLock;
use std::time::Instant;

use crate::capacity::{self, Verdict};
use crate::error::PipelineError;
use crate::models::*;
use crate::payload::{self, EncodedPayload};
use crate::pipeline::{self, Limits};
use crate::qr;

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

// Logos are thumbnails; cap them well below the general upload ceiling.
const LOGO_LIMIT_BYTES: usize = 512 * 1024;

type ApiResult<T> = Result<Json<T>, (Status, Json<ApiError>)>;

fn api_error(err: PipelineError) -> (Status, Json<ApiError>) {
    let (status, code) = match &err {
        PipelineError::Validation(_) => (Status::BadRequest, "VALIDATION_ERROR"),
        PipelineError::Capacity { .. } => (Status::PayloadTooLarge, "CAPACITY_EXCEEDED"),
        PipelineError::Encoding(_) => (Status::UnprocessableEntity, "ENCODING_FAILED"),
        PipelineError::Image(_) => (Status::BadRequest, "IMAGE_ERROR"),
    };
    (status, Json(ApiError::new(status.code, code, err.to_string())))
}

fn bad_request(code: &str, msg: impl Into<String>) -> (Status, Json<ApiError>) {
    (Status::BadRequest, Json(ApiError::new(400, code, msg)))
}

/// Turn the wire payload into the byte string to encode. Upload ceilings are
/// enforced against the decoded byte count, never the declared one.
fn normalize(input: &PayloadInput, limits: &Limits) -> Result<EncodedPayload, PipelineError> {
    match input {
        PayloadInput::Url { url } => payload::normalize_url(url),
        PayloadInput::Text { text } => payload::normalize_text(text),
        PayloadInput::Image {
            content_base64,
            quality,
            max_dimension,
        } => {
            if *quality > 100 {
                return Err(PipelineError::Validation(
                    "quality must be between 0 and 100".to_string(),
                ));
            }
            let raw = payload::decode_base64_content(content_base64, "image content")?;
            limits.check_upload(raw.len(), "image")?;
            payload::normalize_image(&raw, *max_dimension, *quality)
        }
        PayloadInput::File { content_base64 } => {
            let raw = payload::decode_base64_content(content_base64, "file content")?;
            limits.check_upload(raw.len(), "file")?;
            payload::normalize_file(&raw)
        }
        PayloadInput::Contact(record) => payload::normalize_contact(record),
    }
}

// ============ Health ============

#[get("/health")]
pub fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: START_TIME.elapsed().as_secs(),
    })
}

// ============ Capacity Preflight ============

/// Normalize the payload and run the capacity gate only. Lets a client show
/// the encoded size and verdict before paying for a full encode.
#[post("/qr/preflight", format = "json", data = "<req>")]
pub fn preflight_qr(req: Json<PreflightRequest>, limits: &State<Limits>) -> ApiResult<PreflightResponse> {
    let req = req.into_inner();
    let level = qr::parse_ec_level(&req.error_correction);
    let payload = normalize(&req.payload, limits).map_err(api_error)?;

    let encoded_bytes = payload.encoded_bytes();
    let max_version = limits.max_version.clamp(1, 40);
    let capacity_bytes = capacity::ceiling(level, max_version);

    let (verdict, detail) = match capacity::evaluate(encoded_bytes, level, max_version) {
        Verdict::Proceed => ("proceed", None),
        Verdict::Warn(msg) => ("warn", Some(msg)),
        Verdict::Reject { overage } => (
            "reject",
            Some(format!(
                "{} bytes over capacity. {}",
                overage,
                capacity::remediation_hint(level)
            )),
        ),
    };

    Ok(Json(PreflightResponse {
        kind: payload.kind.as_str().to_string(),
        encoded_bytes,
        encoded_size: payload.size_estimate(),
        capacity_bytes,
        level: capacity::level_name(level).to_string(),
        max_version,
        version_needed: capacity::smallest_fitting_version(encoded_bytes, level, max_version),
        verdict: verdict.to_string(),
        detail,
        warnings: payload.warnings,
    }))
}

// ============ Full Encode ============

#[post("/qr/encode", format = "json", data = "<req>")]
pub fn encode_qr(req: Json<EncodeRequest>, limits: &State<Limits>) -> ApiResult<QrResponse> {
    let req = req.into_inner();

    if !(5..=30).contains(&req.box_size) {
        return Err(bad_request("INVALID_BOX_SIZE", "box_size must be between 5 and 30"));
    }
    if !(1..=10).contains(&req.border) {
        return Err(bad_request("INVALID_BORDER", "border must be between 1 and 10"));
    }
    if req.logo.is_some() && !(5..=40).contains(&req.logo_ratio) {
        return Err(bad_request(
            "INVALID_LOGO_RATIO",
            "logo_ratio must be between 5 and 40 (percentage)",
        ));
    }

    let fg_color = qr::parse_hex_color(&req.fg_color)
        .map_err(|e| bad_request("INVALID_FG_COLOR", e))?;
    let bg_color = qr::parse_hex_color(&req.bg_color)
        .map_err(|e| bad_request("INVALID_BG_COLOR", e))?;

    let logo_bytes = match &req.logo {
        Some(logo) => {
            let bytes = qr::decode_logo_base64(logo).map_err(api_error)?;
            if bytes.len() > LOGO_LIMIT_BYTES {
                return Err(bad_request("LOGO_TOO_LARGE", "Logo image must be under 512KB"));
            }
            Some(bytes)
        }
        None => None,
    };

    let payload = normalize(&req.payload, limits).map_err(api_error)?;

    let options = qr::QrOptions {
        box_size: req.box_size,
        border: req.border,
        fg_color,
        bg_color,
        error_correction: qr::parse_ec_level(&req.error_correction),
        shape: qr::ModuleShape::parse(&req.shape),
    };
    let policy = qr::VersionPolicy::parse(&req.version_policy);

    let outcome = pipeline::encode(
        &payload,
        &options,
        policy,
        logo_bytes.as_deref().map(|b| (b, req.logo_ratio)),
        limits.max_version,
    )
    .map_err(api_error)?;

    Ok(Json(QrResponse {
        image_base64: format!("data:{};base64,{}", outcome.mime, BASE64.encode(&outcome.png)),
        filename: outcome.filename,
        mime: outcome.mime.to_string(),
        version: outcome.version,
        modules: outcome.modules,
        encoded_bytes: outcome.encoded_bytes,
        capacity_bytes: outcome.capacity_bytes,
        encoded_size: outcome.encoded_size,
        warnings: outcome.warnings,
    }))
}
