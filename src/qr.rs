use std::io::Cursor;

use image::imageops::FilterType;
use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode, Version};

use crate::error::PipelineError;
use crate::payload::decode_base64_content;

/// How each dark module is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleShape {
    Square,
    Circle,
    Rounded,
    GappedSquare,
}

impl ModuleShape {
    pub fn parse(style: &str) -> ModuleShape {
        match style.to_lowercase().as_str() {
            "circle" | "dots" => ModuleShape::Circle,
            "rounded" => ModuleShape::Rounded,
            "gapped" | "gapped_square" => ModuleShape::GappedSquare,
            _ => ModuleShape::Square,
        }
    }
}

/// Symbol version selection: smallest version that fits, or pin to the
/// maximum allowed version for the densest possible symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    Fit,
    Max,
}

impl VersionPolicy {
    pub fn parse(policy: &str) -> VersionPolicy {
        match policy.to_lowercase().as_str() {
            "max" | "pinned" => VersionPolicy::Max,
            _ => VersionPolicy::Fit,
        }
    }
}

pub struct QrOptions {
    /// Pixels per module.
    pub box_size: u32,
    /// Quiet-zone width in modules.
    pub border: u32,
    pub fg_color: [u8; 4],
    pub bg_color: [u8; 4],
    pub error_correction: EcLevel,
    pub shape: ModuleShape,
}

pub fn parse_hex_color(hex: &str) -> Result<[u8; 4], String> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return Err(format!("Invalid hex color: #{}", hex));
    }

    let r = u8::from_str_radix(&hex[0..2], 16).map_err(|e| e.to_string())?;
    let g = u8::from_str_radix(&hex[2..4], 16).map_err(|e| e.to_string())?;
    let b = u8::from_str_radix(&hex[4..6], 16).map_err(|e| e.to_string())?;
    let a = if hex.len() == 8 {
        u8::from_str_radix(&hex[6..8], 16).map_err(|e| e.to_string())?
    } else {
        255
    };

    Ok([r, g, b, a])
}

pub fn parse_ec_level(level: &str) -> EcLevel {
    match level.to_uppercase().as_str() {
        "L" => EcLevel::L,
        "M" => EcLevel::M,
        "Q" => EcLevel::Q,
        "H" => EcLevel::H,
        _ => EcLevel::M,
    }
}

/// Decode a logo field that may be a raw base64 string or a full data URI.
pub fn decode_logo_base64(logo: &str) -> Result<Vec<u8>, PipelineError> {
    decode_base64_content(logo, "logo")
}

/// Build the symbol. The capacity gate has already run, so a residual
/// library rejection here means something other than raw capacity
/// (e.g. an unsupported character set) and is surfaced verbatim.
pub fn encode_symbol(
    data: &[u8],
    level: EcLevel,
    policy: VersionPolicy,
    max_version: u8,
) -> Result<QrCode, PipelineError> {
    let result = match policy {
        VersionPolicy::Fit => QrCode::with_error_correction_level(data, level),
        VersionPolicy::Max => {
            QrCode::with_version(data, Version::Normal(max_version.clamp(1, 40) as i16), level)
        }
    };
    result.map_err(|e: QrError| PipelineError::Encoding(e.to_string()))
}

/// Version actually chosen by the encoder.
pub fn symbol_version(code: &QrCode) -> i16 {
    match code.version() {
        Version::Normal(v) => v,
        Version::Micro(v) => v,
    }
}

fn is_finder_module(x: u32, y: u32, module_count: u32) -> bool {
    let in_tl = x < 7 && y < 7;
    let in_tr = x + 7 >= module_count && y < 7;
    let in_bl = x < 7 && y + 7 >= module_count;
    in_tl || in_tr || in_bl
}

fn fill_square(img: &mut RgbaImage, x0: u32, y0: u32, side: u32, color: Rgba<u8>) {
    for y in y0..(y0 + side) {
        for x in x0..(x0 + side) {
            img.put_pixel(x, y, color);
        }
    }
}

fn fill_circle(img: &mut RgbaImage, x0: u32, y0: u32, side: u32, color: Rgba<u8>) {
    // Half-pixel center keeps small circles symmetric.
    let r = side as f32 / 2.0;
    let c = r - 0.5;
    let thr = r * r;
    for dy in 0..side {
        for dx in 0..side {
            let dxf = dx as f32 - c;
            let dyf = dy as f32 - c;
            if dxf * dxf + dyf * dyf <= thr {
                img.put_pixel(x0 + dx, y0 + dy, color);
            }
        }
    }
}

fn fill_rounded(img: &mut RgbaImage, x0: u32, y0: u32, side: u32, color: Rgba<u8>) {
    let r = (side / 3).max(1) as i32;
    let s = side as i32;
    for yy in 0..s {
        for xx in 0..s {
            let inside = if xx < r && yy < r {
                let (dx, dy) = (xx - (r - 1), yy - (r - 1));
                dx * dx + dy * dy <= r * r
            } else if xx >= s - r && yy < r {
                let (dx, dy) = (xx - (s - r), yy - (r - 1));
                dx * dx + dy * dy <= r * r
            } else if xx < r && yy >= s - r {
                let (dx, dy) = (xx - (r - 1), yy - (s - r));
                dx * dx + dy * dy <= r * r
            } else if xx >= s - r && yy >= s - r {
                let (dx, dy) = (xx - (s - r), yy - (s - r));
                dx * dx + dy * dy <= r * r
            } else {
                true
            };
            if inside {
                img.put_pixel(x0 + xx as u32, y0 + yy as u32, color);
            }
        }
    }
}

fn fill_gapped_square(img: &mut RgbaImage, x0: u32, y0: u32, side: u32, color: Rgba<u8>) {
    // Inset each edge by ~10% so adjacent modules stay visually separated.
    let inset = (side / 10).max(1);
    if side <= inset * 2 {
        return fill_square(img, x0, y0, side, color);
    }
    for y in (y0 + inset)..(y0 + side - inset) {
        for x in (x0 + inset)..(x0 + side - inset) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Rasterize the symbol. Finder patterns are always drawn as solid squares
/// so shape styling never degrades the locator eyes.
pub fn render_image(code: &QrCode, options: &QrOptions) -> RgbaImage {
    let module_count = code.width() as u32;
    let box_size = options.box_size.max(1);
    let total_modules = module_count + options.border * 2;
    let size_px = total_modules * box_size;

    let fg = Rgba(options.fg_color);
    let bg = Rgba(options.bg_color);

    let mut img: RgbaImage = ImageBuffer::from_pixel(size_px, size_px, bg);

    for y in 0..module_count {
        for x in 0..module_count {
            if code[(x as usize, y as usize)] != qrcode::Color::Dark {
                continue;
            }
            let px = (x + options.border) * box_size;
            let py = (y + options.border) * box_size;
            if is_finder_module(x, y, module_count) {
                fill_square(&mut img, px, py, box_size, fg);
                continue;
            }
            match options.shape {
                ModuleShape::Square => fill_square(&mut img, px, py, box_size, fg),
                ModuleShape::Circle => fill_circle(&mut img, px, py, box_size, fg),
                ModuleShape::Rounded => fill_rounded(&mut img, px, py, box_size, fg),
                ModuleShape::GappedSquare => fill_gapped_square(&mut img, px, py, box_size, fg),
            }
        }
    }

    img
}

/// Composite logo bytes onto the center of the rendered symbol, scaled to
/// `ratio_percent` of the smaller image edge over a background-colored
/// backing square. In-memory end to end; no scratch file.
pub fn overlay_logo(
    img: &mut RgbaImage,
    logo_bytes: &[u8],
    ratio_percent: u8,
    bg_color: [u8; 4],
) -> Result<(), PipelineError> {
    let logo = image::load_from_memory(logo_bytes)?;
    let target = (img.width().min(img.height()) * ratio_percent as u32 / 100).max(1);
    let logo = logo.resize(target, target, FilterType::Lanczos3).to_rgba8();

    let pad = (target / 10).max(2);
    let backing = logo.width().max(logo.height()) + pad * 2;
    let bx = (img.width().saturating_sub(backing)) / 2;
    let by = (img.height().saturating_sub(backing)) / 2;
    fill_square(img, bx, by, backing.min(img.width()), Rgba(bg_color));

    let lx = (img.width().saturating_sub(logo.width())) / 2;
    let ly = (img.height().saturating_sub(logo.height())) / 2;
    imageops::overlay(img, &logo, lx as i64, ly as i64);
    Ok(())
}

/// Serialize the raster to PNG, the fixed lossless download format.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}
