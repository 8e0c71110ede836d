use std::{io::Cursor, sync::Arc};

use anyhow::Context;
use base64::Engine as _;

use crate::foundation::error::{OgError, OgResult};

pub const SVG_MIME: &str = "image/svg+xml";

const DATA_URI_PREFIX: &str = "data:";

// Keeps a hostile SVG from asking for a multi-gigabyte pixmap.
const MAX_SVG_DIM: u32 = 4096;

/// Largest raster edge the CPU pixmap can hold.
pub const MAX_RASTER_DIM: u32 = u16::MAX as u32;

/// Decoded rasters above this many pixels are refused before allocation.
pub const MAX_RASTER_PIXELS: u64 = 16 * 1024 * 1024;

/// Raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Parsed SVG document.
#[derive(Clone, Debug)]
pub struct PreparedSvg {
    pub tree: Arc<usvg::Tree>,
}

/// Payload of a `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    /// Media type without parameters, lowercased. Empty metadata yields `text/plain`.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decode an RFC 2397 `data:` URI.
pub fn parse_data_uri(uri: &str) -> OgResult<DataUri> {
    let rest = uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| OgError::render("image source is not a data: uri"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| OgError::render("data uri is missing ','"))?;

    let mut parts = meta.split(';');
    let mime = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let is_base64 = parts.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        let cleaned: Vec<u8> = payload
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| OgError::render(format!("data uri has invalid base64: {e}")))?
    } else {
        percent_decode(payload)?
    };

    Ok(DataUri {
        mime_type: if mime.is_empty() {
            "text/plain".to_owned()
        } else {
            mime
        },
        bytes,
    })
}

fn percent_decode(input: &str) -> OgResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| OgError::render("data uri has invalid percent-escape"))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Read a raster's dimensions from its header and check them against the pixmap limits.
pub fn raster_dimensions(bytes: &[u8]) -> OgResult<(u32, u32)> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")?
        .into_dimensions()
        .context("read image dimensions")?;
    if width == 0
        || height == 0
        || width > MAX_RASTER_DIM
        || height > MAX_RASTER_DIM
        || u64::from(width) * u64::from(height) > MAX_RASTER_PIXELS
    {
        return Err(OgError::render(format!(
            "raster size {width}x{height} out of range \
             (max edge {MAX_RASTER_DIM}, max {MAX_RASTER_PIXELS} pixels)"
        )));
    }
    Ok((width, height))
}

/// Decode PNG/JPEG/GIF/WebP bytes and premultiply.
///
/// Rasters outside [`raster_dimensions`] limits are rejected before decoding.
pub fn decode_raster(bytes: &[u8]) -> OgResult<PreparedImage> {
    Ok(prepare_rgba8(decode_rgba8(bytes)?))
}

fn decode_rgba8(bytes: &[u8]) -> OgResult<image::RgbaImage> {
    raster_dimensions(bytes)?;
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

fn prepare_rgba8(rgba: image::RgbaImage) -> PreparedImage {
    let (width, height) = rgba.dimensions();
    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    }
}

/// Shrink `rgba` to the smallest size that still covers `target_w` x `target_h`.
///
/// Never upscales. Aspect ratio is kept.
pub fn downscale_to_cover(
    rgba: image::RgbaImage,
    target_w: u32,
    target_h: u32,
) -> image::RgbaImage {
    let (w, h) = rgba.dimensions();
    let cover = (f64::from(target_w.max(1)) / f64::from(w))
        .max(f64::from(target_h.max(1)) / f64::from(h));
    if cover >= 1.0 {
        return rgba;
    }
    let nw = ((f64::from(w) * cover).ceil() as u32).clamp(1, w);
    let nh = ((f64::from(h) * cover).ceil() as u32).clamp(1, h);
    image::imageops::resize(&rgba, nw, nh, image::imageops::FilterType::Triangle)
}

pub fn parse_svg(bytes: &[u8]) -> OgResult<PreparedSvg> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(PreparedSvg {
        tree: Arc::new(tree),
    })
}

/// Rasterize `tree` stretched to exactly `width` x `height`.
pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> OgResult<Vec<u8>> {
    if width == 0 || height == 0 || width > MAX_SVG_DIM || height > MAX_SVG_DIM {
        return Err(OgError::render(format!(
            "svg raster size {width}x{height} out of range (max {MAX_SVG_DIM})"
        )));
    }
    let size = tree.size();
    if !(size.width().is_finite() && size.height().is_finite())
        || size.width() <= 0.0
        || size.height() <= 0.0
    {
        return Err(OgError::render("svg has invalid width/height"));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| OgError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

/// Decode an image-node source into pixels.
///
/// SVG sources are rasterized at `target_w` x `target_h` so they stay sharp at their drawn size.
/// Raster sources larger than the target are downscaled to cover it.
pub fn decode_image_source(source: &str, target_w: u32, target_h: u32) -> OgResult<PreparedImage> {
    let data = parse_data_uri(source)?;
    if data.mime_type == SVG_MIME {
        let svg = parse_svg(&data.bytes)?;
        let (w, h) = (target_w.max(1), target_h.max(1));
        let rgba8_premul = rasterize_svg_to_premul_rgba8(&svg.tree, w, h)?;
        return Ok(PreparedImage {
            width: w,
            height: h,
            rgba8_premul: Arc::new(rgba8_premul),
        });
    }
    let rgba = decode_rgba8(&data.bytes)?;
    Ok(prepare_rgba8(downscale_to_cover(rgba, target_w, target_h)))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/decode.rs"]
mod tests;
