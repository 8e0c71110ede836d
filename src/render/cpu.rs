use std::{collections::HashMap, io::Cursor, sync::Arc};

use vello_cpu::kurbo::Shape as _;

use crate::{
    foundation::{
        core::{Canvas, Rect, Rgba8},
        error::{OgError, OgResult},
    },
    layout::node::{LayoutNode, Length, ObjectFit, Style, StyleProp},
    render::{
        OutputFormat, Rasterizer,
        decode::{PreparedImage, decode_image_source, unpremultiply_rgba8_in_place},
        flex::{Placed, PlacedKind, compute_layout},
        fonts::{FontRegistry, TextSpec},
    },
};

/// Software rasterizer: taffy for flexbox, parley for text, vello_cpu for painting.
pub struct CpuRasterizer {
    fonts: FontRegistry,
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl std::fmt::Debug for CpuRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRasterizer")
            .field("fonts", &self.fonts)
            .field("cached_fonts", &self.font_cache.len())
            .finish()
    }
}

impl CpuRasterizer {
    pub fn new(fonts: FontRegistry) -> Self {
        Self {
            fonts,
            font_cache: HashMap::new(),
        }
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Paint `root` and return straight (non-premultiplied) RGBA8 rows.
    pub fn render_rgba8(&mut self, root: &LayoutNode, canvas: Canvas) -> OgResult<Vec<u8>> {
        validate_tree(root, canvas)?;

        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| OgError::render("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| OgError::render("canvas height exceeds u16"))?;

        let placed = compute_layout(root, canvas, &mut self.fonts)?;

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        for p in &placed {
            self.draw(&mut ctx, p)?;
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);

        let mut rgba = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut rgba);
        Ok(rgba)
    }

    fn draw(&mut self, ctx: &mut vello_cpu::RenderContext, p: &Placed<'_>) -> OgResult<()> {
        if p.rect.width() <= 0.0 || p.rect.height() <= 0.0 {
            return Ok(());
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let radius = border_radius(p.style, p.rect);
        if let Some(bg) = background(p.style)
            && bg.a > 0
        {
            ctx.set_paint(color_to_cpu(bg));
            ctx.fill_path(&box_path(p.rect, radius));
        }

        match &p.kind {
            PlacedKind::Container => Ok(()),
            PlacedKind::Text { content, spec } => {
                self.draw_text(ctx, p.rect, content, spec);
                Ok(())
            }
            PlacedKind::Image { source, fit } => {
                let img = decode_image_source(
                    source,
                    p.rect.width().ceil() as u32,
                    p.rect.height().ceil() as u32,
                )
                .map_err(|e| OgError::render(format!("image node: {e}")))?;
                draw_image(ctx, &img, p.rect, *fit, radius)
            }
        }
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        rect: Rect,
        content: &str,
        spec: &TextSpec,
    ) {
        let shaped = self.fonts.shape(content, spec, Some(rect.width() as f32));
        if shaped.is_truncated() {
            tracing::debug!(
                lines = shaped.line_count(),
                kept_chars = shaped.text.chars().count(),
                "text clamped"
            );
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((rect.x0, rect.y0)));

        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let run_font = run.run().font();
                let font =
                    self.font_data(run_font.data.id(), run_font.index, run_font.data.as_ref());

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    fn font_data(
        &mut self,
        blob_id: u64,
        index: u32,
        bytes: &[u8],
    ) -> vello_cpu::peniko::FontData {
        self.font_cache
            .entry((blob_id, index))
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.to_vec()),
                    index,
                )
            })
            .clone()
    }
}

impl Rasterizer for CpuRasterizer {
    #[tracing::instrument(level = "debug", skip_all, fields(w = canvas.width, h = canvas.height))]
    fn render(
        &mut self,
        root: &LayoutNode,
        canvas: Canvas,
        format: OutputFormat,
    ) -> OgResult<Vec<u8>> {
        let rgba = self.render_rgba8(root, canvas)?;
        match format {
            OutputFormat::Png => encode_png(rgba, canvas),
        }
    }
}

/// Reject trees a rasterizer cannot paint faithfully.
///
/// The root must be a container sized to exactly the canvas, every property must be in range, and
/// every image source must be a self-contained `data:` URI.
pub fn validate_tree(root: &LayoutNode, canvas: Canvas) -> OgResult<()> {
    if !matches!(root, LayoutNode::Container { .. }) {
        return Err(OgError::render("layout root must be a container"));
    }
    let style = root.style();
    if style.width() != Some(Length::Px(canvas.width as f32))
        || style.height() != Some(Length::Px(canvas.height as f32))
    {
        return Err(OgError::render(format!(
            "layout root must be sized {}x{} px",
            canvas.width, canvas.height
        )));
    }

    let mut problem = None;
    root.walk(&mut |node, _depth| {
        if problem.is_some() {
            return;
        }
        if let Some(bad) = node.style().props().iter().find(|p| !p.is_valid()) {
            problem = Some(format!("invalid style property {bad:?}"));
        } else if let LayoutNode::Image { source, .. } = node
            && !source.starts_with("data:")
        {
            problem = Some("image source must be a data: uri".to_owned());
        }
    });
    match problem {
        Some(msg) => Err(OgError::render(msg)),
        None => Ok(()),
    }
}

fn encode_png(rgba: Vec<u8>, canvas: Canvas) -> OgResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(canvas.width, canvas.height, rgba)
        .ok_or_else(|| OgError::render("pixel buffer does not match canvas size"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| OgError::render(format!("encode png: {e}")))?;
    Ok(buf)
}

fn background(style: &Style) -> Option<Rgba8> {
    style.props().iter().rev().find_map(|p| match p {
        StyleProp::BackgroundColor(c) => Some(*c),
        _ => None,
    })
}

fn border_radius(style: &Style, rect: Rect) -> f64 {
    let short = rect.width().min(rect.height());
    let r = style.props().iter().rev().find_map(|p| match p {
        StyleProp::BorderRadius(Length::Px(v)) => Some(f64::from(*v)),
        StyleProp::BorderRadius(Length::Percent(v)) => Some(f64::from(*v) / 100.0 * short),
        _ => None,
    });
    r.unwrap_or(0.0).clamp(0.0, short / 2.0)
}

fn box_path(rect: Rect, radius: f64) -> vello_cpu::kurbo::BezPath {
    let r = vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1);
    if radius > 0.0 {
        vello_cpu::kurbo::RoundedRect::from_rect(r, radius).to_path(0.1)
    } else {
        r.to_path(0.1)
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

/// Placement of an `iw` x `ih` image inside `rect` as `(scale_x, scale_y, offset_x, offset_y)`.
pub(crate) fn fit_transform(iw: f64, ih: f64, rect: Rect, fit: ObjectFit) -> (f64, f64, f64, f64) {
    let (rw, rh) = (rect.width(), rect.height());
    let (sx, sy) = match fit {
        ObjectFit::Fill => (rw / iw, rh / ih),
        ObjectFit::Cover => {
            let s = (rw / iw).max(rh / ih);
            (s, s)
        }
        ObjectFit::Contain => {
            let s = (rw / iw).min(rh / ih);
            (s, s)
        }
    };
    let ox = rect.x0 + (rw - iw * sx) / 2.0;
    let oy = rect.y0 + (rh - ih * sy) / 2.0;
    (sx, sy, ox, oy)
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    img: &PreparedImage,
    rect: Rect,
    fit: ObjectFit,
    radius: f64,
) -> OgResult<()> {
    if img.width == 0 || img.height == 0 {
        return Ok(());
    }
    let pixmap = premul_bytes_to_pixmap(&img.rgba8_premul, img.width, img.height)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    let (iw, ih) = (f64::from(img.width), f64::from(img.height));
    let (sx, sy, ox, oy) = fit_transform(iw, ih, rect, fit);

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(
        vello_cpu::kurbo::Affine::translate((ox, oy))
            * vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy),
    );
    ctx.set_paint(paint);
    let target = if fit == ObjectFit::Contain {
        Rect::new(ox, oy, ox + iw * sx, oy + ih * sy).intersect(rect)
    } else {
        rect
    };
    let radius = radius.min(target.width().min(target.height()) / 2.0);
    ctx.fill_path(&box_path(target, radius));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    Ok(())
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> OgResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| OgError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| OgError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(OgError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
