use std::{borrow::Cow, collections::HashSet, path::Path};

use anyhow::Context;

use crate::{
    config::FontConfig,
    foundation::{
        core::Rgba8,
        error::{OgError, OgResult},
    },
    layout::node::{OverflowWrap, TextAlign},
};

const ELLIPSIS: char = '\u{2026}';

/// RGBA8 brush carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Resolved text styling for one text node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextSpec {
    pub(crate) family: Option<String>,
    pub(crate) size_px: f32,
    pub(crate) weight: u16,
    /// Multiple of `size_px`.
    pub(crate) line_height: f32,
    pub(crate) color: Rgba8,
    pub(crate) align: TextAlign,
    pub(crate) overflow_wrap: OverflowWrap,
    pub(crate) max_lines: Option<u32>,
    pub(crate) ellipsis: bool,
}

impl Default for TextSpec {
    fn default() -> Self {
        Self {
            family: None,
            size_px: 16.0,
            weight: 400,
            line_height: 1.2,
            color: Rgba8::rgb(0, 0, 0),
            align: TextAlign::Start,
            overflow_wrap: OverflowWrap::Normal,
            max_lines: None,
            ellipsis: false,
        }
    }
}

/// Shaped text plus the (possibly truncated) string it was shaped from.
pub(crate) struct ShapedText {
    pub(crate) text: String,
    pub(crate) layout: parley::Layout<TextBrushRgba8>,
    truncated: bool,
}

impl ShapedText {
    /// Widest line, trailing whitespace excluded.
    pub(crate) fn width(&self) -> f32 {
        self.layout.width()
    }

    pub(crate) fn height(&self) -> f32 {
        self.layout.height()
    }

    pub(crate) fn line_count(&self) -> usize {
        self.layout.len()
    }

    pub(crate) fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Fonts available to the rasterizer, loaded once and shared by every render.
///
/// Families named by text styles are resolved against the registered faces; anything that does
/// not match falls back to the first family registered.
pub struct FontRegistry {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: Vec<String>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("families", &self.families)
            .finish_non_exhaustive()
    }
}

impl FontRegistry {
    /// An empty registry. Text will not render until fonts are registered.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: Vec::new(),
        }
    }

    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(files = config.files.len(), system = config.system_fonts)
    )]
    pub fn from_config(config: &FontConfig) -> OgResult<Self> {
        let mut reg = Self::new();
        for path in &config.files {
            reg.register_file(path)?;
        }
        if config.system_fonts {
            let n = reg.register_system_fonts();
            tracing::info!(faces = n, "loaded system fonts");
        }
        if reg.families.is_empty() {
            tracing::warn!("no fonts registered, text will not be drawn");
        }
        Ok(reg)
    }

    /// Register every face in a TTF/OTF/TTC blob. Returns the family names it added.
    pub fn register_bytes(&mut self, bytes: Vec<u8>) -> OgResult<Vec<String>> {
        let registered = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        if registered.is_empty() {
            return Err(OgError::validation("no font families registered from font bytes"));
        }

        let mut added = Vec::new();
        for (family_id, _) in registered {
            let Some(name) = self.font_ctx.collection.family_name(family_id) else {
                continue;
            };
            let name = name.to_string();
            if !self.families.contains(&name) {
                self.families.push(name.clone());
                added.push(name);
            }
        }
        Ok(added)
    }

    pub fn register_file(&mut self, path: impl AsRef<Path>) -> OgResult<Vec<String>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        let added = self.register_bytes(bytes)?;
        tracing::debug!(path = %path.display(), families = ?added, "registered font file");
        Ok(added)
    }

    /// Register fonts installed on the host. Returns the number of font sources loaded.
    pub fn register_system_fonts(&mut self) -> usize {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();

        let mut seen = HashSet::new();
        let mut blobs = Vec::new();
        for face in db.faces() {
            let key = match &face.source {
                usvg::fontdb::Source::File(p) | usvg::fontdb::Source::SharedFile(p, _) => {
                    p.clone()
                }
                usvg::fontdb::Source::Binary(_) => continue,
            };
            if !seen.insert(key) {
                continue;
            }
            if let Some(bytes) = db.with_face_data(face.id, |data, _| data.to_vec()) {
                blobs.push(bytes);
            }
        }

        let mut loaded = 0;
        for bytes in blobs {
            if self.register_bytes(bytes).is_ok() {
                loaded += 1;
            }
        }
        loaded
    }

    pub fn families(&self) -> &[String] {
        &self.families
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    fn font_stack(&self, requested: Option<&str>) -> String {
        let mut names: Vec<&str> = Vec::new();
        if let Some(r) = requested.map(str::trim).filter(|r| !r.is_empty()) {
            names.push(r);
        }
        if let Some(first) = self.families.first()
            && !names.contains(&first.as_str())
        {
            names.push(first);
        }
        let mut stack: Vec<String> = names
            .iter()
            .map(|n| format!("\"{}\"", n.replace('"', "")))
            .collect();
        stack.push("sans-serif".to_owned());
        stack.join(", ")
    }

    fn build(
        &mut self,
        text: &str,
        spec: &TextSpec,
        max_width_px: Option<f32>,
    ) -> parley::Layout<TextBrushRgba8> {
        if self.families.is_empty() {
            return parley::Layout::new();
        }
        let stack = self.font_stack(spec.family.as_deref());

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(spec.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(spec.weight)),
        ));
        builder.push_default(parley::style::StyleProperty::LineHeight(
            parley::style::LineHeight::FontSizeRelative(spec.line_height),
        ));
        builder.push_default(parley::style::StyleProperty::OverflowWrap(
            match spec.overflow_wrap {
                OverflowWrap::Normal => parley::style::OverflowWrap::Normal,
                OverflowWrap::BreakWord => parley::style::OverflowWrap::BreakWord,
                OverflowWrap::Anywhere => parley::style::OverflowWrap::Anywhere,
            },
        ));
        builder.push_default(parley::style::StyleProperty::Brush(spec.color.into()));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        let alignment = match spec.align {
            TextAlign::Start => parley::Alignment::Start,
            TextAlign::Center => parley::Alignment::Center,
            TextAlign::End => parley::Alignment::End,
        };
        layout.align(max_width_px, alignment, parley::AlignmentOptions::default());
        layout
    }

    /// Shape `text`, wrapping at `max_width_px` and honoring the line clamp in `spec`.
    ///
    /// When the text needs more than `max_lines` lines it is cut at the end of the last allowed
    /// line; with `ellipsis` set, characters are then dropped until the text plus "…" fits.
    pub(crate) fn shape(
        &mut self,
        text: &str,
        spec: &TextSpec,
        max_width_px: Option<f32>,
    ) -> ShapedText {
        let layout = self.build(text, spec, max_width_px);
        let Some(max_lines) = spec.max_lines.map(|n| n.max(1) as usize) else {
            return ShapedText {
                text: text.to_owned(),
                layout,
                truncated: false,
            };
        };
        if layout.len() <= max_lines {
            return ShapedText {
                text: text.to_owned(),
                layout,
                truncated: false,
            };
        }

        let cut = layout
            .get(max_lines - 1)
            .map(|line| line.text_range().end)
            .unwrap_or(text.len());
        let mut kept = text[..cut].trim_end().to_owned();

        if !spec.ellipsis {
            let layout = self.build(&kept, spec, max_width_px);
            return ShapedText {
                text: kept,
                layout,
                truncated: true,
            };
        }

        loop {
            let candidate = format!("{kept}{ELLIPSIS}");
            let layout = self.build(&candidate, spec, max_width_px);
            if layout.len() <= max_lines || kept.is_empty() {
                return ShapedText {
                    text: candidate,
                    layout,
                    truncated: true,
                };
            }
            kept.pop();
            let trimmed = kept.trim_end().len();
            kept.truncate(trimmed);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fonts.rs"]
mod tests;
