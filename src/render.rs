use crate::{
    foundation::{core::Canvas, error::OgResult},
    layout::node::LayoutNode,
};

pub(crate) mod cpu;
pub(crate) mod decode;
pub(crate) mod flex;
pub(crate) mod fonts;

/// Encoded image formats a rasterizer can produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    #[default]
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
        }
    }
}

/// Turns a layout tree into encoded image bytes.
///
/// Implementations own text measurement, line clamping and ellipsis; callers hand over the tree
/// exactly as composed. A malformed tree is an error, never a panic.
pub trait Rasterizer {
    fn render(
        &mut self,
        root: &LayoutNode,
        canvas: Canvas,
        format: OutputFormat,
    ) -> OgResult<Vec<u8>>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    fn render(
        &mut self,
        root: &LayoutNode,
        canvas: Canvas,
        format: OutputFormat,
    ) -> OgResult<Vec<u8>> {
        (**self).render(root, canvas, format)
    }
}
