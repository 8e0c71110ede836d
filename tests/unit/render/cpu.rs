use super::*;
use crate::layout::node::{percent, px};

fn canvas() -> Canvas {
    Canvas::new(64, 32).unwrap()
}

fn root(children: Vec<LayoutNode>) -> LayoutNode {
    LayoutNode::container(
        Style::new()
            .with(StyleProp::Width(px(64.0)))
            .with(StyleProp::Height(px(32.0)))
            .with(StyleProp::BackgroundColor(Rgba8::rgb(10, 20, 30))),
        children,
    )
}

fn pixel(rgba: &[u8], w: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * w + x) * 4) as usize;
    [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
}

fn svg_uri(fill: &str) -> String {
    use base64::Engine as _;
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8" fill="{fill}"/></svg>"#
    );
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(svg)
    )
}

#[test]
fn background_fills_canvas() {
    let mut r = CpuRasterizer::new(FontRegistry::new());
    let rgba = r.render_rgba8(&root(vec![]), canvas()).unwrap();
    assert_eq!(rgba.len(), 64 * 32 * 4);
    assert_eq!(pixel(&rgba, 64, 0, 0), [10, 20, 30, 255]);
    assert_eq!(pixel(&rgba, 64, 63, 31), [10, 20, 30, 255]);
}

#[test]
fn circular_image_leaves_corners_untouched() {
    let mut r = CpuRasterizer::new(FontRegistry::new());
    let tree = root(vec![LayoutNode::image(
        svg_uri("#ff0000"),
        Style::new()
            .with(StyleProp::Width(px(32.0)))
            .with(StyleProp::Height(px(32.0)))
            .with(StyleProp::BorderRadius(percent(50.0)))
            .with(StyleProp::ObjectFit(ObjectFit::Cover)),
    )]);
    let rgba = r.render_rgba8(&tree, canvas()).unwrap();
    assert_eq!(pixel(&rgba, 64, 16, 16), [255, 0, 0, 255]);
    assert_eq!(pixel(&rgba, 64, 0, 0), [10, 20, 30, 255]);
    assert_eq!(pixel(&rgba, 64, 48, 16), [10, 20, 30, 255]);
}

#[test]
fn png_output_has_canvas_dimensions() {
    let mut r = CpuRasterizer::new(FontRegistry::new());
    let png = r
        .render(&root(vec![]), canvas(), OutputFormat::Png)
        .unwrap();
    assert!(png.starts_with(b"\x89PNG"));
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 32));
}

#[test]
fn root_must_match_canvas() {
    let mut r = CpuRasterizer::new(FontRegistry::new());
    let err = r
        .render(&root(vec![]), Canvas::new(65, 32).unwrap(), OutputFormat::Png)
        .unwrap_err();
    assert!(matches!(err, OgError::Render(_)));
}

#[test]
fn invalid_trees_are_rejected() {
    let text_root = LayoutNode::text("x", Style::new());
    assert!(validate_tree(&text_root, canvas()).is_err());

    let remote = root(vec![LayoutNode::image(
        "https://example.com/a.png",
        Style::new(),
    )]);
    assert!(validate_tree(&remote, canvas()).is_err());

    let bad_prop = root(vec![LayoutNode::text(
        "x",
        Style::new().with(StyleProp::FontSize(-1.0)),
    )]);
    assert!(validate_tree(&bad_prop, canvas()).is_err());

    assert!(validate_tree(&root(vec![]), canvas()).is_ok());
}

#[test]
fn corrupt_image_source_is_a_render_error() {
    let mut r = CpuRasterizer::new(FontRegistry::new());
    let tree = root(vec![LayoutNode::image(
        "data:image/png;base64,AAAA",
        Style::new()
            .with(StyleProp::Width(px(8.0)))
            .with(StyleProp::Height(px(8.0))),
    )]);
    let err = r.render(&tree, canvas(), OutputFormat::Png).unwrap_err();
    assert!(matches!(err, OgError::Render(_)));
}

#[test]
fn fit_modes_scale_and_center() {
    let rect = Rect::new(0.0, 0.0, 200.0, 100.0);
    assert_eq!(
        fit_transform(50.0, 50.0, rect, ObjectFit::Cover),
        (4.0, 4.0, 0.0, -50.0)
    );
    assert_eq!(
        fit_transform(50.0, 50.0, rect, ObjectFit::Contain),
        (2.0, 2.0, 50.0, 0.0)
    );
    assert_eq!(
        fit_transform(50.0, 50.0, rect, ObjectFit::Fill),
        (4.0, 2.0, 0.0, 0.0)
    );
}

#[test]
fn radius_percent_is_relative_to_short_side() {
    let rect = Rect::new(0.0, 0.0, 260.0, 100.0);
    let style = Style::new().with(StyleProp::BorderRadius(percent(50.0)));
    assert_eq!(border_radius(&style, rect), 50.0);
    let big = Style::new().with(StyleProp::BorderRadius(px(500.0)));
    assert_eq!(border_radius(&big, rect), 50.0);
}
