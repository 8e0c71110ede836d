use super::*;
use crate::foundation::core::Rgba8;
use crate::layout::node::{TextAlign, percent, px};

fn sized(w: f32, h: f32) -> Style {
    Style::new()
        .with(StyleProp::Width(px(w)))
        .with(StyleProp::Height(px(h)))
}

fn canvas() -> Canvas {
    Canvas::new(400, 200).unwrap()
}

#[test]
fn row_space_between_places_children_at_edges() {
    let root = LayoutNode::container(
        sized(400.0, 200.0)
            .with(StyleProp::JustifyContent(JustifyContent::SpaceBetween))
            .with(StyleProp::Padding(10.0)),
        vec![
            LayoutNode::image("data:,", sized(50.0, 50.0)),
            LayoutNode::image("data:,", sized(60.0, 40.0)),
        ],
    );
    let placed = compute_layout(&root, canvas(), &mut FontRegistry::new()).unwrap();
    assert_eq!(placed.len(), 3);
    assert_eq!(placed[0].rect, Rect::new(0.0, 0.0, 400.0, 200.0));
    assert_eq!(placed[1].rect, Rect::new(10.0, 10.0, 60.0, 60.0));
    assert_eq!(placed[2].rect, Rect::new(330.0, 10.0, 390.0, 50.0));
}

#[test]
fn nested_positions_are_absolute() {
    let root = LayoutNode::container(
        sized(400.0, 200.0)
            .with(StyleProp::FlexDirection(FlexDirection::Column))
            .with(StyleProp::Padding(20.0))
            .with(StyleProp::Gap(5.0)),
        vec![
            LayoutNode::container(sized(100.0, 30.0), vec![]),
            LayoutNode::container(
                sized(100.0, 50.0)
                    .with(StyleProp::AlignItems(AlignItems::Center))
                    .with(StyleProp::JustifyContent(JustifyContent::Center)),
                vec![LayoutNode::image("data:,", sized(10.0, 10.0))],
            ),
        ],
    );
    let placed = compute_layout(&root, canvas(), &mut FontRegistry::new()).unwrap();
    let img = placed.last().unwrap();
    assert!(matches!(img.kind, PlacedKind::Image { .. }));
    assert_eq!(img.rect, Rect::new(65.0, 75.0, 75.0, 85.0));
}

#[test]
fn display_none_subtrees_are_not_placed() {
    let root = LayoutNode::container(
        sized(400.0, 200.0),
        vec![LayoutNode::container(
            Style::new().with(StyleProp::Display(Display::None)),
            vec![LayoutNode::image("data:,", sized(10.0, 10.0))],
        )],
    );
    let placed = compute_layout(&root, canvas(), &mut FontRegistry::new()).unwrap();
    assert_eq!(placed.len(), 1);
}

#[test]
fn percent_lengths_resolve_against_parent() {
    let root = LayoutNode::container(
        sized(400.0, 200.0),
        vec![LayoutNode::container(
            Style::new()
                .with(StyleProp::Width(percent(50.0)))
                .with(StyleProp::Height(percent(25.0))),
            vec![],
        )],
    );
    let placed = compute_layout(&root, canvas(), &mut FontRegistry::new()).unwrap();
    assert_eq!(placed[1].rect.width(), 200.0);
    assert_eq!(placed[1].rect.height(), 50.0);
}

#[test]
fn text_spec_inherits_but_clamp_does_not() {
    let parent = inherit_text_spec(
        &TextSpec::default(),
        &Style::new()
            .with(StyleProp::Color(Rgba8::rgb(1, 2, 3)))
            .with(StyleProp::FontSize(30.0))
            .with(StyleProp::LineClamp(2))
            .with(StyleProp::TextOverflow(TextOverflow::Ellipsis)),
    );
    assert_eq!(parent.max_lines, Some(2));
    assert!(parent.ellipsis);

    let child = inherit_text_spec(
        &parent,
        &Style::new().with(StyleProp::TextAlign(TextAlign::End)),
    );
    assert_eq!(child.color, Rgba8::rgb(1, 2, 3));
    assert_eq!(child.size_px, 30.0);
    assert_eq!(child.align, TextAlign::End);
    assert_eq!(child.max_lines, None);
    assert!(!child.ellipsis);
}

#[test]
fn paint_only_props_do_not_change_flex_style() {
    let plain = taffy_style(&Style::new());
    let painted = taffy_style(
        &Style::new()
            .with(StyleProp::BackgroundColor(Rgba8::rgb(0, 0, 0)))
            .with(StyleProp::BorderRadius(px(4.0))),
    );
    assert_eq!(plain, painted);
}

#[test]
fn text_leaf_without_fonts_still_lays_out() {
    let root = LayoutNode::container(
        sized(400.0, 200.0),
        vec![LayoutNode::text("hello", Style::new())],
    );
    let placed = compute_layout(&root, canvas(), &mut FontRegistry::new()).unwrap();
    assert_eq!(placed.len(), 2);
    assert!(matches!(
        placed[1].kind,
        PlacedKind::Text {
            content: "hello",
            ..
        }
    ));
}
