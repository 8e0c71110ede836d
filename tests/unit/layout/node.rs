use super::*;

fn sample_tree() -> LayoutNode {
    LayoutNode::container(
        Style::new().with(StyleProp::Width(px(100.0))),
        vec![
            LayoutNode::text("a", Style::new()),
            LayoutNode::container(
                Style::new(),
                vec![LayoutNode::image("data:image/png;base64,AA==", Style::new())],
            ),
        ],
    )
}

#[test]
fn style_set_replaces_same_kind_in_place() {
    let style = Style::new()
        .with(StyleProp::Width(px(10.0)))
        .with(StyleProp::Gap(4.0))
        .with(StyleProp::Width(px(20.0)));
    assert_eq!(style.len(), 2);
    assert_eq!(style.props()[0], StyleProp::Width(px(20.0)));
    assert_eq!(style.width(), Some(px(20.0)));
    assert_eq!(style.height(), None);
}

#[test]
fn prop_validity_rejects_negative_and_non_finite() {
    assert!(StyleProp::Width(px(0.0)).is_valid());
    assert!(!StyleProp::Width(px(-1.0)).is_valid());
    assert!(!StyleProp::Height(percent(f32::NAN)).is_valid());
    assert!(!StyleProp::FontSize(0.0).is_valid());
    assert!(!StyleProp::LineClamp(0).is_valid());
    assert!(!StyleProp::FontWeight(0).is_valid());
    assert!(!StyleProp::FontFamily("  ".into()).is_valid());
    assert!(StyleProp::Color(Rgba8::rgb(1, 2, 3)).is_valid());
}

#[test]
fn depth_count_and_walk() {
    let tree = sample_tree();
    assert_eq!(tree.depth(), 3);
    assert_eq!(tree.node_count(), 4);

    let mut seen = Vec::new();
    tree.walk(&mut |n, d| {
        let tag = match n {
            LayoutNode::Container { .. } => "c",
            LayoutNode::Text { .. } => "t",
            LayoutNode::Image { .. } => "i",
        };
        seen.push((tag, d));
    });
    assert_eq!(seen, vec![("c", 0), ("t", 1), ("c", 1), ("i", 2)]);
    assert_eq!(tree.texts(), vec!["a"]);
    assert_eq!(tree.image_sources(), vec!["data:image/png;base64,AA=="]);
}

#[test]
fn leaves_have_no_children() {
    assert!(LayoutNode::text("x", Style::new()).children().is_empty());
    assert_eq!(LayoutNode::image("y", Style::new()).depth(), 1);
}

#[test]
fn serializes_with_type_tags_and_named_properties() {
    let node = LayoutNode::text(
        "hi",
        Style::new()
            .with(StyleProp::FontSize(28.0))
            .with(StyleProp::Color(Rgba8::rgb(0xf8, 0xfa, 0xfc))),
    );
    let v = serde_json::to_value(&node).unwrap();
    assert_eq!(v["type"], "text");
    assert_eq!(v["content"], "hi");
    assert_eq!(v["style"][0]["property"], "font_size");
    assert_eq!(v["style"][0]["value"], 28.0);
    assert_eq!(v["style"][1]["value"], "#f8fafc");
}
