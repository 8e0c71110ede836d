use taffy::prelude::{AvailableSpace, NodeId, Rect as TRect, Size};
use taffy::style::{Dimension, LengthPercentage};

use crate::{
    foundation::{
        core::{Canvas, Rect},
        error::{OgError, OgResult},
    },
    layout::node::{
        AlignItems, Display, FlexDirection, JustifyContent, LayoutNode, Length, ObjectFit,
        Position, Style, StyleProp, TextOverflow,
    },
    render::fonts::{FontRegistry, TextSpec},
};

/// What a placed box draws besides its own background.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PlacedKind<'a> {
    Container,
    Text { content: &'a str, spec: TextSpec },
    Image { source: &'a str, fit: ObjectFit },
}

/// A node with its absolute border box, in paint order (parents before children).
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Placed<'a> {
    pub(crate) rect: Rect,
    pub(crate) style: &'a Style,
    pub(crate) kind: PlacedKind<'a>,
}

struct MeasuredText<'a> {
    content: &'a str,
    spec: TextSpec,
    max_width_px: Option<f32>,
}

struct Built<'a> {
    nid: NodeId,
    node: &'a LayoutNode,
    kind: PlacedKind<'a>,
    hidden: bool,
    children: Vec<Built<'a>>,
}

/// Run flexbox layout over `root` on a `canvas`-sized viewport.
///
/// Text leaves are measured with `fonts` so wrapping and line clamps feed back into box sizes.
pub(crate) fn compute_layout<'a>(
    root: &'a LayoutNode,
    canvas: Canvas,
    fonts: &mut FontRegistry,
) -> OgResult<Vec<Placed<'a>>> {
    let mut taffy: taffy::TaffyTree<usize> = taffy::TaffyTree::new();
    let mut texts: Vec<MeasuredText<'a>> = Vec::new();

    let built = build_subtree(&mut taffy, &mut texts, root, &TextSpec::default())?;

    let available = Size {
        width: AvailableSpace::Definite(canvas.width as f32),
        height: AvailableSpace::Definite(canvas.height as f32),
    };
    taffy
        .compute_layout_with_measure(
            built.nid,
            available,
            |known_dimensions, available_space, _node_id, node_context, _style| {
                let Some(text) = node_context.and_then(|i| texts.get(*i)) else {
                    return known_dimensions.unwrap_or(Size::ZERO);
                };
                let limit = known_dimensions.width.or(match available_space.width {
                    AvailableSpace::Definite(w) => Some(w),
                    AvailableSpace::MinContent => Some(0.0),
                    AvailableSpace::MaxContent => None,
                });
                let limit = match (limit, text.max_width_px) {
                    (Some(w), Some(m)) => Some(w.min(m)),
                    (None, m) => m,
                    (w, None) => w,
                };
                let shaped = fonts.shape(text.content, &text.spec, limit);
                Size {
                    width: known_dimensions
                        .width
                        .unwrap_or_else(|| shaped.width().ceil()),
                    height: known_dimensions
                        .height
                        .unwrap_or_else(|| shaped.height().ceil()),
                }
            },
        )
        .map_err(|e| OgError::render(format!("flex layout failed: {e}")))?;

    let mut out = Vec::new();
    collect(&taffy, built, 0.0, 0.0, &mut out)?;
    Ok(out)
}

fn build_subtree<'a>(
    taffy: &mut taffy::TaffyTree<usize>,
    texts: &mut Vec<MeasuredText<'a>>,
    node: &'a LayoutNode,
    inherited: &TextSpec,
) -> OgResult<Built<'a>> {
    let style = node.style();
    let spec = inherit_text_spec(inherited, style);
    let tstyle = taffy_style(style);
    let hidden = tstyle.display == taffy::style::Display::None;
    let err = |e: taffy::TaffyError| OgError::render(format!("build flex tree: {e}"));

    let built = match node {
        LayoutNode::Container { children, .. } => {
            let mut kids = Vec::with_capacity(children.len());
            for child in children {
                kids.push(build_subtree(taffy, texts, child, &spec)?);
            }
            let ids: Vec<NodeId> = kids.iter().map(|k| k.nid).collect();
            Built {
                nid: taffy.new_with_children(tstyle, &ids).map_err(err)?,
                node,
                kind: PlacedKind::Container,
                hidden,
                children: kids,
            }
        }
        LayoutNode::Text { content, .. } => {
            let idx = texts.len();
            texts.push(MeasuredText {
                content,
                spec: spec.clone(),
                max_width_px: max_width_px(style),
            });
            Built {
                nid: taffy.new_leaf_with_context(tstyle, idx).map_err(err)?,
                node,
                kind: PlacedKind::Text { content, spec },
                hidden,
                children: Vec::new(),
            }
        }
        LayoutNode::Image { source, .. } => {
            let fit = style
                .props()
                .iter()
                .rev()
                .find_map(|p| match p {
                    StyleProp::ObjectFit(f) => Some(*f),
                    _ => None,
                })
                .unwrap_or_default();
            Built {
                nid: taffy.new_leaf(tstyle).map_err(err)?,
                node,
                kind: PlacedKind::Image { source, fit },
                hidden,
                children: Vec::new(),
            }
        }
    };
    Ok(built)
}

fn collect<'a>(
    taffy: &taffy::TaffyTree<usize>,
    built: Built<'a>,
    parent_x: f64,
    parent_y: f64,
    out: &mut Vec<Placed<'a>>,
) -> OgResult<()> {
    if built.hidden {
        return Ok(());
    }
    let l = taffy
        .layout(built.nid)
        .map_err(|e| OgError::render(format!("read flex layout: {e}")))?;
    let x = parent_x + f64::from(l.location.x);
    let y = parent_y + f64::from(l.location.y);
    out.push(Placed {
        rect: Rect::new(
            x,
            y,
            x + f64::from(l.size.width),
            y + f64::from(l.size.height),
        ),
        style: built.node.style(),
        kind: built.kind,
    });
    for child in built.children {
        collect(taffy, child, x, y, out)?;
    }
    Ok(())
}

fn dimension(len: Length) -> Dimension {
    match len {
        Length::Px(v) => Dimension::length(v),
        Length::Percent(p) => Dimension::percent(p / 100.0),
    }
}

fn max_width_px(style: &Style) -> Option<f32> {
    style.props().iter().rev().find_map(|p| match p {
        StyleProp::MaxWidth(Length::Px(v)) => Some(*v),
        _ => None,
    })
}

pub(crate) fn taffy_style(style: &Style) -> taffy::Style {
    let mut s = taffy::Style {
        display: taffy::style::Display::Flex,
        ..Default::default()
    };
    for prop in style.props() {
        match prop {
            StyleProp::Width(l) => s.size.width = dimension(*l),
            StyleProp::Height(l) => s.size.height = dimension(*l),
            StyleProp::MinWidth(l) => s.min_size.width = dimension(*l),
            StyleProp::MinHeight(l) => s.min_size.height = dimension(*l),
            StyleProp::MaxWidth(l) => s.max_size.width = dimension(*l),
            StyleProp::Display(d) => {
                s.display = match d {
                    Display::Flex => taffy::style::Display::Flex,
                    Display::None => taffy::style::Display::None,
                }
            }
            StyleProp::Position(p) => {
                s.position = match p {
                    Position::Relative => taffy::style::Position::Relative,
                    Position::Absolute => taffy::style::Position::Absolute,
                }
            }
            StyleProp::FlexDirection(d) => {
                s.flex_direction = match d {
                    FlexDirection::Row => taffy::style::FlexDirection::Row,
                    FlexDirection::Column => taffy::style::FlexDirection::Column,
                }
            }
            StyleProp::JustifyContent(j) => {
                s.justify_content = Some(match j {
                    JustifyContent::Start => taffy::style::JustifyContent::Start,
                    JustifyContent::End => taffy::style::JustifyContent::End,
                    JustifyContent::Center => taffy::style::JustifyContent::Center,
                    JustifyContent::SpaceBetween => taffy::style::JustifyContent::SpaceBetween,
                })
            }
            StyleProp::AlignItems(a) => {
                s.align_items = Some(match a {
                    AlignItems::Start => taffy::style::AlignItems::Start,
                    AlignItems::End => taffy::style::AlignItems::End,
                    AlignItems::Center => taffy::style::AlignItems::Center,
                    AlignItems::Stretch => taffy::style::AlignItems::Stretch,
                })
            }
            StyleProp::Gap(g) => {
                s.gap = Size {
                    width: LengthPercentage::length(*g),
                    height: LengthPercentage::length(*g),
                }
            }
            StyleProp::FlexGrow(g) => s.flex_grow = *g,
            StyleProp::FlexShrink(v) => s.flex_shrink = *v,
            StyleProp::Padding(p) => {
                s.padding = TRect {
                    left: LengthPercentage::length(*p),
                    right: LengthPercentage::length(*p),
                    top: LengthPercentage::length(*p),
                    bottom: LengthPercentage::length(*p),
                }
            }
            StyleProp::BorderRadius(_)
            | StyleProp::BackgroundColor(_)
            | StyleProp::Color(_)
            | StyleProp::FontFamily(_)
            | StyleProp::FontSize(_)
            | StyleProp::FontWeight(_)
            | StyleProp::LineHeight(_)
            | StyleProp::LineClamp(_)
            | StyleProp::TextOverflow(_)
            | StyleProp::TextAlign(_)
            | StyleProp::OverflowWrap(_)
            | StyleProp::ObjectFit(_) => {}
        }
    }
    s
}

/// Text styling as seen by `style`'s node: inheritable properties flow down from ancestors,
/// line clamping applies only where it is declared.
pub(crate) fn inherit_text_spec(parent: &TextSpec, style: &Style) -> TextSpec {
    let mut spec = TextSpec {
        max_lines: None,
        ellipsis: false,
        ..parent.clone()
    };
    for prop in style.props() {
        match prop {
            StyleProp::Color(c) => spec.color = *c,
            StyleProp::FontFamily(f) => spec.family = Some(f.clone()),
            StyleProp::FontSize(v) => spec.size_px = *v,
            StyleProp::FontWeight(w) => spec.weight = *w,
            StyleProp::LineHeight(v) => spec.line_height = *v,
            StyleProp::TextAlign(a) => spec.align = *a,
            StyleProp::OverflowWrap(w) => spec.overflow_wrap = *w,
            StyleProp::LineClamp(n) => spec.max_lines = Some(*n),
            StyleProp::TextOverflow(o) => spec.ellipsis = *o == TextOverflow::Ellipsis,
            _ => {}
        }
    }
    spec
}

#[cfg(test)]
#[path = "../../tests/unit/render/flex.rs"]
mod tests;
