use serde::Serialize;

use crate::foundation::core::Rgba8;

/// A length in pixels or as a percentage of the relevant reference size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Px(f32),
    Percent(f32),
}

impl Length {
    pub fn is_valid(self) -> bool {
        match self {
            Length::Px(v) | Length::Percent(v) => v.is_finite() && v >= 0.0,
        }
    }
}

/// Shorthand for [`Length::Px`].
pub fn px(v: f32) -> Length {
    Length::Px(v)
}

/// Shorthand for [`Length::Percent`] (`50.0` means half).
pub fn percent(v: f32) -> Length {
    Length::Percent(v)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Display {
    #[default]
    Flex,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JustifyContent {
    #[default]
    Start,
    End,
    Center,
    SpaceBetween,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignItems {
    Start,
    End,
    Center,
    #[default]
    Stretch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    #[default]
    Relative,
    Absolute,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOverflow {
    #[default]
    Clip,
    Ellipsis,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowWrap {
    #[default]
    Normal,
    BreakWord,
    Anywhere,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectFit {
    #[default]
    Fill,
    Contain,
    Cover,
}

/// Every style property a layout tree may carry. There is no catch-all variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "property", content = "value", rename_all = "snake_case")]
pub enum StyleProp {
    Width(Length),
    Height(Length),
    MinWidth(Length),
    MinHeight(Length),
    MaxWidth(Length),
    Display(Display),
    Position(Position),
    FlexDirection(FlexDirection),
    JustifyContent(JustifyContent),
    AlignItems(AlignItems),
    Gap(f32),
    FlexGrow(f32),
    FlexShrink(f32),
    Padding(f32),
    BorderRadius(Length),
    BackgroundColor(Rgba8),
    Color(Rgba8),
    FontFamily(String),
    FontSize(f32),
    FontWeight(u16),
    /// Multiple of the font size.
    LineHeight(f32),
    /// Maximum number of rendered lines.
    LineClamp(u32),
    TextOverflow(TextOverflow),
    TextAlign(TextAlign),
    OverflowWrap(OverflowWrap),
    ObjectFit(ObjectFit),
}

impl StyleProp {
    /// Checks the value range a rasterizer is allowed to assume.
    pub fn is_valid(&self) -> bool {
        match self {
            StyleProp::Width(l)
            | StyleProp::Height(l)
            | StyleProp::MinWidth(l)
            | StyleProp::MinHeight(l)
            | StyleProp::MaxWidth(l)
            | StyleProp::BorderRadius(l) => l.is_valid(),
            StyleProp::Gap(v)
            | StyleProp::FlexGrow(v)
            | StyleProp::FlexShrink(v)
            | StyleProp::Padding(v) => v.is_finite() && *v >= 0.0,
            StyleProp::FontSize(v) | StyleProp::LineHeight(v) => v.is_finite() && *v > 0.0,
            StyleProp::FontWeight(w) => (1..=1000).contains(w),
            StyleProp::LineClamp(n) => *n >= 1,
            StyleProp::FontFamily(f) => !f.trim().is_empty(),
            StyleProp::Display(_)
            | StyleProp::Position(_)
            | StyleProp::FlexDirection(_)
            | StyleProp::JustifyContent(_)
            | StyleProp::AlignItems(_)
            | StyleProp::BackgroundColor(_)
            | StyleProp::Color(_)
            | StyleProp::TextOverflow(_)
            | StyleProp::TextAlign(_)
            | StyleProp::OverflowWrap(_)
            | StyleProp::ObjectFit(_) => true,
        }
    }
}

/// Ordered set of style properties; at most one value per property kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Style(Vec<StyleProp>);

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing an earlier value of the same kind in place.
    pub fn with(mut self, prop: StyleProp) -> Self {
        self.set(prop);
        self
    }

    pub fn set(&mut self, prop: StyleProp) {
        let kind = std::mem::discriminant(&prop);
        match self
            .0
            .iter_mut()
            .find(|p| std::mem::discriminant(*p) == kind)
        {
            Some(slot) => *slot = prop,
            None => self.0.push(prop),
        }
    }

    pub fn props(&self) -> &[StyleProp] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn width(&self) -> Option<Length> {
        self.0.iter().find_map(|p| match p {
            StyleProp::Width(l) => Some(*l),
            _ => None,
        })
    }

    pub fn height(&self) -> Option<Length> {
        self.0.iter().find_map(|p| match p {
            StyleProp::Height(l) => Some(*l),
            _ => None,
        })
    }

    pub fn line_clamp(&self) -> Option<u32> {
        self.0.iter().find_map(|p| match p {
            StyleProp::LineClamp(n) => Some(*n),
            _ => None,
        })
    }

    pub fn text_overflow(&self) -> Option<TextOverflow> {
        self.0.iter().find_map(|p| match p {
            StyleProp::TextOverflow(t) => Some(*t),
            _ => None,
        })
    }
}

/// One element of the declarative visual tree handed to a rasterizer.
///
/// Nodes own their children exclusively, so a tree is always finite and acyclic.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutNode {
    Container {
        style: Style,
        children: Vec<LayoutNode>,
    },
    Text {
        content: String,
        style: Style,
    },
    Image {
        /// Self-contained image reference, normally a `data:` URI.
        source: String,
        style: Style,
    },
}

impl LayoutNode {
    pub fn container(style: Style, children: Vec<LayoutNode>) -> Self {
        Self::Container { style, children }
    }

    pub fn text(content: impl Into<String>, style: Style) -> Self {
        Self::Text {
            content: content.into(),
            style,
        }
    }

    pub fn image(source: impl Into<String>, style: Style) -> Self {
        Self::Image {
            source: source.into(),
            style,
        }
    }

    pub fn style(&self) -> &Style {
        match self {
            Self::Container { style, .. }
            | Self::Text { style, .. }
            | Self::Image { style, .. } => style,
        }
    }

    pub fn children(&self) -> &[LayoutNode] {
        match self {
            Self::Container { children, .. } => children,
            Self::Text { .. } | Self::Image { .. } => &[],
        }
    }

    /// Number of levels in the tree; a lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(LayoutNode::depth)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(LayoutNode::node_count)
            .sum::<usize>()
    }

    /// Pre-order traversal; `f` receives each node with its depth (root = 0).
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a LayoutNode, usize)) {
        fn go<'a>(node: &'a LayoutNode, depth: usize, f: &mut impl FnMut(&'a LayoutNode, usize)) {
            f(node, depth);
            for child in node.children() {
                go(child, depth + 1, f);
            }
        }
        go(self, 0, f);
    }

    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |n, _| {
            if let LayoutNode::Text { content, .. } = n {
                out.push(content.as_str());
            }
        });
        out
    }

    pub fn image_sources(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |n, _| {
            if let LayoutNode::Image { source, .. } = n {
                out.push(source.as_str());
            }
        });
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/node.rs"]
mod tests;
