use crate::{
    avatar::resolver::ResolvedAvatar,
    content::model::ContentModel,
    foundation::core::{Canvas, Rgba8},
    layout::node::{
        AlignItems, Display, FlexDirection, JustifyContent, LayoutNode, ObjectFit, OverflowWrap,
        Style, StyleProp, TextAlign, TextOverflow, percent, px,
    },
};

/// Canvas every composed card targets.
pub const CARD_CANVAS: Canvas = Canvas::OPEN_GRAPH;

pub const FONT_FAMILY: &str = "Plus Jakarta Sans";

const BG_PRIMARY: Rgba8 = Rgba8::rgb(0x0f, 0x17, 0x2a);
const FG_PRIMARY: Rgba8 = Rgba8::rgb(0xf8, 0xfa, 0xfc);
const FG_SECONDARY: Rgba8 = Rgba8::rgb(0xcb, 0xd5, 0xe1);
const AVATAR_FRAME_BG: Rgba8 = Rgba8::rgb(0x33, 0x41, 0x55);

const PADDING: f32 = 64.0;
const MAIN_GAP: f32 = 48.0;
const TEXT_GAP: f32 = 24.0;
const FOOTER_GAP: f32 = 24.0;
const TEXT_MAX_WIDTH: f32 = 720.0;
const TEXT_MAX_LINES: u32 = 3;

/// Diameter of the circular avatar frame.
pub const AVATAR_FRAME_PX: f32 = 260.0;
/// Edge of the avatar image inside the frame.
pub const AVATAR_IMAGE_PX: f32 = 200.0;

/// Build the card layout for one request. Pure and deterministic.
///
/// The compositor only declares intent (line clamps, ellipsis, wrapping); measuring and
/// truncating text is left to the rasterizer.
pub fn compose(content: &ContentModel, avatar: &ResolvedAvatar) -> LayoutNode {
    let mut main_children = vec![text_column(content)];
    if let Some(frame) = avatar_frame(avatar) {
        main_children.push(frame);
    }

    let main_row = LayoutNode::container(
        flex(FlexDirection::Row)
            .with(StyleProp::AlignItems(AlignItems::Center))
            .with(StyleProp::JustifyContent(JustifyContent::SpaceBetween))
            .with(StyleProp::Gap(MAIN_GAP))
            .with(StyleProp::FlexGrow(1.0))
            .with(StyleProp::MinHeight(px(0.0))),
        main_children,
    );

    LayoutNode::container(
        flex(FlexDirection::Column)
            .with(StyleProp::Width(px(CARD_CANVAS.width as f32)))
            .with(StyleProp::Height(px(CARD_CANVAS.height as f32)))
            .with(StyleProp::BackgroundColor(BG_PRIMARY))
            .with(StyleProp::JustifyContent(JustifyContent::SpaceBetween))
            .with(StyleProp::Padding(PADDING)),
        vec![main_row, footer(content)],
    )
}

fn flex(direction: FlexDirection) -> Style {
    Style::new()
        .with(StyleProp::Display(Display::Flex))
        .with(StyleProp::FlexDirection(direction))
}

fn text_style(size: f32, weight: u16, color: Rgba8) -> Style {
    Style::new()
        .with(StyleProp::Color(color))
        .with(StyleProp::FontSize(size))
        .with(StyleProp::FontFamily(FONT_FAMILY.to_owned()))
        .with(StyleProp::FontWeight(weight))
}

fn clamped(style: Style, line_height: f32) -> Style {
    style
        .with(StyleProp::LineHeight(line_height))
        .with(StyleProp::MaxWidth(px(TEXT_MAX_WIDTH)))
        .with(StyleProp::LineClamp(TEXT_MAX_LINES))
        .with(StyleProp::TextOverflow(TextOverflow::Ellipsis))
}

fn text_column(content: &ContentModel) -> LayoutNode {
    LayoutNode::container(
        flex(FlexDirection::Column)
            .with(StyleProp::Gap(TEXT_GAP))
            .with(StyleProp::FlexGrow(1.0))
            .with(StyleProp::MinWidth(px(0.0))),
        vec![
            LayoutNode::text(
                content.title.as_str(),
                clamped(text_style(72.0, 700, FG_PRIMARY), 1.1),
            ),
            LayoutNode::text(
                content.description.as_str(),
                clamped(text_style(36.0, 400, FG_SECONDARY), 1.4),
            ),
        ],
    )
}

fn avatar_frame(avatar: &ResolvedAvatar) -> Option<LayoutNode> {
    let img = avatar.embedded()?;
    Some(LayoutNode::container(
        flex(FlexDirection::Row)
            .with(StyleProp::Width(px(AVATAR_FRAME_PX)))
            .with(StyleProp::Height(px(AVATAR_FRAME_PX)))
            .with(StyleProp::BorderRadius(percent(50.0)))
            .with(StyleProp::BackgroundColor(AVATAR_FRAME_BG))
            .with(StyleProp::AlignItems(AlignItems::Center))
            .with(StyleProp::JustifyContent(JustifyContent::Center))
            .with(StyleProp::FlexShrink(0.0)),
        vec![LayoutNode::image(
            img.to_data_uri(),
            Style::new()
                .with(StyleProp::Width(px(AVATAR_IMAGE_PX)))
                .with(StyleProp::Height(px(AVATAR_IMAGE_PX)))
                .with(StyleProp::BorderRadius(percent(50.0)))
                .with(StyleProp::ObjectFit(ObjectFit::Cover)),
        )],
    ))
}

fn footer(content: &ContentModel) -> LayoutNode {
    let cell = |justify: JustifyContent, child: LayoutNode| {
        LayoutNode::container(
            flex(FlexDirection::Row)
                .with(StyleProp::JustifyContent(justify))
                .with(StyleProp::FlexGrow(1.0))
                .with(StyleProp::MinWidth(px(0.0))),
            vec![child],
        )
    };

    LayoutNode::container(
        flex(FlexDirection::Row)
            .with(StyleProp::JustifyContent(JustifyContent::SpaceBetween))
            .with(StyleProp::AlignItems(AlignItems::End))
            .with(StyleProp::Gap(FOOTER_GAP)),
        vec![
            cell(
                JustifyContent::Start,
                LayoutNode::text(
                    content.site_name.as_str(),
                    text_style(28.0, 700, FG_PRIMARY)
                        .with(StyleProp::OverflowWrap(OverflowWrap::Anywhere)),
                ),
            ),
            cell(
                JustifyContent::End,
                LayoutNode::text(
                    content.social.as_str(),
                    text_style(28.0, 400, FG_PRIMARY)
                        .with(StyleProp::TextAlign(TextAlign::End))
                        .with(StyleProp::OverflowWrap(OverflowWrap::Anywhere)),
                ),
            ),
        ],
    )
}

#[cfg(test)]
#[path = "../../tests/unit/layout/compose.rs"]
mod tests;
