//! `ogcard` renders Open Graph preview cards on demand.
//!
//! A request's query parameters flow through a fixed pipeline:
//!
//! - [`normalize`] turns raw parameters into a [`ContentModel`]
//! - [`AvatarResolver`] fetches the optional avatar, failing soft to [`ResolvedAvatar::Absent`]
//! - [`compose`] builds a declarative [`LayoutNode`] tree for a 1200x630 canvas
//! - a [`Rasterizer`] (normally [`CpuRasterizer`]) lays the tree out and encodes a PNG
//!
//! [`OgImageService`] wires the stages together and [`OgServer`] exposes them over HTTP.
#![forbid(unsafe_code)]

mod avatar;
mod config;
mod content;
mod foundation;
mod layout;
mod pipeline;
mod render;
mod server;

pub use crate::foundation::core::{Canvas, Rect, Rgba8};
pub use crate::foundation::error::{OgError, OgResult};

pub use crate::avatar::fallback::{FALLBACK_ICON_MIME, fallback_icon};
pub use crate::avatar::resolver::{
    AvatarResolver, DEFAULT_AVATAR_MIME, EmbeddedImage, ResolvedAvatar, mime_from_content_type,
};
pub use crate::config::{AvatarConfig, FontConfig, MissingAvatarPolicy, ServiceConfig};
pub use crate::content::model::{
    ContentModel, DEFAULT_DESCRIPTION, DEFAULT_SITE_NAME, DEFAULT_SOCIAL, DEFAULT_TITLE,
    RawParams, normalize,
};
pub use crate::layout::compose::{
    AVATAR_FRAME_PX, AVATAR_IMAGE_PX, CARD_CANVAS, FONT_FAMILY, compose,
};
pub use crate::layout::node::{
    AlignItems, Display, FlexDirection, JustifyContent, LayoutNode, Length, ObjectFit,
    OverflowWrap, Position, Style, StyleProp, TextAlign, TextOverflow, percent, px,
};
pub use crate::pipeline::{OgImageService, RenderedImage};
pub use crate::render::cpu::{CpuRasterizer, validate_tree};
pub use crate::render::decode::{DataUri, SVG_MIME, parse_data_uri};
pub use crate::render::fonts::FontRegistry;
pub use crate::render::{OutputFormat, Rasterizer};
pub use crate::server::{HttpReply, OgServer, ShutdownHandle, handle};
