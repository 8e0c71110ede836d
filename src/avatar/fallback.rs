use crate::avatar::resolver::EmbeddedImage;

/// MIME type of the bundled fallback icon.
pub const FALLBACK_ICON_MIME: &str = "image/svg+xml";

const FALLBACK_ICON_SVG: &[u8] = include_bytes!("../../assets/fallback-avatar.svg");

/// The built-in avatar used when a request names no image and the policy asks for an icon.
pub fn fallback_icon() -> EmbeddedImage {
    EmbeddedImage::new(FALLBACK_ICON_MIME, FALLBACK_ICON_SVG.to_vec())
}
