use crate::foundation::error::{OgError, OgResult};

pub use kurbo::Rect;

/// Raster canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// The 1200x630 (1.91:1) size social platforms expect for link previews.
    pub const OPEN_GRAPH: Canvas = Canvas {
        width: 1200,
        height: 630,
    };

    pub fn new(width: u32, height: u32) -> OgResult<Self> {
        if width == 0 || height == 0 {
            return Err(OgError::validation("canvas width/height must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(OgError::validation(format!(
                "canvas {width}x{height} exceeds the {max}x{max} raster limit",
                max = u16::MAX
            )));
        }
        Ok(Self { width, height })
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::OPEN_GRAPH
    }
}

/// Straight (non-premultiplied) RGBA8 colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional, case-insensitive).
    pub fn from_hex(s: &str) -> OgResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> OgResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| OgError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(OgError::validation("hex color must be ASCII"));
        }
        match s.len() {
            6 => Ok(Self::rgb(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self {
                r: hex_byte(&s[0..2])?,
                g: hex_byte(&s[2..4])?,
                b: hex_byte(&s[4..6])?,
                a: hex_byte(&s[6..8])?,
            }),
            _ => Err(OgError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn premultiplied(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| -> u8 { ((u16::from(c) * a + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
