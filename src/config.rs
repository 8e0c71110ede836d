use std::{
    fs::File,
    io::BufReader,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{OgError, OgResult};

/// What to show when a request carries no `image` URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAvatarPolicy {
    /// Embed the bundled fallback icon (no network call).
    #[default]
    FallbackIcon,
    /// Render the card without an avatar frame.
    NoAvatar,
}

/// Settings for the remote avatar fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Whole-request timeout (connect, headers and body) in milliseconds.
    pub timeout_ms: u64,
    /// Largest accepted response body.
    pub max_bytes: u64,
    pub user_agent: String,
    pub missing_url: MissingAvatarPolicy,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_bytes: 5 * 1024 * 1024,
            user_agent: format!("ogcard/{}", env!("CARGO_PKG_VERSION")),
            missing_url: MissingAvatarPolicy::default(),
        }
    }
}

/// Fonts registered into the rasterizer once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TTF/OTF/TTC files loaded in order; the first family becomes the fallback family.
    pub files: Vec<PathBuf>,
    /// Also load fonts installed on the host.
    pub system_fonts: bool,
}

/// Process-level configuration for the image service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind: String,
    /// `max-age` advertised on image responses.
    pub cache_max_age_secs: u32,
    pub avatar: AvatarConfig,
    pub fonts: FontConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_owned(),
            cache_max_age_secs: 60,
            avatar: AvatarConfig::default(),
            fonts: FontConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> OgResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| OgError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> OgResult<()> {
        self.bind_addr()?;
        if self.avatar.timeout_ms == 0 {
            return Err(OgError::validation("avatar.timeout_ms must be > 0"));
        }
        if self.avatar.max_bytes == 0 {
            return Err(OgError::validation("avatar.max_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> OgResult<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| OgError::validation(format!("invalid bind address '{}': {e}", self.bind)))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
