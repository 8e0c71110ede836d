use std::time::Duration;

use base64::Engine as _;

use crate::{
    avatar::fallback::fallback_icon,
    config::{AvatarConfig, MissingAvatarPolicy},
    foundation::error::{OgError, OgResult},
    render::decode::{SVG_MIME, decode_raster, parse_svg},
};

/// MIME type assumed when the avatar response does not state a usable one.
pub const DEFAULT_AVATAR_MIME: &str = "image/png";

/// Avatar bytes plus the MIME type needed to embed them without a second fetch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmbeddedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EmbeddedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// `data:<mime>;base64,<payload>` form consumed by image layout nodes.
    pub fn to_data_uri(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{payload}", self.mime_type)
    }
}

/// Outcome of avatar resolution for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedAvatar {
    Embeddable(EmbeddedImage),
    Absent,
}

impl ResolvedAvatar {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Embeddable(_))
    }

    pub fn embedded(&self) -> Option<&EmbeddedImage> {
        match self {
            Self::Embeddable(img) => Some(img),
            Self::Absent => None,
        }
    }
}

/// Fetches avatar URLs and turns them into [`ResolvedAvatar`] values.
///
/// Resolution never fails: every fetch, status, size or decode problem degrades to
/// [`ResolvedAvatar::Absent`] and is only logged. One attempt is made per call, bounded by the
/// configured timeout.
#[derive(Clone, Debug)]
pub struct AvatarResolver {
    client: reqwest::Client,
    max_bytes: u64,
    missing_url: MissingAvatarPolicy,
}

impl AvatarResolver {
    pub fn new(config: &AvatarConfig) -> OgResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OgError::validation(format!("build avatar http client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
            missing_url: config.missing_url,
        })
    }

    pub fn missing_url_policy(&self) -> MissingAvatarPolicy {
        self.missing_url
    }

    /// Result used for requests that name no avatar URL. Never touches the network.
    pub fn missing_url_avatar(&self) -> ResolvedAvatar {
        match self.missing_url {
            MissingAvatarPolicy::FallbackIcon => ResolvedAvatar::Embeddable(fallback_icon()),
            MissingAvatarPolicy::NoAvatar => ResolvedAvatar::Absent,
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, image_url: &str) -> ResolvedAvatar {
        let image_url = image_url.trim();
        if image_url.is_empty() {
            return self.missing_url_avatar();
        }

        match self.fetch(image_url).await {
            Ok(img) => {
                tracing::debug!(
                    mime = %img.mime_type,
                    bytes = img.bytes.len(),
                    "avatar resolved"
                );
                ResolvedAvatar::Embeddable(img)
            }
            Err(err) => {
                tracing::warn!(
                    url = image_url,
                    error = %err,
                    "avatar unavailable, rendering without it"
                );
                ResolvedAvatar::Absent
            }
        }
    }

    async fn fetch(&self, image_url: &str) -> OgResult<EmbeddedImage> {
        let url = url::Url::parse(image_url)
            .map_err(|e| OgError::fetch(format!("invalid avatar url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OgError::fetch(format!(
                "unsupported avatar url scheme '{}'",
                url.scheme()
            )));
        }

        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OgError::fetch(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OgError::fetch(format!("upstream returned {status}")));
        }
        if let Some(len) = resp.content_length()
            && len > self.max_bytes
        {
            return Err(OgError::fetch(format!(
                "content-length {len} exceeds limit of {} bytes",
                self.max_bytes
            )));
        }

        let mime_type = mime_from_content_type(
            resp.headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        let mut bytes = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| OgError::fetch(format!("read body: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(OgError::fetch(format!(
                    "body exceeds limit of {} bytes",
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        ensure_decodable(&mime_type, &bytes)?;
        Ok(EmbeddedImage::new(mime_type, bytes))
    }
}

/// Media type from a `Content-Type` header value, parameters dropped.
///
/// Anything that is not shaped like `type/subtype` falls back to [`DEFAULT_AVATAR_MIME`].
pub fn mime_from_content_type(header: Option<&str>) -> String {
    let Some(header) = header else {
        return DEFAULT_AVATAR_MIME.to_owned();
    };
    let essence = header.split(';').next().unwrap_or("").trim();
    let well_formed = essence
        .split_once('/')
        .is_some_and(|(ty, sub)| is_mime_token(ty) && is_mime_token(sub));
    if well_formed {
        essence.to_ascii_lowercase()
    } else {
        DEFAULT_AVATAR_MIME.to_owned()
    }
}

fn is_mime_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
}

fn ensure_decodable(mime_type: &str, bytes: &[u8]) -> OgResult<()> {
    if bytes.is_empty() {
        return Err(OgError::fetch("empty avatar body"));
    }
    let decoded = if mime_type == SVG_MIME {
        parse_svg(bytes).map(|_| ())
    } else {
        decode_raster(bytes).map(|_| ())
    };
    decoded.map_err(|e| OgError::fetch(format!("avatar body is not a usable image: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/avatar/resolver.rs"]
mod tests;
