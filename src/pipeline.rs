use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    avatar::resolver::{AvatarResolver, ResolvedAvatar},
    config::ServiceConfig,
    content::model::{ContentModel, RawParams, normalize},
    foundation::{
        core::Canvas,
        error::{OgError, OgResult},
    },
    layout::{compose::compose, node::LayoutNode},
    render::{OutputFormat, Rasterizer, cpu::CpuRasterizer, fonts::FontRegistry},
};

/// Encoded image ready to be sent to a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

type SharedRasterizer = Arc<Mutex<Box<dyn Rasterizer + Send>>>;

/// Request pipeline: normalize, resolve the avatar, compose, rasterize.
///
/// Built once at startup and shared behind an `Arc`. The rasterizer is reused by every request
/// but only ever driven by one render at a time.
pub struct OgImageService {
    resolver: AvatarResolver,
    rasterizer: SharedRasterizer,
    canvas: Canvas,
    format: OutputFormat,
    cache_max_age_secs: u32,
}

impl std::fmt::Debug for OgImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OgImageService")
            .field("resolver", &self.resolver)
            .field("canvas", &self.canvas)
            .field("format", &self.format)
            .field("cache_max_age_secs", &self.cache_max_age_secs)
            .finish_non_exhaustive()
    }
}

impl OgImageService {
    pub fn new(
        config: &ServiceConfig,
        rasterizer: impl Rasterizer + Send + 'static,
    ) -> OgResult<Self> {
        config.validate()?;
        let boxed: Box<dyn Rasterizer + Send> = Box::new(rasterizer);
        Ok(Self {
            resolver: AvatarResolver::new(&config.avatar)?,
            rasterizer: Arc::new(Mutex::new(boxed)),
            canvas: Canvas::OPEN_GRAPH,
            format: OutputFormat::Png,
            cache_max_age_secs: config.cache_max_age_secs,
        })
    }

    /// Register the configured fonts and build the service around a [`CpuRasterizer`].
    pub fn from_config(config: &ServiceConfig) -> OgResult<Self> {
        let fonts = FontRegistry::from_config(&config.fonts)?;
        tracing::info!(families = fonts.families().len(), "font registry ready");
        Self::new(config, CpuRasterizer::new(fonts))
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn cache_max_age_secs(&self) -> u32 {
        self.cache_max_age_secs
    }

    pub fn resolver(&self) -> &AvatarResolver {
        &self.resolver
    }

    /// The avatar for `content`, at most one network round trip.
    pub async fn resolve_avatar(&self, content: &ContentModel) -> ResolvedAvatar {
        if content.has_avatar_url() {
            self.resolver.resolve(&content.image_url).await
        } else {
            self.resolver.missing_url_avatar()
        }
    }

    /// Everything up to (not including) rasterization.
    pub async fn compose_layout(&self, params: &RawParams) -> (ContentModel, LayoutNode) {
        let content = normalize(params);
        let avatar = self.resolve_avatar(&content).await;
        tracing::debug!(avatar = avatar.is_present(), "avatar stage done");
        let tree = compose(&content, &avatar);
        (content, tree)
    }

    #[tracing::instrument(level = "info", skip_all, fields(params = params.len()))]
    pub async fn generate(&self, params: &RawParams) -> OgResult<RenderedImage> {
        let (_content, tree) = self.compose_layout(params).await;
        tracing::debug!(nodes = tree.node_count(), depth = tree.depth(), "layout composed");
        self.render_tree(tree).await
    }

    /// Rasterize an already composed tree on a blocking thread.
    pub async fn render_tree(&self, tree: LayoutNode) -> OgResult<RenderedImage> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let (canvas, format) = (self.canvas, self.format);

        let bytes = tokio::task::spawn_blocking(move || {
            // A panicked render fails only its own request; the engine keeps serving.
            let mut engine = rasterizer.lock().unwrap_or_else(|poisoned| {
                tracing::warn!("previous render panicked, reusing rasterizer");
                rasterizer.clear_poison();
                PoisonError::into_inner(poisoned)
            });
            engine.render(&tree, canvas, format)
        })
        .await
        .map_err(|e| OgError::render(format!("render task failed: {e}")))??;

        tracing::debug!(bytes = bytes.len(), "image rendered");
        Ok(RenderedImage {
            bytes,
            mime_type: format.mime_type(),
            width: canvas.width,
            height: canvas.height,
        })
    }
}
