use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ogcard", version, about = "Render Open Graph preview cards")]
struct Cli {
    /// JSON config file. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `/og` and `/health` over HTTP.
    Serve(ServeArgs),
    /// Render one card to a PNG file.
    Render(RenderArgs),
    /// Print the composed layout tree as JSON.
    Layout(LayoutArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Font file to register (repeatable). The first family becomes the fallback.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Also register fonts installed on this machine.
    #[arg(long)]
    system_fonts: bool,

    /// Render without an avatar when no image URL is given.
    #[arg(long)]
    no_fallback_avatar: bool,

    /// Avatar fetch timeout in milliseconds.
    #[arg(long)]
    avatar_timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct CardArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    site_name: Option<String>,
    #[arg(long)]
    social: Option<String>,
    /// Avatar image URL.
    #[arg(long)]
    image: Option<String>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address, e.g. `0.0.0.0:8787`.
    #[arg(long)]
    bind: Option<String>,

    /// `max-age` for image responses.
    #[arg(long)]
    cache_max_age_secs: Option<u32>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    card: CardArgs,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct LayoutArgs {
    #[command(flatten)]
    card: CardArgs,

    /// Fetch the avatar instead of only describing where it would go.
    #[arg(long)]
    fetch: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let base = load_config(cli.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start tokio runtime")?;

    match cli.cmd {
        Command::Serve(args) => cmd_serve(base, args, &runtime),
        Command::Render(args) => runtime.block_on(cmd_render(base, args)),
        Command::Layout(args) => runtime.block_on(cmd_layout(base, args)),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ogcard::ServiceConfig> {
    match path {
        Some(p) => ogcard::ServiceConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(ogcard::ServiceConfig::default()),
    }
}

fn apply_common(cfg: &mut ogcard::ServiceConfig, common: &CommonArgs) {
    cfg.fonts.files.extend(common.fonts.iter().cloned());
    cfg.fonts.system_fonts |= common.system_fonts;
    if common.no_fallback_avatar {
        cfg.avatar.missing_url = ogcard::MissingAvatarPolicy::NoAvatar;
    }
    if let Some(ms) = common.avatar_timeout_ms {
        cfg.avatar.timeout_ms = ms;
    }
}

fn card_params(card: &CardArgs) -> ogcard::RawParams {
    let mut params = ogcard::RawParams::new();
    let fields = [
        ("title", &card.title),
        ("description", &card.description),
        ("siteName", &card.site_name),
        ("social", &card.social),
        ("image", &card.image),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            params.insert(key, v.as_str());
        }
    }
    params
}

fn cmd_serve(
    mut cfg: ogcard::ServiceConfig,
    args: ServeArgs,
    runtime: &tokio::runtime::Runtime,
) -> anyhow::Result<()> {
    apply_common(&mut cfg, &args.common);
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }
    if let Some(secs) = args.cache_max_age_secs {
        cfg.cache_max_age_secs = secs;
    }
    let addr = cfg.bind_addr()?;

    let service =
        Arc::new(ogcard::OgImageService::from_config(&cfg).context("build image service")?);
    let server = ogcard::OgServer::bind(addr, service)?;
    server.run(runtime.handle().clone());
    Ok(())
}

async fn cmd_render(mut cfg: ogcard::ServiceConfig, args: RenderArgs) -> anyhow::Result<()> {
    apply_common(&mut cfg, &args.common);
    let service = ogcard::OgImageService::from_config(&cfg).context("build image service")?;

    let img = service.generate(&card_params(&args.card)).await?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &img.bytes)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{}, {} bytes)",
        args.out.display(),
        img.width,
        img.height,
        img.bytes.len()
    );
    Ok(())
}

async fn cmd_layout(mut cfg: ogcard::ServiceConfig, args: LayoutArgs) -> anyhow::Result<()> {
    apply_common(&mut cfg, &args.common);
    let content = ogcard::normalize(&card_params(&args.card));

    let avatar = if args.fetch {
        let resolver = ogcard::AvatarResolver::new(&cfg.avatar)?;
        if content.has_avatar_url() {
            resolver.resolve(&content.image_url).await
        } else {
            resolver.missing_url_avatar()
        }
    } else if content.has_avatar_url() {
        // Stand-in so the tree shows where the avatar would sit.
        ogcard::ResolvedAvatar::Embeddable(ogcard::fallback_icon())
    } else {
        match cfg.avatar.missing_url {
            ogcard::MissingAvatarPolicy::FallbackIcon => {
                ogcard::ResolvedAvatar::Embeddable(ogcard::fallback_icon())
            }
            ogcard::MissingAvatarPolicy::NoAvatar => ogcard::ResolvedAvatar::Absent,
        }
    };

    let tree = ogcard::compose(&content, &avatar);
    let json = serde_json::to_string_pretty(&tree).context("serialize layout tree")?;
    println!("{json}");
    Ok(())
}
