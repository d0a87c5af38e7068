use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use sha2::Digest as _;

use quotereel::{
    BackdropStyle, FontSet, FrameRenderer, OutputLayout, PipelineConfig, RendererFactory,
    SlideRendererFactory, SlideStyle,
};

#[derive(Parser, Debug)]
#[command(name = "quotereel", version)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every quote and encode the slideshow (requires `ffmpeg`).
    Render(RenderArgs),
    /// Render a single slide as a PNG.
    Frame(FrameArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StyleChoice {
    Gradient,
    Photo,
}

#[derive(clap::Args, Debug)]
struct StyleArgs {
    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Slide style.
    #[arg(long, value_enum)]
    style: Option<StyleChoice>,

    /// Background image for the photo style (PNG, JPEG, or SVG).
    #[arg(long)]
    background: Option<PathBuf>,

    /// Font file for the quote text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Font file for the attribution.
    #[arg(long)]
    italic_font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input quotes JSON (`[{"quote": ..., "author": ...}]`).
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    style: StyleArgs,

    /// Output root; frames go to `<dir>/screenshots`, the video to `<dir>/rumi_quotes.mp4`.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Seconds each slide stays on screen.
    #[arg(long)]
    seconds_per_slide: Option<f64>,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// ffmpeg video encoder.
    #[arg(long)]
    codec: Option<String>,

    /// Output pixel format.
    #[arg(long)]
    pixel_format: Option<String>,

    /// Encoder preset.
    #[arg(long)]
    preset: Option<String>,

    /// Constant rate factor.
    #[arg(long)]
    crf: Option<u8>,

    /// Render slides in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Leave `quote_NNN` files from earlier runs in place.
    #[arg(long, default_value_t = false)]
    keep_stale_frames: bool,

    /// ffmpeg executable.
    #[arg(long, env = "QUOTEREEL_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// Kill ffmpeg after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input quotes JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    style: StyleArgs,

    /// Record index (0-based).
    #[arg(long, default_value_t = 0)]
    index: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Print diagnostics about font resolution (family name + SHA-256 of font bytes).
    #[arg(long)]
    dump_fonts: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("quotereel=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quotereel=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config (if any) and apply the shared style flags.
///
/// Returns the config and the directory relative background paths resolve against.
fn base_config(args: &StyleArgs) -> anyhow::Result<(PipelineConfig, PathBuf)> {
    let cwd = std::env::current_dir().context("resolve working directory")?;
    let (mut cfg, assets_root) = match &args.config {
        Some(path) => {
            let cfg = PipelineConfig::from_path(path)?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| cwd.join(p))
                .unwrap_or_else(|| cwd.clone());
            (cfg, root)
        }
        None => (PipelineConfig::default(), cwd.clone()),
    };

    apply_style(
        &mut cfg.style,
        args.style,
        args.background.as_ref().map(|p| cwd.join(p)),
    )?;
    if let Some(font) = &args.font {
        cfg.fonts.regular = Some(font.clone());
    }
    if let Some(font) = &args.italic_font {
        cfg.fonts.italic = Some(font.clone());
    }
    Ok((cfg, assets_root))
}

fn apply_style(
    style: &mut SlideStyle,
    choice: Option<StyleChoice>,
    background: Option<PathBuf>,
) -> anyhow::Result<()> {
    let panel = style.backdrop.panel().cloned().unwrap_or_default();
    match (choice, background) {
        (Some(StyleChoice::Gradient), bg) => {
            if bg.is_some() {
                tracing::warn!("--background is ignored with --style gradient");
            }
            if style.backdrop.kind_name() != "gradient" {
                style.backdrop = BackdropStyle::default();
            }
        }
        (Some(StyleChoice::Photo) | None, Some(source)) => {
            style.backdrop = BackdropStyle::Photo { source, panel };
        }
        (Some(StyleChoice::Photo), None) => {
            if style.backdrop.kind_name() != "photo" {
                anyhow::bail!("--style photo needs --background (or a photo backdrop in --config)");
            }
        }
        (None, None) => {}
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (mut cfg, assets_root) = base_config(&args.style)?;

    if let Some(dir) = args.out_dir {
        cfg.layout = OutputLayout::under(dir);
    }
    if let Some(v) = args.seconds_per_slide {
        cfg.encoding.seconds_per_slide = v;
    }
    if let Some(v) = args.fps {
        cfg.encoding.output_fps = v;
    }
    if let Some(v) = args.codec {
        cfg.encoding.codec = v;
    }
    if let Some(v) = args.pixel_format {
        cfg.encoding.pixel_format = v;
    }
    if let Some(v) = args.preset {
        cfg.encoding.preset = v;
    }
    if let Some(v) = args.crf {
        cfg.encoding.crf = v;
    }
    if args.parallel {
        cfg.threading.parallel = true;
    }
    if args.threads.is_some() {
        cfg.threading.threads = args.threads;
    }
    if args.keep_stale_frames {
        cfg.clear_stale_frames = false;
    }
    if let Some(bin) = args.ffmpeg {
        cfg.ffmpeg.binary = bin;
    }
    if args.timeout_secs.is_some() {
        cfg.ffmpeg.timeout_secs = args.timeout_secs;
    }

    let records = quotereel::load_quotes(&args.in_path)?;
    let report = quotereel::render_video(cfg, &records, &assets_root)?;

    eprintln!(
        "wrote {} ({} slides, {:.1}s)",
        report.video.output_path.display(),
        report.video.frames,
        report.video.expected_duration_secs
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (cfg, assets_root) = base_config(&args.style)?;
    cfg.validate()?;

    let records = quotereel::load_quotes(&args.in_path)?;
    let record = records.get(args.index).with_context(|| {
        format!(
            "record index {} is out of range ({} records)",
            args.index,
            records.len()
        )
    })?;

    let factory =
        SlideRendererFactory::prepare(cfg.canvas, &cfg.style, &cfg.fonts, &assets_root)?;
    if args.dump_fonts {
        dump_font_diagnostics(factory.fonts());
    }

    let mut renderer = factory.create()?;
    let frame = renderer.render(args.index, record)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_opaque_rgba8([0, 0, 0]),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn dump_font_diagnostics(fonts: &FontSet) {
    eprintln!("font diagnostics:");
    let faces = [("quote", Some(&fonts.regular)), ("author", fonts.italic.as_ref())];
    for (role, face) in faces {
        let Some(face) = face else {
            eprintln!("  {role}: (regular face)");
            continue;
        };
        eprintln!("  {role}:");
        eprintln!("    source:  {}", face.origin);
        eprintln!("    family:  {}", face.family);
        eprintln!("    sha256:  {}", sha256_hex(&face.bytes));
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
