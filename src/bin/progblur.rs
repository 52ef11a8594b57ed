use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use progressive_blur::{
    BlurDocument, BlurEdge, BlurMapMode, Curve, EdgeBlur, GradientBlurSpec, ImageSource,
    ProgramOpts, ProgressiveBlur, RasterSize, StrengthSource, StrengthTexture, TintColor,
    generate_strength_map, precache_program,
};

#[derive(Parser, Debug)]
#[command(name = "progblur", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a progressive blur to an image.
    Apply(ApplyArgs),
    /// Export the strength map a spec produces as a grayscale PNG.
    Map(MapArgs),
}

#[derive(Args, Debug)]
struct EdgeArgs {
    /// Anchor edge (top, bottom, left, right). Overrides the document's strength spec.
    #[arg(long)]
    edge: Option<BlurEdge>,

    /// Ramp start fraction.
    #[arg(long, default_value_t = 0.5)]
    start: f32,

    /// Ramp end fraction.
    #[arg(long, default_value_t = 1.0)]
    end: f32,

    /// Generated stop count (clamped into 2..=64).
    #[arg(long, default_value_t = 2)]
    samples: u32,

    /// Ramp curve (linear, ease-in, ease-out, ease-in-out, ...).
    #[arg(long, default_value = "linear")]
    curve: Curve,

    /// Make the ramp weakest at the anchor edge.
    #[arg(long, default_value_t = false)]
    weak_at_edge: bool,
}

impl EdgeArgs {
    fn spec(&self) -> Option<GradientBlurSpec> {
        let edge = self.edge?;
        Some(
            EdgeBlur::new(edge, self.start)
                .with_end(self.end)
                .with_samples(self.samples)
                .with_curve(self.curve)
                .with_strong_at_edge(!self.weak_at_edge)
                .build(),
        )
    }
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Blur document JSON (`{"config": {...}, "strength": {...}}`).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    edge: EdgeArgs,

    /// Grayscale strength map image; takes precedence over any spec.
    #[arg(long)]
    strength_map: Option<PathBuf>,

    /// Override the base sigma.
    #[arg(long)]
    sigma: Option<f32>,

    /// Override the capture density.
    #[arg(long)]
    scale: Option<f32>,

    /// Override the tint (`#rrggbb` or `#rrggbbaa`).
    #[arg(long)]
    tint: Option<String>,

    /// Override the map mode (blend, modulate).
    #[arg(long)]
    mode: Option<BlurMapMode>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct MapArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Map edge length in pixels; defaults to the document's `blur_texture_dimensions`.
    #[arg(long)]
    size: Option<u32>,

    /// Blur document JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    edge: EdgeArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Map(args) => cmd_map(args),
    }
}

fn load_document(path: Option<&Path>) -> anyhow::Result<BlurDocument> {
    match path {
        Some(p) => BlurDocument::from_path(p)
            .with_context(|| format!("load blur document '{}'", p.display())),
        None => Ok(BlurDocument::default()),
    }
}

fn resolve_spec(doc: &BlurDocument, edge: &EdgeArgs) -> GradientBlurSpec {
    edge.spec()
        .or_else(|| doc.strength.as_ref().map(|s| s.to_gradient()))
        .unwrap_or_else(|| EdgeBlur::new(BlurEdge::Bottom, 0.5).build())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let mut doc = load_document(args.config.as_deref())?;
    if let Some(sigma) = args.sigma {
        doc.config.sigma = sigma;
    }
    if let Some(scale) = args.scale {
        doc.config.device_pixel_scale = scale;
    }
    if let Some(tint) = &args.tint {
        doc.config.tint_color = TintColor::from_hex(tint)?;
    }
    if let Some(mode) = args.mode {
        doc.config.map_mode = mode;
    }

    let strength = match &args.strength_map {
        Some(p) => {
            let luma = image::open(p)
                .with_context(|| format!("read strength map '{}'", p.display()))?
                .to_luma8();
            StrengthSource::from(StrengthTexture::from_luma_image(&luma)?)
        }
        None => StrengthSource::Gradient(resolve_spec(&doc, &args.edge)),
    };

    let program = precache_program(ProgramOpts::default().with_threads(args.threads))?;
    let mut source = ImageSource::from_path(&args.in_path)
        .with_context(|| format!("read input '{}'", args.in_path.display()))?;
    let logical = source.size();

    let mut blur = ProgressiveBlur::with_program(doc.config, strength, program)?;
    let frame = blur.render_frame(&mut source, logical)?;

    ensure_parent(&args.out)?;
    frame
        .to_rgba_image()?
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_map(args: MapArgs) -> anyhow::Result<()> {
    let doc = load_document(args.config.as_deref())?;
    let size = match args.size {
        Some(n) => RasterSize::square(n)?,
        None => doc.config.strength_map_size()?,
    };
    let spec = resolve_spec(&doc, &args.edge);
    let texture = generate_strength_map(&spec, size);

    ensure_parent(&args.out)?;
    texture
        .to_luma_image()?
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
