use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pixelart", version, about = "Turn images, GIFs and videos into pixel art")]
struct Cli {
    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one file.
    Convert(ConvertArgs),
    /// Print what ffprobe reports about a video, as JSON.
    Probe(ProbeArgs),
    /// Print the detected media kind of a file.
    Detect(DetectArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindChoice {
    Auto,
    Still,
    Animated,
    Video,
}

impl KindChoice {
    fn resolve(self) -> Option<pixelart::MediaKind> {
        match self {
            Self::Auto => None,
            Self::Still => Some(pixelart::MediaKind::Still),
            Self::Animated => Some(pixelart::MediaKind::Animated),
            Self::Video => Some(pixelart::MediaKind::Video),
        }
    }
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file.
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Output directory; the file is named `<stem>_pixelated.<ext>`.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Force a pipeline instead of detecting it.
    #[arg(long, value_enum, default_value_t = KindChoice::Auto)]
    kind: KindChoice,

    /// Block edge length in source pixels.
    #[arg(long)]
    pixel_size: Option<u32>,

    /// Palette size per frame (0 keeps the downsampled colours).
    #[arg(long)]
    colors: Option<u32>,

    /// Integer output scale.
    #[arg(long)]
    upscale: Option<u32>,

    /// k-means seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Video constant rate factor.
    #[arg(long)]
    crf: Option<u8>,

    /// Fail instead of replacing an existing video output.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// JSON pipeline config; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct DetectArgs {
    /// Input file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.cmd {
        Command::Convert(args) => cmd_convert(args),
        Command::Probe(args) => cmd_probe(args),
        Command::Detect(args) => cmd_detect(args),
    }
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => pixelart::PipelineConfig::load(path)?,
        None => pixelart::PipelineConfig::default(),
    };
    if let Some(v) = args.pixel_size {
        cfg.params.pixel_size = v;
    }
    if let Some(v) = args.colors {
        cfg.params.n_colors = v;
    }
    if let Some(v) = args.upscale {
        cfg.params.upscale_factor = v;
    }
    if let Some(v) = args.seed {
        cfg.params.cluster.seed = v;
    }
    if args.crf.is_some() {
        cfg.video.crf = args.crf;
    }
    if args.no_overwrite {
        cfg.video.overwrite = false;
    }
    if let Some(dir) = &args.out_dir {
        cfg.output_dir = Some(dir.clone());
    }
    cfg.validate()?;

    let out_path = match args.out {
        Some(out) => out,
        None => cfg
            .layout()
            .unwrap_or_else(|| pixelart::OutputLayout::new(parent_or_cwd(&args.in_path)))
            .output_path_for(&args.in_path)?,
    };

    let report = pixelart::convert(
        &args.in_path,
        &out_path,
        args.kind.resolve(),
        &cfg.params,
        &cfg.video,
    )?;
    println!(
        "{}",
        serde_json::to_string(&report).context("serialize report")?
    );
    eprintln!("wrote {}", out_path.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let info = pixelart::probe_video(&args.in_path)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&info).context("serialize probe result")?
    );
    Ok(())
}

fn cmd_detect(args: DetectArgs) -> anyhow::Result<()> {
    let kind = pixelart::MediaKind::detect(&args.in_path)
        .with_context(|| format!("detect '{}'", args.in_path.display()))?;
    println!("{kind}");
    Ok(())
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
