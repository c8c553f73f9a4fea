use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glitchcam", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a single PNG through the active transform.
    Frame(FrameArgs),
    /// Run the synthetic source through the pipeline for N frames.
    Sequence(SequenceArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input PNG path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Pipeline config JSON (mode + per-mode parameters).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Elapsed-time value fed to the displacement synthesizer, seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Output directory for numbered PNG frames.
    #[arg(long)]
    out_dir: PathBuf,

    /// Pipeline config JSON (mode + per-mode parameters).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 60)]
    frames: u64,

    /// Source frame size as WxH.
    #[arg(long, default_value = "640x480")]
    size: String,

    /// Simulated frame rate, used both for elapsed time and tick cadence.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Reshuffle-tick period in frames (regions mode).
    #[arg(long, default_value_t = 30)]
    reshuffle_every: u64,

    /// Band-cycle-tick period in frames (vertical-bands mode).
    #[arg(long, default_value_t = 90)]
    cycle_every: u64,

    /// Also save a still at the final frame.
    #[arg(long)]
    still: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sequence(args) => cmd_sequence(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<glitchcam::PipelineConfig> {
    let Some(path) = path else {
        return Ok(glitchcam::PipelineConfig::default());
    };
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let config: glitchcam::PipelineConfig =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse config JSON")?;
    Ok(config)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = read_config(args.config.as_deref())?;
    let coord = glitchcam::Coordinator::new(config)?;

    let img = image::open(&args.in_path)
        .with_context(|| format!("open input '{}'", args.in_path.display()))?
        .to_rgba8();
    let frame = glitchcam::Frame::from_rgba8(img.width(), img.height(), img.into_raw())?;

    let out = coord.process_frame(&frame, args.time)?;
    let png = image::RgbaImage::from_raw(out.width(), out.height(), out.into_rgba8())
        .context("output buffer mismatch")?;
    png.save(&args.out)
        .with_context(|| format!("write output '{}'", args.out.display()))?;
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    let (width, height) = parse_size(&args.size)?;
    let config = read_config(args.config.as_deref())?;
    let coord = glitchcam::Coordinator::new(config)?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let mut source = glitchcam::SyntheticSource::new(width, height);
    let mut sink = glitchcam::PngSink::new(&args.out_dir, true);

    let fps = args.fps.max(1);
    for i in 0..args.frames {
        let elapsed = i as f64 / f64::from(fps);
        if args.reshuffle_every > 0 && i > 0 && i % args.reshuffle_every == 0 {
            coord.reshuffle_tick();
        }
        if args.cycle_every > 0 && i > 0 && i % args.cycle_every == 0 {
            coord.band_cycle_tick();
        }
        coord.pump(&mut source, &mut sink, elapsed)?;
    }

    if args.still {
        coord.capture_still(&mut sink)?;
    }
    tracing::info!(frames = sink.presented(), "sequence rendered");
    Ok(())
}

fn parse_size(s: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("size '{s}' must look like 640x480"))?;
    Ok((
        w.trim().parse().with_context(|| format!("bad width in '{s}'"))?,
        h.trim().parse().with_context(|| format!("bad height in '{s}'"))?,
    ))
}
