use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use kindledash::{
    ChromiumRenderer, Clock as _, DEFAULT_BROWSER, DEFAULT_CAPTURE_SLOTS, PageRenderer, Pipeline,
    PipelinePaths, RendererFactory, Stage, SystemClock, TextRenderer, run_stage,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kindledash", version, about = "Web pages to a rotating slideshow image")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Directory holding `image_cache/`, `current_image/` and `current_config/`.
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    /// Override the artifact cache directory.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Override the current image path.
    #[arg(long, global = true)]
    current_image: Option<PathBuf>,

    /// Override the configuration file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

impl PathArgs {
    fn resolve(&self) -> PipelinePaths {
        let mut paths = PipelinePaths::from_base(&self.base_dir);
        if let Some(p) = &self.cache_dir {
            paths.cache_dir = p.clone();
        }
        if let Some(p) = &self.current_image {
            paths.current_image = p.clone();
        }
        if let Some(p) = &self.config {
            paths.config_file = p.clone();
        }
        paths
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every stage until the process is killed.
    Run(RunArgs),
    /// Run one capture slot.
    Capture(CaptureArgs),
    /// Run the overlay processor.
    Overlay(OverlayArgs),
    /// Run the rotator.
    Rotate(StageArgs),
    /// Run the cache collector.
    Collect(StageArgs),
    /// Run the health monitor.
    Monitor(StageArgs),
    /// Print the effective configuration as JSON.
    ShowConfig,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Headless browser binary used for captures.
    #[arg(long, default_value = DEFAULT_BROWSER)]
    browser: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Number of capture slots (one per leading slide in config order).
    #[arg(long, default_value_t = DEFAULT_CAPTURE_SLOTS)]
    capture_slots: usize,

    #[command(flatten)]
    render: RenderArgs,

    /// Extra directory with `.ttf`/`.otf` fonts for the stamp.
    #[arg(long)]
    font_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Config slot (0-based slide index) to capture.
    #[arg(long, default_value_t = 0)]
    slot: usize,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct StageArgs {
    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,
}

#[derive(Args, Debug)]
struct OverlayArgs {
    #[command(flatten)]
    stage: StageArgs,

    /// Extra directory with `.ttf`/`.otf` fonts for the stamp.
    #[arg(long)]
    font_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = cli.paths.resolve();
    match cli.cmd {
        Command::Run(args) => cmd_run(paths, args),
        Command::Capture(args) => {
            let pipeline = make_pipeline(paths, &args.render, TextRenderer::without_fonts())?;
            drive(pipeline.capture_worker(args.slot), args.once)
        }
        Command::Overlay(args) => {
            let text = TextRenderer::new(args.font_dir.as_deref());
            let pipeline = stage_pipeline(paths, text)?;
            drive(pipeline.overlay(), args.stage.once)
        }
        Command::Rotate(args) => {
            let pipeline = stage_pipeline(paths, TextRenderer::without_fonts())?;
            drive(pipeline.rotator(), args.once)
        }
        Command::Collect(args) => {
            let pipeline = stage_pipeline(paths, TextRenderer::without_fonts())?;
            if args.once {
                let report = pipeline.collector().sweep(SystemClock.now());
                eprintln!(
                    "deleted {} file(s), {} failure(s)",
                    report.deleted.len(),
                    report.failed.len()
                );
                return Ok(());
            }
            drive(pipeline.collector(), false)
        }
        Command::Monitor(args) => {
            let pipeline = stage_pipeline(paths, TextRenderer::without_fonts())?;
            if args.once {
                let report = pipeline.health().check(SystemClock.now());
                if report.is_healthy() {
                    println!("ok");
                }
                for warning in &report.warnings {
                    println!("warning: {warning}");
                }
                return Ok(());
            }
            drive(pipeline.health(), false)
        }
        Command::ShowConfig => {
            let cfg = paths.config().try_load().with_context(|| {
                format!("load config '{}'", paths.config_file.display())
            })?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

fn cmd_run(paths: PipelinePaths, args: RunArgs) -> anyhow::Result<()> {
    let text = TextRenderer::new(args.font_dir.as_deref());
    let pipeline = make_pipeline(paths, &args.render, text)?.with_capture_slots(args.capture_slots);
    let handles = pipeline.spawn(Arc::new(SystemClock))?;
    for handle in handles {
        if handle.join().is_err() {
            anyhow::bail!("a stage thread panicked");
        }
    }
    Ok(())
}

fn make_pipeline(
    paths: PipelinePaths,
    render: &RenderArgs,
    text: TextRenderer,
) -> anyhow::Result<Pipeline> {
    paths.ensure_dirs()?;
    let browser = ChromiumRenderer::new(&render.browser);
    if !browser.is_on_path() {
        tracing::warn!(browser = %render.browser.display(), "browser not found, captures will fail until it is installed");
    }
    let renderers: RendererFactory =
        Arc::new(move |_slot| Box::new(browser.clone()) as Box<dyn PageRenderer>);
    Ok(Pipeline::new(paths, renderers, text))
}

// Only capture slots call the renderer and only overlay draws text, so stages that do neither
// get the default browser and an empty font database.
fn stage_pipeline(paths: PipelinePaths, text: TextRenderer) -> anyhow::Result<Pipeline> {
    paths.ensure_dirs()?;
    let renderers: RendererFactory =
        Arc::new(|_slot| Box::new(ChromiumRenderer::default()) as Box<dyn PageRenderer>);
    Ok(Pipeline::new(paths, renderers, text))
}

fn drive(mut stage: impl Stage, once: bool) -> anyhow::Result<()> {
    if once {
        stage.tick(SystemClock.now());
        return Ok(());
    }
    run_stage(&mut stage, &SystemClock);
    Ok(())
}
