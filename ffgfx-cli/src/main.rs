// CLI application
use anyhow::Context;
use clap::Parser;
use ffgfx_core::{BackendConfig, GsTarget, PvrTarget, TargetKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

mod scene;

use scene::{RunSummary, SceneOptions};

#[derive(Parser)]
#[command(name = "ffgfx")]
#[command(about = "Drive the fixed-function backend headless and report what it sends")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Render a synthetic scene into a recording device
    Run {
        /// Backend configuration (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured target
        #[arg(short, long, value_parser = parse_target)]
        target: Option<TargetKind>,

        /// Number of frames to render
        #[arg(short, long, default_value = "60")]
        frames: u64,

        /// Quads drawn per frame
        #[arg(short, long, default_value = "200")]
        quads: usize,

        /// Draw textured quads
        #[arg(long)]
        textured: bool,

        /// Enable alpha blending
        #[arg(long)]
        blend: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "ffgfx.json")]
        output: PathBuf,
    },
}

fn parse_target(s: &str) -> Result<TargetKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "gs" => Ok(TargetKind::Gs),
        "pvr" => Ok(TargetKind::Pvr),
        other => Err(format!("unknown target '{}' (expected gs or pvr)", other)),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            target,
            frames,
            quads,
            textured,
            blend,
            json,
        } => {
            let mut config = match config {
                Some(path) => BackendConfig::load(&path)?,
                None => BackendConfig::default(),
            };
            if let Some(target) = target {
                config.target = target;
            }
            // Headless: nothing to wait for.
            config.vsync = false;

            let options = SceneOptions {
                frames,
                quads,
                textured,
                blend,
            };
            let pb = create_progress_bar(frames);
            let summary = match config.target {
                TargetKind::Gs => scene::run_with(GsTarget::new(), config, options, &pb)?,
                TargetKind::Pvr => {
                    let target = PvrTarget::new(config.width, config.height);
                    scene::run_with(target, config, options, &pb)?
                }
            };
            pb.finish_with_message("Scene complete");
            print_summary(&summary, json)?;
        }
        Commands::InitConfig { output } => {
            BackendConfig::default()
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("Target:          {}", summary.target);
    println!("Frames:          {}", summary.frames);
    println!("Batches:         {}", summary.batches);
    println!("Triangles:       {}", summary.triangles);
    println!("Culled:          {}", summary.culled);
    println!("Forced flushes:  {}", summary.forced_flushes);
    println!("Texture uploads: {}", summary.texture_uploads);
    println!("Chains:          {}", summary.chains);
    println!("Bytes sent:      {}", summary.bytes_sent);
    if summary.hazards > 0 {
        log::warn!("{} chains were sent before the previous transfer finished", summary.hazards);
    }
    Ok(())
}

fn create_progress_bar(frames: u64) -> ProgressBar {
    let pb = ProgressBar::new(frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}
