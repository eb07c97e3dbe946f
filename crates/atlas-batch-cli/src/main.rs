use std::path::PathBuf;

use anyhow::Context;
use atlas_batch_core::prelude::*;
use atlas_batch_engine::AtlasEngine;
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "atlas-batch",
    about = "Pack every folder of a project into texture atlases",
    version,
    author
)]
struct Cli {
    /// Project descriptor (JSON)
    #[arg(long, help_heading = "Input/Output")]
    project: PathBuf,
    /// Output directory (overrides the descriptor's outputDir)
    #[arg(short, long, help_heading = "Input/Output")]
    output: Option<PathBuf>,
    /// Plan and log the jobs without writing anything
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    dry_run: bool,

    /// Print the resolved project and planned jobs, then exit
    #[arg(long, default_value_t = false, help_heading = "Config")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Config")]
    print_config_format: String,

    /// Show a progress bar over jobs (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

#[derive(Serialize)]
struct PrintedConfig<'a> {
    project: &'a Project,
    jobs: &'a [PackJob],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    run(&cli, cli.progress && !cli.quiet)
}

fn run(cli: &Cli, show_progress: bool) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("read current directory")?;
    let project = Project::load(&cli.project, &cwd, cli.output.as_deref())
        .with_context(|| format!("load project {}", cli.project.display()))?;

    let engine = AtlasEngine::new();
    let mut runner = Runner::new(&FsTree, &engine, &project).dry_run(cli.dry_run);
    let jobs = runner.plan().with_context(|| {
        format!("plan jobs for {}", project.input_root.display())
    })?;

    if cli.print_config {
        let printed = PrintedConfig {
            project: &project,
            jobs: &jobs,
        };
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&printed)?),
            _ => println!("{}", serde_json::to_string_pretty(&printed)?),
        }
        return Ok(());
    }

    let bar = if show_progress {
        let b = ProgressBar::new(jobs.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} packing {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };

    let mut report = BatchReport::default();
    for job in &jobs {
        if let Some(b) = &bar {
            b.set_message(job.folder().display().to_string());
        }
        let outcome = runner.execute(job);
        report.record(&outcome);
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }

    info!(summary = %report.summary(), "done");
    if report.has_failures() {
        for folder in &report.failed {
            error!(folder = %folder.display(), "job failed");
        }
        anyhow::bail!("{} of {} jobs failed", report.failed.len(), report.jobs);
    }
    Ok(())
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
