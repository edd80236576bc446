//! Skillport CLI binary.
//!
//! Provides command-line interface for skill-portability estimation.

mod integration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::settings::{ConfigOverrides, render_config, resolve_config};
use integration::tracing_setup::init_tracing;
use skillport::Pipeline;
use skillport::data::{InputPaths, InputTables};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "skillport")]
#[command(about = "Skillport: occupation skill portability from worker mobility", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate skill portability and write the output tables
    Run {
        /// Directory holding the input CSVs under their default names
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Switching matrix CSV (overrides the data directory)
        #[arg(long)]
        switching: Option<PathBuf>,

        /// Stayer counts CSV (overrides the data directory)
        #[arg(long)]
        stayers: Option<PathBuf>,

        /// Skill matrix CSV (overrides the data directory)
        #[arg(long)]
        skills: Option<PathBuf>,

        /// Employment CSV (overrides the data directory)
        #[arg(long)]
        employment: Option<PathBuf>,

        /// Occupation titles CSV (overrides the data directory)
        #[arg(long)]
        titles: Option<PathBuf>,

        /// Directory for output tables and run metadata
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rows shown per ranking in the printed summary
        #[arg(long, default_value = "10")]
        top: usize,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file to merge over the defaults
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

/// Input file locations from the CLI flags.
struct InputArgs {
    data_dir: PathBuf,
    switching: Option<PathBuf>,
    stayers: Option<PathBuf>,
    skills: Option<PathBuf>,
    employment: Option<PathBuf>,
    titles: Option<PathBuf>,
}

impl InputArgs {
    fn into_paths(self) -> InputPaths {
        let mut paths = InputPaths::from_dir(&self.data_dir);
        if let Some(path) = self.switching {
            paths.switching = path;
        }
        if let Some(path) = self.stayers {
            paths.stayers = path;
        }
        if let Some(path) = self.skills {
            paths.skills = path;
        }
        if let Some(path) = self.employment {
            paths.employment = path;
        }
        if self.titles.is_some() {
            paths.titles = self.titles;
        }
        paths
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Run {
            data_dir,
            switching,
            stayers,
            skills,
            employment,
            titles,
            output_dir,
            config,
            top,
            overrides,
        } => {
            let inputs = InputArgs {
                data_dir,
                switching,
                stayers,
                skills,
                employment,
                titles,
            };
            run_pipeline(inputs.into_paths(), &output_dir, config.as_deref(), &overrides, top)?;
        }
        Commands::Config { config, overrides } => {
            let config = resolve_config(config.as_deref(), &overrides)?;
            print!("{}", render_config(&config)?);
        }
    }

    Ok(())
}

fn run_pipeline(
    paths: InputPaths,
    output_dir: &Path,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
    top: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(config_path, overrides)?;
    tracing::info!(
        trees = config.forest.n_trees,
        seed = config.forest.seed,
        cv_folds = config.cv_folds,
        "starting skill portability estimation"
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("loading input tables");
    let inputs = InputTables::load(&paths)?;

    let pipeline = Pipeline::new(config)?;
    let run = pipeline.run_with(&inputs, |stage| pb.set_message(stage.to_string()))?;

    pb.set_message("writing outputs");
    let files = run.write_outputs(output_dir)?;
    pb.finish_and_clear();

    println!("{}", run.summary(top));

    for warning in run.warnings() {
        println!("Warning: {warning}");
    }

    println!("\nOutputs:");
    for path in [&files.pairwise, &files.aggregate, &files.importances, &files.metadata] {
        println!("  {}", path.display());
    }

    Ok(())
}
