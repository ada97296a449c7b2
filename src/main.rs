use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bnf_parser::{dedup, extract_drugs, output, parser, walker, Settings};

#[derive(Parser)]
#[command(name = "bnf_parser", about = "Extract drug records from a BNF HTML snapshot")]
struct Cli {
    /// Maximum number of drugs to parse
    #[arg(short, long, global = true)]
    max: Option<usize>,
    /// Root directory of the HTML documents
    #[arg(long, global = true)]
    htmldir: Option<PathBuf>,
    /// Number of worker threads (1 runs sequentially)
    #[arg(short, long, global = true)]
    processes: Option<usize>,
    /// Print debugging information
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the files we think are drugs
    Drugfiles,
    /// Extract the drug catalog
    Drugdict {
        /// Newline-separated list of files to parse instead of walking the corpus
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Begin at this offset in --file
        #[arg(short, long, requires = "file")]
        offset: Option<usize>,
        /// Write bnf.json, subsections.json and review.json here instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
        /// Omit source file paths from the written records
        #[arg(long)]
        strip_provenance: bool,
    },
    /// Given a list of files, detect duplicates and remove them
    Dupdetect {
        /// Newline-separated list of files to inspect
        file: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let t0 = Instant::now();
    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(dir) = cli.htmldir {
        settings.html_dir = dir;
    }
    if cli.max.is_some() {
        settings.max_drugs = cli.max;
    }
    if cli.processes.is_some() {
        settings.workers = cli.processes;
    }
    let settings = settings;
    info!(settings = ?settings, "Starting BNF parser");

    match cli.command {
        Commands::Drugfiles => {
            let paths = corpus(&settings)?;
            for path in parser::drug_files(&paths) {
                println!("{}", path.display());
            }
        }
        Commands::Drugdict {
            file,
            offset,
            out,
            strip_provenance,
        } => {
            let paths = match file {
                Some(f) => read_path_list(&f, offset.unwrap_or(0))?,
                None => corpus(&settings)?,
            };
            let pb = progress_bar(paths.len() as u64)?;
            let agg = extract_drugs(paths, &settings, &pb)?;
            pb.finish_and_clear();

            match out {
                Some(dir) => output::write_artifacts(&dir, &agg, strip_provenance)?,
                None if strip_provenance => {
                    println!("{}", serde_json::to_string_pretty(&agg.drugs.without_sources())?)
                }
                None => println!("{}", serde_json::to_string_pretty(&agg.drugs)?),
            }
        }
        Commands::Dupdetect { file } => {
            let paths = read_path_list(&file, 0)?;
            let thinned = dedup::filter_duplicates(&paths);
            info!("Kept {} of {} files", thinned.len(), paths.len());
            for path in thinned {
                println!("{}", path.display());
            }
        }
    }

    info!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

/// Every candidate document under the configured root, sorted so runs are
/// reproducible.
fn corpus(settings: &Settings) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = walker::walk(&settings.html_dir, settings)?.collect();
    paths.sort();
    info!("Found {} documents under {}", paths.len(), settings.html_dir.display());
    Ok(paths)
}

fn read_path_list(file: &Path, offset: usize) -> Result<Vec<PathBuf>> {
    let list = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file list {:?}", file))?;
    Ok(list
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .skip(offset)
        .map(PathBuf::from)
        .collect())
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
