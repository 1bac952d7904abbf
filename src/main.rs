use clap::Parser;
use gcodethumb::{Config, convert_file};
use std::{io, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

/// Rewrite a PrusaSlicer thumbnail as Marlin jpg/thumbnail blocks.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// G-code file to convert. Rewritten in place unless --output is given.
    path: PathBuf,
    /// Write the converted G-code here instead.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Layer height for the header. Defaults to $SLIC3R_LAYER_HEIGHT.
    #[arg(long)]
    layer_height: Option<f64>,
    /// JPG quality of the re-encoded thumbnail.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,
    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

pub fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if !args.path.is_file() {
        eprintln!("File Not Found: {}", args.path.display());
        return ExitCode::FAILURE;
    }

    let mut config = match args.layer_height {
        Some(layer_height) => Config {
            layer_height,
            ..Config::default()
        },
        None => match Config::from_env() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };
    if let Some(quality) = args.quality {
        config.quality = quality;
    }

    let output = args.output.as_ref().unwrap_or(&args.path);
    println!("{} -> {}", args.path.display(), output.display());
    if let Err(e) = convert_file(&args.path, output, &config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    println!("Conversion Complete");
    ExitCode::SUCCESS
}
