use crate::config::{Config, load_config};
use crate::convert::{Converted, convert};
use crate::handlers::builtin::default_registry;
use crate::ir::Resource;
use crate::layout_dump::write_layout_dump;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "cdr", version, about = "Cloud resource diagram layout in Rust")]
pub struct Args {
    /// Input file (JSON array of resources) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON5: theme, layout, handlers, blacklist)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// More logging; repeat for trace output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    let input = read_input(args.input.as_deref())?;
    let converted = convert_input(&input, &config)?;
    write_layout_dump(args.output.as_deref(), &converted)?;
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cloud_diagram_renderer={level}").into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Parses a resource list and converts it with the handlers `config`
/// describes.
pub fn convert_input(input: &str, config: &Config) -> Result<Converted> {
    let resources: Vec<Resource> =
        serde_json::from_str(input).context("input is not a JSON array of resources")?;
    if resources.is_empty() {
        return Err(anyhow::anyhow!("No resources found in input"));
    }
    let registry = default_registry(config)?;
    Ok(convert(resources, &registry, &config.theme, &config.layout)?)
}
