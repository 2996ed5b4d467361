use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use xudt_splitter_daemon::{run, Config};

#[derive(Parser)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = fs::read_to_string(&args.config).context("reading config file")?;
    let config: Config = toml::from_str(&config).context("parsing config file")?;

    run(config).await
}
