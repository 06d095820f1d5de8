//! badlist CLI
//!
//! `badlist dump` downloads the configured blacklist feeds and writes the
//! serialized collection to a file or stdout.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use badlist::BadList;

/// CLI utility for badlist
#[derive(Parser, Debug)]
#[command(name = "badlist")]
#[command(about = "Download blacklist feeds and serialize them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download sources and output serialized data
    #[command(alias = "d")]
    Dump {
        /// Output file name, '-' means stdout
        #[arg(short, long, env = "BADLIST_OUTPUT", default_value = "-")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "badlist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Dump { output } => dump(&output).await,
    }
}

async fn dump(output: &str) -> Result<()> {
    let man = BadList::new();

    tracing::info!("downloading blacklist feeds");
    man.download_configured()
        .await
        .context("Failed to download blacklists")?;

    let mut out: Box<dyn Write + Send> = if output == "-" {
        Box::new(std::io::stdout())
    } else {
        let fd = File::create(output)
            .with_context(|| format!("Failed to create output file: {output}"))?;
        Box::new(fd)
    };

    man.dump(&mut *out)
        .await
        .context("Failed to serialize blacklists")?;
    out.flush()?;

    Ok(())
}
