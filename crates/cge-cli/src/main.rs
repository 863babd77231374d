//! `cge` — parse CGE schema text from stdin into a framed binary message
//! stream on stdout.
//!
//! Diagnostics travel inside the message stream; stderr carries only
//! operational failures (unreadable input, unwritable output).

use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cge_parser::Config;
use cge_wire::WireSender;

#[derive(Parser, Debug)]
#[command(name = "cge")]
#[command(about = "Parse CGE schema definitions into a binary message stream")]
struct Cli {
    /// Include doc comments in emitted objects and properties
    #[arg(long = "comments")]
    comments: bool,

    /// Stop parsing after sending the metadata message
    #[arg(long = "only-meta")]
    only_meta: bool,

    /// Forward every scanned token
    #[arg(long = "tokens")]
    tokens: bool,

    /// Do not send parsed objects
    #[arg(long = "no-objects")]
    no_objects: bool,

    /// Suppress warning diagnostics
    #[arg(long = "no-warn")]
    no_warn: bool,
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let mut sender = WireSender::new(io::BufWriter::new(stdout));

    cge_parser::parse(
        stdin,
        &mut sender,
        Config {
            include_comments: cli.comments,
            only_metadata: cli.only_meta,
            send_tokens: cli.tokens,
            no_objects: cli.no_objects,
            disable_warnings: cli.no_warn,
        },
    )
    .context("parsing failed")?;

    sender.flush().context("flushing output failed")?;
    Ok(())
}

fn main() {
    // Stdout carries the binary message stream; all logging goes to
    // stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
