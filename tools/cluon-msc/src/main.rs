// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! cluon-msc - Message specification compiler
//!
//! Reads an `.odvd` message specification and prints a summary, a proto2
//! schema or a normalised listing of it.

use anyhow::{Context, Result};
use clap::Parser;
use cluon::odvd::render_specification;
use cluon::{MessageParser, MetaMessage, MetaMessageToProtoTransformator};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Compile ODVD message specifications
#[derive(Parser, Debug)]
#[command(name = "cluon-msc")]
#[command(version)]
#[command(about = "Transform an ODVD message specification into other formats")]
struct Args {
    /// Message specification file (.odvd)
    input: PathBuf,

    /// Generate a proto2 schema
    #[arg(long, conflicts_with = "odvd")]
    proto: bool,

    /// Print the normalised message specification
    #[arg(long)]
    odvd: bool,

    /// Write to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("cluon=debug,cluon_msc=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[cluon-msc] {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("Could not find '{}'", args.input.display()))?;

    let messages = MessageParser::new()
        .parse_result(&input)
        .with_context(|| format!("Failed to parse '{}'", args.input.display()))?;
    tracing::debug!(count = messages.len(), "parsed message specification");

    let content = if args.proto {
        let mut transformator =
            MetaMessageToProtoTransformator::new().context("Failed to load proto template")?;
        transformator
            .render_all(&messages)
            .context("Failed to render proto schema")?
    } else if args.odvd {
        render_specification(&messages)
    } else {
        summary(&messages)
    };

    match &args.out {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write '{}'", path.display()))?,
        None => print!("{}", content),
    }
    Ok(())
}

/// One line per message: identifier, long name and field count.
fn summary(messages: &[MetaMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            format!(
                "{:>6}  {} ({} fields)\n",
                m.message_identifier,
                m.long_name(),
                m.fields().len()
            )
        })
        .collect()
}
