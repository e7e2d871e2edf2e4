mod app;
mod commands;
mod output;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted; no detector output was written.");
        std::process::exit(130);
    })
    .context("failed to install Ctrl+C handler")?;

    // JSON output keeps stderr quiet as well; RUST_LOG still overrides the filter.
    if !cli.global.json {
        init_logging(if cli.global.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }

    run(&cli)
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_module("dispatchscope", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Replay {
            path,
            output,
            accumulators,
            index,
        } => commands::replay::run(
            path,
            &commands::replay::ReplayOptions {
                output,
                accumulators,
                index: index.as_deref(),
                global: &cli.global,
            },
        ),
        Command::Compare {
            tool,
            debug,
            report,
        } => commands::compare::run(tool, debug, report.as_deref(), &cli.global),
        Command::Context {
            tool,
            listing,
            above,
            below,
        } => commands::context::run(tool, listing, *above, *below, &cli.global),
    }
}
