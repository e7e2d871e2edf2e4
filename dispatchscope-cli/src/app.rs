use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dispatchscope - interpreter bytecode-load detection from instruction traces
#[derive(Debug, Parser)]
#[command(name = "dispatchscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a recorded instruction trace through the detector and write confirmed reads.
    Replay {
        /// Path to the JSON-lines trace file.
        #[arg(value_name = "TRACE")]
        path: PathBuf,

        /// Output file for confirmed reads.
        #[arg(short, long, default_value = dispatchscope::DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Accumulator register an OR must target (repeatable, e.g. r13d).
        #[arg(long = "accumulator", value_name = "REG")]
        accumulators: Vec<String>,

        /// Index register the accumulator's low byte is moved into (e.g. edx).
        #[arg(long, value_name = "REG")]
        index: Option<String>,
    },

    /// Compare detector output against a ground-truth log from a debug interpreter build.
    Compare {
        /// Detector output file.
        #[arg(value_name = "TOOL_OUTPUT")]
        tool: PathBuf,

        /// Ground-truth file (address in the second column).
        #[arg(value_name = "DEBUG_OUTPUT")]
        debug: PathBuf,

        /// Also write the textual report to this file.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Show disassembly listing context around each confirmed instruction offset.
    Context {
        /// Detector output file.
        #[arg(value_name = "TOOL_OUTPUT")]
        tool: PathBuf,

        /// Disassembly listing of the monitored image (objdump style).
        #[arg(value_name = "LISTING")]
        listing: PathBuf,

        /// Lines to show before each match.
        #[arg(long, default_value_t = 5)]
        above: usize,

        /// Lines to show after each match.
        #[arg(long, default_value_t = 10)]
        below: usize,
    },
}
