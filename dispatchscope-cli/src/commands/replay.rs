use std::path::Path;

use anyhow::Context;
use dispatchscope::{session::TraceSession, trace::TraceFile};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{build_config, file_display_name},
    output::{emit, print_counts},
};

pub struct ReplayOptions<'a> {
    pub output: &'a Path,
    pub accumulators: &'a [String],
    pub index: Option<&'a str>,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
struct ReplaySummary {
    trace: String,
    output: String,
    accumulators: Vec<String>,
    index: String,
    image: Option<String>,
    complete: bool,
    instructions: u64,
    out_of_bounds: u64,
    loads: u64,
    clobbers: u64,
    ors: u64,
    offset_uses: u64,
    confirmed: usize,
}

pub fn run(path: &Path, opts: &ReplayOptions<'_>) -> anyhow::Result<()> {
    let config = build_config(opts.output, opts.accumulators, opts.index)?;
    let accumulators: Vec<String> = config
        .accumulators
        .iter()
        .map(|r| r.name().to_string())
        .collect();
    let index = config.index.name().to_string();

    let trace = TraceFile::open(path)
        .with_context(|| format!("failed to open trace: {}", path.display()))?;
    let mut session = TraceSession::new(config)?;

    let complete = dispatchscope::trace::replay(trace.data(), &mut session)
        .with_context(|| format!("failed to replay trace: {}", path.display()))?;

    let stats = session.stats();
    let image = session
        .bounds()
        .map(|b| format!("{:#x}-{:#x}", b.low, b.high));
    let confirmed = session
        .finalize_to_file()
        .with_context(|| format!("failed to write {}", opts.output.display()))?;

    let summary = ReplaySummary {
        trace: file_display_name(path),
        output: opts.output.display().to_string(),
        accumulators,
        index,
        image,
        complete,
        instructions: stats.instructions,
        out_of_bounds: stats.out_of_bounds,
        loads: stats.loads,
        clobbers: stats.clobbers,
        ors: stats.ors,
        offset_uses: stats.offset_uses,
        confirmed,
    };

    emit(&summary, opts.global, |s| {
        println!("Trace:        {}", s.trace);
        println!("Output:       {}", s.output);
        println!("Accumulators: {}", s.accumulators.join(", "));
        println!("Index:        {}", s.index);
        match &s.image {
            Some(image) => println!("Image:        {image}"),
            None => println!("Image:        (never loaded)"),
        }
        if !s.complete {
            println!("Note:         trace ended without a fini record");
        }

        println!("\nEvents:");
        print_counts(&[
            ("instructions", s.instructions),
            ("out of bounds", s.out_of_bounds),
            ("loads", s.loads),
            ("clobbers", s.clobbers),
            ("ors", s.ors),
            ("offset uses", s.offset_uses),
        ]);

        println!("\nConfirmed bytecode reads: {}", s.confirmed);
    })
}
