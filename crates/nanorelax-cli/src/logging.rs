use crate::error::Result;
use std::fs::File;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{
    Layer,
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
    registry::LookupSpan,
};

/// Prefix shared by the library and the binary.
const CRATE_TARGET: &str = "nanorelax";
/// Emits one DEBUG event per simulation step.
const SIMULATOR_TARGET: &str = "nanorelax::engine::simulator";

fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Console policy. Step traces stay off the terminal below `-vvv`, so `-vv`
/// shows clustering and workflow detail without one line per step.
fn console_targets(verbosity: u8, quiet: bool) -> Targets {
    let level = console_level(verbosity, quiet);
    let simulator = if verbosity >= 3 {
        level
    } else {
        level.min(LevelFilter::INFO)
    };
    Targets::new()
        .with_default(level)
        .with_target(SIMULATOR_TARGET, simulator)
}

/// Log file policy. The file always keeps the full step history, independent
/// of `-q`.
fn file_targets(verbosity: u8) -> Targets {
    let level = if verbosity >= 3 {
        LevelFilter::TRACE
    } else {
        LevelFilter::DEBUG
    };
    Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target(CRATE_TARGET, level)
}

fn file_layer<S>(file: File, verbosity: u8) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_filter(file_targets(verbosity))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console_targets(verbosity, quiet));

    let file_layer = match log_file {
        Some(path) => Some(file_layer(File::create(&path)?, verbosity)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
