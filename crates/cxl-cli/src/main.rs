//! cxl CLI
//!
//! Runs a cxl program from a file, or from standard input when no path is
//! given. A terminal gets an interactive prompt.

mod editor;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use colored::Colorize;
use cxl_core::{CharSource, ReaderFeed, Session, SessionError, SessionOptions, Source, SourceError};
use miette::Report;

use editor::EditorFeed;

/// The session runs on its own thread with this much stack, so recursion in
/// user programs is bounded by the session's limits rather than the host.
const SESSION_STACK_SIZE: usize = 64 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "cxl")]
#[command(author, version, about = "An interactive language for complex-number arithmetic", long_about = None)]
struct Cli {
    /// Program file to run (reads standard input when omitted)
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let spawned = thread::Builder::new()
        .name("session".into())
        .stack_size(SESSION_STACK_SIZE)
        .spawn(move || run(cli.path, SessionOptions::default()));
    let handle = match spawned {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{} Failed to start session: {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match handle.join() {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(error)) => {
            let code = match error {
                SessionError::Source(SourceError::Open { .. }) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            };
            eprintln!("{} {:?}", "error:".red().bold(), Report::new(error));
            code
        }
        Err(_) => {
            eprintln!("{} Session ended abnormally", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(path: Option<PathBuf>, options: SessionOptions) -> Result<(), SessionError> {
    match path {
        Some(path) => {
            let feed = ReaderFeed::open(&path)?;
            interpret(CharSource::new(feed), io::stdout(), options)
        }
        None if io::stdin().is_terminal() => {
            let feed = EditorFeed::new().map_err(SourceError::Read)?;
            interpret(CharSource::new(feed), io::stdout(), options)
        }
        None => {
            let feed = ReaderFeed::new(io::stdin().lock());
            interpret(CharSource::new(feed), io::stdout(), options)
        }
    }
}

fn interpret(
    source: impl Source,
    out: impl Write,
    options: SessionOptions,
) -> Result<(), SessionError> {
    Session::with_options(source, out, options).run()
}
