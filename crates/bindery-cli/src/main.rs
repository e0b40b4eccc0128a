// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bindery: margin-aware converter from UTF-8 text to PDF or PostScript.
//
// Entry point. Initialises logging, layers rc-file and command-line settings,
// and converts every input file.

mod cli;

use std::io::Write;
use std::process::ExitCode;

use bindery_core::Settings;
use bindery_core::error::{BinderyError, Result};
use bindery_layout::ConvertJob;
use clap::Parser;
use tracing::{debug, info};

use cli::Cli;

fn main() -> ExitCode {
    // Logs go to stderr; stdout may carry the document (`-o -`, PostScript).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report(&err, &mut std::io::stderr().lock())),
    }
}

/// Print a fatal error once and pick the exit status.
fn report(err: &BinderyError, out: &mut impl Write) -> u8 {
    // Nothing left to report to if stderr itself is gone.
    let _ = writeln!(out, "bindery: {err}");
    err.exit_code() as u8
}

fn run(cli: &Cli) -> Result<()> {
    let rc = match &cli.rc_file {
        Some(path) => Some(Settings::load_rc_file(path)?.ok_or_else(|| BinderyError::Read {
            path: path.clone(),
            source: std::io::ErrorKind::NotFound.into(),
        })?),
        None => match Settings::default_rc_path() {
            Some(path) => Settings::load_rc_file(path)?,
            None => None,
        },
    };
    let settings = rc.unwrap_or_default().merge(cli.settings());
    let config = settings.resolve()?;
    debug!(?config, "resolved configuration");

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let job = ConvertJob::new(config)?;
    let written = job.run(&cli.files, cli.output.as_deref())?;
    info!(outputs = written.len(), "done");
    Ok(())
}
