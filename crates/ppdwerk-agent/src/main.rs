// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ppdwerk-agent — answers PPD queries for a host process.
//
// Reads one JSON request per line on stdin and writes one JSON response per
// line on stdout. Logs go to stderr.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use ppdwerk_agent::{QueryFacade, handle_line};
use ppdwerk_core::AgentConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        cache = config.cache_enabled,
        capacity = config.cache_capacity,
        "ppdwerk agent starting"
    );

    let facade = QueryFacade::from_config(&config);
    if let Err(err) = serve(&facade, io::stdin().lock(), io::stdout().lock()) {
        tracing::error!(%err, "agent I/O failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("ppdwerk agent stopped");
    ExitCode::SUCCESS
}

fn serve(facade: &QueryFacade, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(facade, &line);
        writeln!(output, "{response}")?;
        output.flush()?;
    }
    Ok(())
}
