//! lintgate binary entrypoint.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lintgate::config::Cli;
use lintgate::eslint::EslintRunner;
use lintgate::{actions, workflow};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("lintgate=debug,scm=debug,info")
    } else {
        EnvFilter::new("lintgate=info,scm=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            actions::fail(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let runner = EslintRunner::new(&config.workspace, config.extensions.clone());

    match workflow::run(&config, &runner).await {
        Ok(outcome) if outcome.conclusion.is_failure() => {
            actions::fail(&outcome.summary);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            actions::fail(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
