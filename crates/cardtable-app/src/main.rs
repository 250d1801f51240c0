//! Main application entry point.

use cardtable_app::Cli;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Cardtable");

    match cardtable_app::run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("cardtable: {e}");
            ExitCode::FAILURE
        }
    }
}
