//! Brushmask command line entry point.

mod args;
mod commands;
mod error;
mod image_io;

use clap::Parser;

fn main() {
    env_logger::init();
    let cli = args::Cli::parse();
    log::debug!("Running {:?}", cli.command);

    if let Err(err) = commands::run(cli) {
        log::error!("{}", err);
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
