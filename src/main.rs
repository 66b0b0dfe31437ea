#![forbid(unsafe_code)]

//! attractor-view: churn/complexity hotspot CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("attractor-view: {e}");
        std::process::exit(e.exit_code());
    }
}
