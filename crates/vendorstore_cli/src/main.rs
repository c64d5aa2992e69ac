//! vendorstore CLI entry point.
//!
//! Parses arguments, delegates to [`commands::run`], and prints one JSON
//! envelope. Exits with code 1 on failure.

mod args;
mod commands;

use clap::Parser;
use serde_json::json;

fn main() {
    let cli = args::Cli::parse();
    match commands::run(cli) {
        Ok(envelope) => println!("{envelope}"),
        Err(err) => {
            log::error!("event=cli_command module=cli status=error");
            eprintln!("{}", json!({ "error": err.to_json() }));
            std::process::exit(1);
        }
    }
}
