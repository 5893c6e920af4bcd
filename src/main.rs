use std::process::ExitCode;

use clap::Parser;

use mangamark::cli;
use mangamark::logger;

fn main() -> ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let args = cli::CliArgs::parse();
    cli::run(args)
}
