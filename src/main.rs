//! pagetest - run external-interpreter tests from the command line

use clap::Parser;
use pagetest::{cli, commands, common::logging};
use commands::Commands;

#[derive(Parser)]
#[command(name = "pagetest", about = "Run interpreter-backed page tests")]
#[command(version, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.debug);

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
