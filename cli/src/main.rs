mod cloudformation;
mod commands;
mod error;
mod logger;

use crate::commands::Commands;
use crate::error::Error;
use clap::Parser;

#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    name = "tagside",
    version,
    about = "CLI tool for synthesizing and deploying the tagside stacks",
    long_about = "Synthesizes CloudFormation templates for the server-side tagging stack and the analytics stack from a typed deployment context, and provisions them in dependency order."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    logger::Logger::init();

    // Match all commands here, in one place
    let result = match Cli::parse().command {
        Commands::Synth(cmd) => cmd.run(),
        Commands::Deploy(cmd) => cmd.run().await,
        Commands::Destroy(cmd) => cmd.run().await,
        Commands::Status(cmd) => cmd.run().await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(report) => {
            // Display, not Debug: the report is already user-facing text
            eprintln!("\n{}", Error::from(report));
            std::process::ExitCode::FAILURE
        }
    }
}
