use std::{path::PathBuf, process::ExitCode};

use clap::{CommandFactory, Parser, Subcommand};
use cli::{
    handlers::{handle_describe, handle_dry_run},
    logger,
    request_file::RequestSource,
};
use console::Style;

#[derive(Parser)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the problem descriptors a request assembles to
    Describe {
        /// JSON request file
        request_path: Option<PathBuf>,
        /// Request given inline as JSON
        #[arg(long, conflicts_with = "request_path")]
        json: Option<String>,
    },
    /// Launch a request on the host backend
    DryRun {
        /// JSON request file
        request_path: Option<PathBuf>,
        /// Request given inline as JSON
        #[arg(long, conflicts_with = "request_path")]
        json: Option<String>,
        /// Device capacity in bytes
        #[arg(long)]
        memory_limit: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(logger::level_for_verbosity(cli.verbose));

    let result = match cli.command {
        Some(Commands::Describe {
            request_path,
            json,
        }) => RequestSource::from_args(request_path, json).and_then(|source| handle_describe(&source)),
        Some(Commands::DryRun {
            request_path,
            json,
            memory_limit,
        }) => RequestSource::from_args(request_path, json).and_then(|source| handle_dry_run(&source, memory_limit)),
        None => {
            let mut cmd = Cli::command();
            let _ = cmd.print_help();
            return ExitCode::SUCCESS;
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error}", Style::new().red().bold().apply_to("error:"));
            ExitCode::FAILURE
        },
    }
}
