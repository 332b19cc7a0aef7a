mod commands;

use clap::{Parser, Subcommand};

use commands::config::ConfigArgs;
use commands::process::ProcessArgs;
use commands::record::RecordArgs;

#[derive(Parser)]
#[command(
    name = "memomaker",
    about = "Generate transcripts and memos from audio recordings",
    version
)]
struct Cli {
    /// Enable verbose diagnostic output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process an existing audio file into a transcript and a memo
    Process(ProcessArgs),
    /// Record from the microphone, then process the recording
    Record(RecordArgs),
    /// Show or update saved configuration
    Config(ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    memomaker_core::set_verbose(cli.verbose);

    match cli.command {
        Command::Process(args) => commands::process::run(args),
        Command::Record(args) => commands::record::run(args),
        Command::Config(args) => commands::config::run(args),
    }
}
