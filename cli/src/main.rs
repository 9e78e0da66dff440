use clap::{ArgAction, Parser, Subcommand};
use commands::{
    count::{run_count, CountArgs},
    extract::{run_extract, ExtractArgs},
};
use tracing::Level;

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    /// Print more log messages (repeat for even more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Extract(ExtractArgs),
    Count(CountArgs),
}

/// Log to stderr so records written to stdout are not mixed with messages
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Count(args) => run_count(args),
    }
}
