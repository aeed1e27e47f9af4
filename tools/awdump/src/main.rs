mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{info::InfoArgs, split::SplitArgs, tags::TagsArgs};

#[derive(Parser)]
#[command(name = "awdump", about = "Inspect AWD manifest and record files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the raw tag stream of a record file
    Tags(TagsArgs),
    /// Split a manifest into per-region files
    Split(SplitArgs),
    /// Print manifest header, identity, and table summary
    Info(InfoArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Tags(args) => args.run(),
        Commands::Split(args) => args.run(),
        Commands::Info(args) => args.run(),
    }
}
