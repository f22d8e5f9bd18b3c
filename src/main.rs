use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sharescribe::Config;

mod demo;

#[derive(Parser, Debug)]
#[command(name = "sharescribe")]
#[command(
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SHARESCRIBE_GIT_HASH"), ")"),
    about = "Annotated screen-share compositor with seamless uplink handoff"
)]
struct Cli {
    /// Config file to use instead of ~/.config/sharescribe/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an annotated share against a synthetic capture and a logging uplink
    Demo(demo::DemoArgs),

    /// Print the effective configuration as TOML
    PrintConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Demo(args) => demo::run(args, config),
        Command::PrintConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
