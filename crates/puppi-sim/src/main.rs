use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    config::{self, ConfigArgs},
    demo::{self, DemoArgs},
    weigh::{self, WeighArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "puppi-sim", about = "PUPPI pileup weighting driver")]
struct Cli {
    /// Log verbosity (trace, debug, info, warn, error); `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Weigh every event of a JSON event file.
    Weigh(WeighArgs),
    /// Weigh one seeded synthetic event and print a summary.
    Demo(DemoArgs),
    /// Print the default configuration as YAML.
    Config(ConfigArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Weigh(args) => weigh::run(&args),
        Command::Demo(args) => demo::run(&args),
        Command::Config(args) => config::run(&args),
    }
}
