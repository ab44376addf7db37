mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Decode {
            model,
            input,
            beam_size,
            nbest,
            max_len,
            json,
        } => commands::decode(&model, &input, beam_size, nbest, max_len, json),
        Commands::Score {
            model,
            input,
            targets,
        } => commands::score(&model, &input, &targets),
    }
}
