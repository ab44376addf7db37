use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "las-decode")]
#[command(about = "Listen-Attend-Spell decoding from encoder outputs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Beam-search one utterance and print the n-best transcripts
    Decode {
        #[command(flatten)]
        model: ModelArgs,

        /// JSON matrix of encoder outputs, one row per timestep
        #[arg(short, long)]
        input: PathBuf,

        /// Beam width (defaults to LAS_BEAM_SIZE or 1)
        #[arg(short, long)]
        beam_size: Option<usize>,

        /// Number of hypotheses to print (defaults to LAS_NBEST or 1)
        #[arg(short, long)]
        nbest: Option<usize>,

        /// Maximum decode steps; 0 uses the number of encoder frames
        #[arg(long)]
        max_len: Option<usize>,

        /// Emit JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },

    /// Teacher-forced cross-entropy of reference transcripts
    Score {
        #[command(flatten)]
        model: ModelArgs,

        /// JSON array of encoder output matrices, one per utterance
        #[arg(short, long)]
        input: PathBuf,

        /// JSON array of reference transcripts, aligned with the inputs
        #[arg(short, long)]
        targets: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Decoder weights (JSON)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Dictionary with one `<symbol> <id>` entry per line
    #[arg(short, long)]
    pub dict: PathBuf,
}
