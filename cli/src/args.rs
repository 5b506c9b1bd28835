use std::path::PathBuf;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// path to input file, read from stdin when absent
    #[arg(short = 'i', long, global = true)]
    pub input: Option<PathBuf>,
    /// number of ranks sharing the force evaluation
    #[arg(short = 'n', long, default_value_t = 1, global = true)]
    pub ranks: usize,
    /// force threads per rank, overrides LJMD_NUM_THREADS
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// run simulation and write energy and trajectory logs
    Run {
        /// don't show progress bar
        #[arg(long)]
        no_progress: bool,
        /// species label in trajectory file
        #[arg(long, default_value = "Ar")]
        label: String,
    },
    /// print observables of initial configuration and total momentum
    Inspect,
}
