use std::process;
use clap::Parser;
use crate::args::*;
use crate::commands::{describe, inspect, resolve_threads, run};

mod args;
mod commands;


fn main() {
    env_logger::init();
    let args = Args::parse();
    let threads = resolve_threads(args.threads);
    let input = args.input.as_deref();
    let result = match &args.command {
        Commands::Run { no_progress, label } => {
            run(input, args.ranks, threads, !*no_progress, label).map(|(summary, _)| {
                println!("{} steps in {:.6} s", summary.steps, summary.elapsed);
            })
        }
        Commands::Inspect => {
            inspect(input, threads).map(|state| println!("{}", describe(&state)))
        }
    };
    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
