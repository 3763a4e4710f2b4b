//! Prints the best test accuracy of each run in an index range.
//!
//! ```text
//! final_test_accuracy_lottery <root_dir> <sub_path> <lo_index> <hi_index>
//! ```

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;
use lottery_analysis::{best_test_accuracies, format_accuracies};
use lottery_core::{Platform, Result};

/// Best logged test accuracy per run.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing one subdirectory per run.
    root_dir: PathBuf,
    /// Path inside each run directory that holds the logger file.
    sub_path: PathBuf,
    /// First run (inclusive), by position in name order with numbers
    /// compared by value (`run_2` before `run_10`).
    lo_index: usize,
    /// Last run (inclusive).
    hi_index: usize,
}

fn run(args: &Args) -> Result<Vec<f64>> {
    let platform = Platform::from_env()?;
    best_test_accuracies(&platform, &args.root_dir, &args.sub_path, args.lo_index, args.hi_index)
}

fn main() {
    let _ = env_logger::builder().try_init();
    let args = Args::parse();

    match run(&args) {
        Ok(accuracies) => println!("{}", format_accuracies(&accuracies)),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
