use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use ironplc_il::cli::{self, RunOptions};
use ironplc_il::logger;
use ironplc_il::scan::{ScanConfig, DEFAULT_MAX_STEPS_PER_SCAN};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "ironplcil", about = "IronPLC Instruction List interpreter")]
struct Args {
    /// Turn on verbose logging. Repeat to increase verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Sets the logging to write to a file.
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Selects the subcommand.
    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand, Debug)]
enum Action {
    /// Loads and executes an Instruction List program file.
    Run {
        /// Path to the program file.
        file: PathBuf,

        /// Run N scans then stop (default: continuous until Ctrl+C).
        #[arg(long)]
        scans: Option<u64>,

        /// Delay in milliseconds before each scan.
        #[arg(long, default_value_t = 250)]
        period_ms: u64,

        /// Abandon a scan after this many executed lines (0: no limit).
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS_PER_SCAN)]
        max_steps: u32,

        /// Sets a memory cell before the first scan, for example 40001=8.
        /// May be repeated.
        #[arg(long = "set", value_parser = cli::parse_assignment)]
        initial: Vec<(u16, u16)>,

        /// Write the memory image to the specified file after execution.
        #[arg(long)]
        dump_memory: Option<PathBuf>,
    },
    /// Prints the encoded form of each line of a program file.
    Encode {
        /// Path to the program file.
        file: PathBuf,
    },
    /// Prints the version number of the interpreter.
    Version,
}

pub fn main() -> Result<(), String> {
    let args = Args::parse();

    logger::configure(args.verbose, args.log_file)?;

    match args.action {
        Action::Run {
            file,
            scans,
            period_ms,
            max_steps,
            initial,
            dump_memory,
        } => {
            let options = RunOptions {
                scans,
                config: ScanConfig {
                    period: Duration::from_millis(period_ms),
                    max_steps_per_scan: max_steps,
                },
                initial,
                dump_memory,
            };
            cli::run(&file, &options)
        }
        Action::Encode { file } => cli::encode(&file),
        Action::Version => {
            println!("ironplcil version {VERSION}");
            Ok(())
        }
    }
}
