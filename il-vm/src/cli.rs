//! Implements the command line behavior.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::address;
use crate::memory::{Memory, MemoryImage};
use crate::program::{Program, DEFAULT_PROGRAM_LINES};
use crate::scan::{ScanConfig, ScanDriver};

/// Options for [`run`].
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// When `Some(n)`, runs exactly `n` scans. When `None`, runs
    /// continuously until Ctrl+C.
    pub scans: Option<u64>,
    pub config: ScanConfig,
    /// `(address, value)` pairs written to memory before the first scan.
    pub initial: Vec<(u16, u16)>,
    /// When set, the memory image is written to this file after stopping.
    pub dump_memory: Option<PathBuf>,
}

/// Parses an `ADDRESS=VALUE` memory assignment.
pub fn parse_assignment(text: &str) -> Result<(u16, u16), String> {
    let (address, value) = text
        .split_once('=')
        .ok_or_else(|| format!("Expected ADDRESS=VALUE but found '{text}'"))?;
    let address: u16 = address
        .trim()
        .parse()
        .map_err(|e| format!("Invalid address '{address}': {e}"))?;
    if address::decode(address).is_none() {
        return Err(format!("Address {address:05} is not a memory cell"));
    }
    let value: u16 = value
        .trim()
        .parse()
        .map_err(|e| format!("Invalid value '{value}': {e}"))?;
    Ok((address, value))
}

/// Loads a program file and runs it in scans.
pub fn run(path: &Path, options: &RunOptions) -> Result<(), String> {
    let program = load_program(path)?;

    let mut driver = ScanDriver::new(&program, MemoryImage::new(), options.config.clone());
    for &(address, value) in &options.initial {
        driver
            .interpreter_mut()
            .memory_mut()
            .set(address, value, false);
    }

    // Install signal handler for clean shutdown
    let handle = driver.stop_handle();
    ctrlc::set_handler(move || handle.request_stop())
        .map_err(|e| format!("Failed to set signal handler: {e}"))?;

    driver.run(options.scans);
    info!(
        "Stopped after {} scans ({} abandoned)",
        driver.scan_count(),
        driver.watchdog_count()
    );

    println!("accumulator: {}", driver.interpreter().accumulator());

    if let Some(dump_path) = &options.dump_memory {
        dump_memory(driver.interpreter().memory(), dump_path)?;
    }

    Ok(())
}

/// Prints each line of a program file with its encoded instruction.
pub fn encode(path: &Path) -> Result<(), String> {
    let program = load_program(path)?;
    for (number, line) in program.lines().iter().enumerate() {
        if line.is_empty() {
            println!("{number}:");
            continue;
        }
        let instruction = line.instruction();
        println!(
            "{number}: {instruction} {} (0x{:04X})",
            line.operand,
            instruction.bits()
        );
    }
    Ok(())
}

/// Reads a program file. Programs shorter than a standard program sheet
/// are padded with empty lines.
fn load_program(path: &Path) -> Result<Program, String> {
    let mut file =
        File::open(path).map_err(|e| format!("Unable to open {}: {}", path.display(), e))?;
    let mut program = Program::read_from(&mut file)
        .map_err(|e| format!("Unable to read program {}: {e}", path.display()))?;
    program.pad_to(DEFAULT_PROGRAM_LINES);
    Ok(program)
}

fn dump_memory(memory: &MemoryImage, dump_path: &Path) -> Result<(), String> {
    let mut out = File::create(dump_path)
        .map_err(|e| format!("Unable to create dump file {}: {e}", dump_path.display()))?;
    for (address, value) in memory.cells() {
        writeln!(out, "{address:05}: {value}")
            .map_err(|e| format!("Unable to write dump file: {e}"))?;
    }
    Ok(())
}
