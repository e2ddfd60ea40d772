//! Runs a program in scan cycles.
//!
//! A scan executes the program line by line from line 0 until the line
//! counter leaves the program, either by running past the last line or
//! by a RET with no caller. The driver repeats scans on a fixed period
//! until it is asked to stop. A stop request is only observed between
//! scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::instruction::Instruction;
use crate::interpreter::Interpreter;
use crate::memory::Memory;
use crate::program::Program;

/// Default delay before each scan.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(250);

/// Default limit on the lines executed in a single scan.
pub const DEFAULT_MAX_STEPS_PER_SCAN: u32 = 10_000;

/// Scan timing and limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    /// Delay before each scan in [`ScanDriver::run`].
    pub period: Duration,
    /// Number of lines a scan may execute before it is abandoned. Zero
    /// disables the limit.
    pub max_steps_per_scan: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            period: DEFAULT_PERIOD,
            max_steps_per_scan: DEFAULT_MAX_STEPS_PER_SCAN,
        }
    }
}

/// A cloneable handle for requesting the driver to stop.
/// Used by signal handlers to stop the driver from another context.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests the driver to stop after the current scan.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// How a scan ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The line counter left the program.
    Completed { steps: u32 },
    /// The scan executed `max_steps_per_scan` lines without leaving the
    /// program and was abandoned.
    WatchdogExpired { steps: u32 },
}

/// Drives an [`Interpreter`] over a program.
pub struct ScanDriver<M: Memory> {
    interpreter: Interpreter<M>,
    // Encoded program. `None` is an empty line.
    code: Vec<Option<(Instruction, u16)>>,
    config: ScanConfig,
    current_line: u16,
    scan_count: u64,
    watchdog_count: u64,
    stop_flag: Arc<AtomicBool>,
}

impl<M: Memory> ScanDriver<M> {
    /// Encodes `program` and binds a new interpreter to `memory`.
    pub fn new(program: &Program, memory: M, config: ScanConfig) -> Self {
        let code = program
            .lines()
            .iter()
            .map(|line| (!line.is_empty()).then(|| (line.instruction(), line.operand)))
            .collect();
        ScanDriver {
            interpreter: Interpreter::new(memory),
            code,
            config,
            current_line: 0,
            scan_count: 0,
            watchdog_count: 0,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Executes the current line and returns the next one.
    ///
    /// Empty lines only advance the line counter. When the current line is
    /// outside the program nothing is executed.
    pub fn step(&mut self) -> u16 {
        let Some(&entry) = self.code.get(self.current_line as usize) else {
            return self.current_line;
        };
        self.current_line = match entry {
            Some((instruction, operand)) => {
                self.interpreter
                    .execute(instruction, operand, self.current_line)
            }
            None => self.current_line.wrapping_add(1),
        };
        self.current_line
    }

    /// Executes from the current line to the end of the program, then
    /// rewinds to line 0 for the next scan. Groups discarded by an
    /// evaluation stack overflow stop being skipped when the scan ends.
    pub fn run_to_end(&mut self) -> ScanOutcome {
        let max_steps = self.config.max_steps_per_scan;
        let mut steps = 0u32;
        let mut outcome = None;

        while self.in_program() {
            if max_steps > 0 && steps >= max_steps {
                warn!(
                    "Scan {} abandoned at line {} after {steps} steps",
                    self.scan_count + 1,
                    self.current_line
                );
                self.watchdog_count += 1;
                outcome = Some(ScanOutcome::WatchdogExpired { steps });
                break;
            }
            self.step();
            steps += 1;
        }

        self.interpreter.end_scan();
        self.current_line = 0;
        self.scan_count += 1;
        debug!(
            "Scan {} finished after {steps} steps, accumulator {}",
            self.scan_count,
            self.interpreter.accumulator()
        );
        outcome.unwrap_or(ScanOutcome::Completed { steps })
    }

    /// Runs scans on the configured period.
    ///
    /// When `scans` is `Some(n)`, runs at most `n` scans. When `scans` is
    /// `None`, runs until a stop is requested. Returns the number of scans
    /// run by this call.
    pub fn run(&mut self, scans: Option<u64>) -> u64 {
        info!(
            "Starting scan loop: {} lines, period {:?}",
            self.code.len(),
            self.config.period
        );
        let mut rounds = 0u64;
        loop {
            if self.stop_requested() {
                break;
            }
            if let Some(max) = scans {
                if rounds >= max {
                    break;
                }
            }
            if !self.config.period.is_zero() {
                thread::sleep(self.config.period);
            }
            self.run_to_end();
            rounds += 1;
        }
        info!("Scan loop stopped after {rounds} scans");
        rounds
    }

    /// Rewinds to line 0 and resets the interpreter. Memory is kept.
    pub fn restart(&mut self) {
        self.current_line = 0;
        self.interpreter.reset();
    }

    fn in_program(&self) -> bool {
        (self.current_line as usize) < self.code.len()
    }

    pub fn current_line(&self) -> u16 {
        self.current_line
    }

    /// Returns the number of finished scans, including abandoned ones.
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// Returns the number of scans abandoned by the step limit.
    pub fn watchdog_count(&self) -> u64 {
        self.watchdog_count
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Interpreter<M> {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter<M> {
        &mut self.interpreter
    }

    pub fn into_interpreter(self) -> Interpreter<M> {
        self.interpreter
    }

    /// Returns a cloneable handle that can request the driver to stop.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: self.stop_flag.clone(),
        }
    }

    /// Returns true if a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Requests the driver to stop after the current scan.
    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}
