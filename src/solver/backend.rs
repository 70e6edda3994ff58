//! External model counter invocation

use crate::formula::{write_dimacs, Cnf};
use log::debug;
use num_bigint::BigUint;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure modes of a single external counting call
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("counter did not finish within {0:?}")]
    Timeout(Duration),
    #[error("counter exited with {0}")]
    ProcessFailure(ExitStatus),
    #[error("counter output is not a count: {0:?}")]
    MalformedOutput(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A procedure that counts the models of a CNF within a time budget
///
/// The production implementation is [`SharpSatBackend`]; tests substitute
/// stubs to observe whether and how often counting is attempted.
pub trait CountBackend {
    fn count(&self, cnf: &Cnf, timeout: Duration) -> Result<BigUint, BackendError>;
}

impl<B: CountBackend + ?Sized> CountBackend for &B {
    fn count(&self, cnf: &Cnf, timeout: Duration) -> Result<BigUint, BackendError> {
        (*self).count(cnf, timeout)
    }
}

/// Runs a sharpSAT-compatible executable on a temporary DIMACS file
///
/// The counter's internal component caching and Boolean constraint
/// propagation are always disabled; the formula handed over has already been
/// preprocessed here. The time budget is passed down in whole seconds and
/// enforced from the outside as well: once it elapses the child is killed.
#[derive(Debug, Clone)]
pub struct SharpSatBackend {
    executable: PathBuf,
}

impl SharpSatBackend {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Default for SharpSatBackend {
    fn default() -> Self {
        Self::new("sharpSAT")
    }
}

impl CountBackend for SharpSatBackend {
    fn count(&self, cnf: &Cnf, timeout: Duration) -> Result<BigUint, BackendError> {
        // NamedTempFile removes the file when dropped, on every exit path
        let mut file = tempfile::Builder::new()
            .prefix("sharpsat-input")
            .suffix(".dimacs")
            .tempfile()?;
        write_dimacs(cnf, &mut file)?;
        file.flush()?;

        debug!(
            "Running {} on {} ({} variables, {} clauses)",
            self.executable.display(),
            file.path().display(),
            cnf.variable_count(),
            cnf.clause_count()
        );

        let mut child = Command::new(&self.executable)
            .arg("-noCC")
            .arg("-noIBCP")
            .arg("-t")
            .arg(timeout.as_secs().to_string())
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        match wait_with_timeout(&mut child, timeout)? {
            Some(status) if status.success() => {
                let mut output = String::new();
                if let Some(stdout) = child.stdout.as_mut() {
                    stdout.read_to_string(&mut output)?;
                }
                parse_count(&output)
            }
            Some(status) => Err(BackendError::ProcessFailure(status)),
            None => {
                // kill and reap; ignore races with a normal exit
                let _ = child.kill();
                let _ = child.wait();
                Err(BackendError::Timeout(timeout))
            }
        }
    }
}

/// The count is the first line of stdout, a non-negative decimal integer
fn parse_count(output: &str) -> Result<BigUint, BackendError> {
    let first_line = output.lines().next().unwrap_or("").trim();
    first_line
        .parse::<BigUint>()
        .map_err(|_| BackendError::MalformedOutput(first_line.to_string()))
}

/// Wait for a child process, giving up after `timeout`
///
/// Returns `None` if the child is still running when the budget elapses.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
