use crate::models::{BatchSummary, JobResult};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

struct ReporterState<O, E> {
    completed: usize,
    succeeded: usize,
    out: O,
    err: E,
}

/// Collects job results as they complete and prints progress lines.
///
/// Counters live behind one mutex, so the final summary is written exactly
/// once no matter which order the jobs finish in.
pub struct ProgressReporter<O: Write, E: Write> {
    total: usize,
    output_dir: String,
    state: Mutex<ReporterState<O, E>>,
}

impl ProgressReporter<io::Stdout, io::Stderr> {
    pub fn stdio(total: usize, output_dir: impl Into<String>) -> Self {
        Self::new(total, output_dir, io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ProgressReporter<O, E> {
    pub fn new(total: usize, output_dir: impl Into<String>, out: O, err: E) -> Self {
        ProgressReporter {
            total,
            output_dir: output_dir.into(),
            state: Mutex::new(ReporterState {
                completed: 0,
                succeeded: 0,
                out,
                err,
            }),
        }
    }

    /// Records one finished job. Returns `true` for the job that completed the batch.
    pub fn record(&self, result: JobResult) -> io::Result<bool> {
        debug!(
            index = result.index,
            filename = %result.filename,
            success = result.is_success(),
            "Job finished"
        );
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.completed == self.total {
            return Ok(false);
        }
        state.completed += 1;
        let completed = state.completed;

        match result.outcome {
            Ok(()) => {
                state.succeeded += 1;
                writeln!(state.out, "{}/{}", completed, self.total)?;
            }
            Err(err) => writeln!(state.err, "{err}")?,
        }

        if completed < self.total {
            return Ok(false);
        }

        let succeeded = state.succeeded;
        writeln!(
            state.out,
            "Done! Completed {}/{} successfully.",
            succeeded, self.total
        )?;
        writeln!(state.out, "Card images are located in {}", self.output_dir)?;
        state.out.flush()?;
        Ok(true)
    }

    pub fn summary(&self) -> BatchSummary {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        BatchSummary {
            total: self.total,
            succeeded: state.succeeded,
        }
    }

    /// Hands back the writers, mainly so tests can inspect the output.
    pub fn into_writers(self) -> (O, E) {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (state.out, state.err)
    }
}
