use crate::errors::{CardError, RenderError};
use crate::models::{BatchSummary, CardSpec, JobResult, OutputTarget};
use crate::progress::ProgressReporter;
use crate::renderer::CardRenderer;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Shared cancellation flag with an optional deadline for the whole batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that cancels itself once `budget` has elapsed.
    pub fn with_deadline(budget: Duration) -> Self {
        CancelToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + budget),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub jobs: usize,
    pub cancel: CancelToken,
}

/// Renders every card on a pool of `options.jobs` workers and records each
/// result as it completes. Returns once all cards have been attempted.
pub fn run_batch<R, O, E>(
    cards: &[CardSpec],
    renderer: &R,
    target: &OutputTarget,
    options: &BatchOptions,
    reporter: &ProgressReporter<O, E>,
) -> Result<BatchSummary, CardError>
where
    R: CardRenderer,
    O: Write + Send,
    E: Write + Send,
{
    let total = cards.len();
    let pool = ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .thread_name(|i| format!("card-worker-{i}"))
        .build()?;

    info!(
        cards = total,
        jobs = options.jobs,
        output = %target.directory().display(),
        "Starting batch"
    );
    let started_at = Instant::now();

    pool.install(|| {
        cards.par_iter().enumerate().for_each(|(i, card)| {
            let index = i + 1;
            let filename = target.template().filename(index, total);
            let destination = target.path_for(&filename);

            let outcome = renderer
                .render(card, &destination, &options.cancel)
                .map_err(|cause| RenderError {
                    index,
                    filename: filename.clone(),
                    cause,
                });

            let result = JobResult {
                index,
                filename,
                outcome,
            };
            if let Err(err) = reporter.record(result) {
                warn!(index, error = %err, "Failed to write progress");
            }
        });
    });

    let summary = reporter.summary();
    info!(
        succeeded = summary.succeeded,
        total = summary.total,
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "Batch finished"
    );
    Ok(summary)
}
