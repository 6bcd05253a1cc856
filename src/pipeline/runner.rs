//! Batch pipeline
//!
//! Coordinates discovery, the sequential per-file loop, progress reporting,
//! and export. The core loop is single-threaded and processes files in
//! enumeration order; per-item failures are recorded and never abort the
//! batch. Callers wanting a responsive UI run the whole batch on a worker
//! thread and listen on a `ChannelProgress` - the runner itself owns no
//! threads.

use crate::analysis::TempoEstimator;
use crate::config::settings::CONVERTED_DIR;
use crate::config::Settings;
use crate::convert;
use crate::discovery;
use crate::error::Result;
use crate::export;
use crate::progress::{NoopProgress, ProgressObserver};
use crate::types::{AudioFile, BatchReport, ItemOutcome, Operation, ResultRow};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag, polled between items
///
/// Cancelling never interrupts the item in flight; the batch stops before
/// starting the next one and returns the outcomes accumulated so far.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Run the full pipeline with a progress bar (or silently in quiet mode)
pub fn run(settings: &Settings) -> Result<BatchReport> {
    if settings.show_progress {
        let bar = BarProgress::new();
        let report = run_with_observer(settings, &bar, &CancelToken::new())?;
        bar.finish();
        Ok(report)
    } else {
        run_with_observer(settings, &NoopProgress, &CancelToken::new())
    }
}

/// Run the full pipeline, reporting progress to the given observer
///
/// Phases: discovery -> sequential batch -> export (analyze mode).
/// Batch-level setup failures (missing input, unwritable spreadsheet)
/// propagate; per-item failures are folded into the report.
pub fn run_with_observer(
    settings: &Settings,
    observer: &dyn ProgressObserver,
    cancel: &CancelToken,
) -> Result<BatchReport> {
    let pipeline_start = Instant::now();

    info!("Scanning {}", settings.input.display());
    let files = discovery::scan(&settings.input, &settings.allowed_extensions)?;

    let report = run_batch(&files, settings, observer, cancel);

    if matches!(settings.operation, Operation::EstimateTempo) && !cancel.is_cancelled() {
        let rows = result_rows(&report.outcomes);
        export::write_csv(&rows, &settings.export_path)?;
    }

    info!(
        "Pipeline finished in {:.2}s: {} succeeded, {} failed (of {} total)",
        pipeline_start.elapsed().as_secs_f64(),
        report.succeeded,
        report.failed,
        report.total
    );

    Ok(report)
}

/// The sequential batch core
///
/// Applies the configured operation to each file in enumeration order and
/// invokes the observer after every item. The progress counter satisfies
/// `0 <= completed <= total` and reaches `total` exactly once, at batch
/// completion, even if every item failed.
pub fn run_batch(
    files: &[AudioFile],
    settings: &Settings,
    observer: &dyn ProgressObserver,
    cancel: &CancelToken,
) -> BatchReport {
    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);

    let estimator = TempoEstimator::new(settings.analysis.clone());
    // Batch mode writes conversions into a subdirectory of the source
    // directory; single-file mode writes next to the source
    let dest_dir = if settings.input.is_dir() {
        Some(settings.input.join(CONVERTED_DIR))
    } else {
        None
    };

    let mut completed = 0usize;
    for file in files {
        if cancel.is_cancelled() {
            info!("Batch cancelled after {} of {} items", completed, total);
            break;
        }

        debug!("Processing: {}", file.path.display());
        let outcome = match settings.operation {
            Operation::EstimateTempo => ItemOutcome::Tempo {
                file: file.clone(),
                tempo: estimator.estimate(&file.path),
            },
            Operation::Convert { .. } => ItemOutcome::Conversion {
                file: file.clone(),
                result: convert::convert(file, &settings.convert, dest_dir.as_deref()),
            },
        };

        if !outcome.is_success() {
            warn!("Item failed: {}", file.path.display());
        }

        outcomes.push(outcome);
        completed += 1;
        observer.on_progress(completed, total);
    }

    BatchReport::from_outcomes(outcomes, total)
}

/// Map batch outcomes to spreadsheet rows (analyze mode)
///
/// Undetermined tempos surface as the `0.0` sentinel; conversion outcomes
/// produce no rows.
fn result_rows(outcomes: &[ItemOutcome]) -> Vec<ResultRow> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            ItemOutcome::Tempo { file, tempo } => {
                Some(ResultRow::new(file.file_name(), tempo.bpm()))
            }
            ItemOutcome::Conversion { .. } => None,
        })
        .collect()
}

/// Terminal progress bar driven through the observer interface
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }

    fn finish(&self) {
        if self.bar.length().unwrap_or(0) > 0 {
            self.bar.finish();
        }
    }
}

impl ProgressObserver for BarProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        // First update sizes and reveals the bar; a zero-file batch never
        // draws (and never divides by zero computing a percentage)
        if self.bar.length().unwrap_or(0) != total as u64 {
            self.bar.set_length(total as u64);
            self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        self.bar.set_position(completed as u64);
    }
}
