//! Batch processor: one operation applied to many items.
//!
//! Sequential runs walk the items in order on the calling task. Parallel runs
//! use a fixed pool of worker tasks fed from a single job queue; workers report
//! into an mpsc channel drained by one collector task, which is the only code
//! that ever writes the [`BatchResult`].

use super::progress::{ProgressReporter, StderrProgressReporter};
use super::{BatchError, BatchOptions, BatchResult};
use crate::utils::{generate_run_id, panic_message};
use futures::FutureExt;
use std::fmt::{self, Display};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, info_span, warn, Instrument};

/// An item index travelling on the job queue.
#[derive(Debug, Clone, Copy)]
struct WorkItem {
    index: usize,
}

/// The outcome of one item, tagged with its input position.
#[derive(Debug)]
struct WorkResult<R> {
    index: usize,
    outcome: Result<R, String>,
}

/// Applies an operation to every item of a collection.
///
/// A processor is built once, runs [`process`](Self::process), and is
/// discarded. Its options are fixed at construction.
pub struct BatchProcessor {
    options: BatchOptions,
    reporter: Arc<dyn ProgressReporter>,
}

impl BatchProcessor {
    /// Creates a processor, defaulting the worker count when unset.
    #[must_use]
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options: options.normalized(),
            reporter: Arc::new(StderrProgressReporter),
        }
    }

    /// Replaces the stderr progress reporter.
    ///
    /// The reporter is only consulted when `show_progress` is enabled.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the effective options.
    #[must_use]
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Runs `operation` on every item and aggregates the outcome.
    ///
    /// Item failures, including panics inside `operation`, are recorded in
    /// the result and never abort the call. With `continue_on_error` off the
    /// run stops accounting at the first failure; in parallel mode work that
    /// was already dispatched still runs to completion and is discarded.
    pub async fn process<T, R, E, F, Fut>(&self, items: Vec<T>, operation: F) -> BatchResult<T, R>
    where
        T: Clone + Display + Send + Sync + 'static,
        R: Send + 'static,
        E: Display + Send,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let start = Instant::now();
        let run_id = generate_run_id();
        let span = info_span!(
            "batch",
            %run_id,
            total = items.len(),
            parallel = self.options.parallel,
            workers = self.options.workers,
        );

        async move {
            debug!("Batch started");

            let mut result = if self.options.parallel {
                self.process_parallel(items, operation).await
            } else {
                self.process_sequential(&items, &operation).await
            };

            result.processed = result.succeeded + result.failed;
            result.duration = start.elapsed();

            info!(
                processed = result.processed,
                succeeded = result.succeeded,
                failed = result.failed,
                duration_ms = result.duration_ms(),
                "Batch finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn process_sequential<T, R, E, F, Fut>(&self, items: &[T], operation: &F) -> BatchResult<T, R>
    where
        T: Clone + Display,
        E: Display,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let total = items.len();
        let mut result = BatchResult::new(total);

        for (index, item) in items.iter().enumerate() {
            let outcome = run_guarded(operation, item.clone()).await;
            self.show_progress(index + 1, total, item);

            match outcome {
                Ok(output) => {
                    result.succeeded += 1;
                    result.results.push(output);
                }
                Err(message) => {
                    debug!(index, error = %message, "Batch item failed");
                    result.failed += 1;
                    result.errors.push(BatchError::new(index, item.clone(), message));

                    if !self.options.continue_on_error {
                        warn!(index, "Batch stopped at first failure");
                        break;
                    }
                }
            }
        }

        result
    }

    async fn process_parallel<T, R, E, F, Fut>(&self, items: Vec<T>, operation: F) -> BatchResult<T, R>
    where
        T: Clone + Display + Send + Sync + 'static,
        R: Send + 'static,
        E: Display + Send,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let total = items.len();
        let capacity = total.max(1);
        let items = Arc::new(items);
        let operation = Arc::new(operation);

        let (job_tx, job_rx) = mpsc::channel::<WorkItem>(capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, result_rx) = mpsc::channel::<WorkResult<R>>(capacity);

        let mut workers = Vec::with_capacity(self.options.workers);
        for worker_id in 0..self.options.workers {
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            let items = Arc::clone(&items);
            let operation = Arc::clone(&operation);

            workers.push(tokio::spawn(
                async move {
                    loop {
                        // The queue lock is held only while waiting for the next index.
                        let job = jobs.lock().await.recv().await;
                        let Some(WorkItem { index }) = job else {
                            break;
                        };

                        let outcome = run_guarded(operation.as_ref(), items[index].clone()).await;
                        if results.send(WorkResult { index, outcome }).await.is_err() {
                            break;
                        }
                    }
                    debug!(worker_id, "Batch worker exiting");
                }
                .in_current_span(),
            ));
        }

        // Workers now hold the only senders; the channel closes when the last one exits.
        drop(result_tx);

        let collector = tokio::spawn(
            collect_results(
                result_rx,
                Arc::clone(&items),
                self.options,
                Arc::clone(&self.reporter),
            )
            .in_current_span(),
        );

        for index in 0..total {
            if job_tx.send(WorkItem { index }).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Batch worker terminated abnormally");
            }
        }

        match collector.await {
            Ok(result) => result,
            // A panicking reporter surfaces to the caller, as it does in sequential mode.
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!(error = %e, "Batch collector terminated abnormally");
                let mut result = BatchResult::new(total);
                for (index, item) in items.iter().enumerate() {
                    result.failed += 1;
                    result
                        .errors
                        .push(BatchError::new(index, item.clone(), format!("result lost: {e}")));
                }
                result
            }
        }
    }

    fn show_progress<T: Display>(&self, current: usize, total: usize, item: &T) {
        if self.options.show_progress {
            self.reporter.report(current, total, &item.to_string());
        }
    }
}

impl fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Drains worker results into the aggregate. The single writer of the result.
async fn collect_results<T, R>(
    mut results: mpsc::Receiver<WorkResult<R>>,
    items: Arc<Vec<T>>,
    options: BatchOptions,
    reporter: Arc<dyn ProgressReporter>,
) -> BatchResult<T, R>
where
    T: Clone + Display,
{
    let total = items.len();
    let mut result = BatchResult::new(total);
    let mut outputs: Vec<(usize, R)> = Vec::with_capacity(total);
    let mut received = 0;

    while let Some(WorkResult { index, outcome }) = results.recv().await {
        received += 1;
        if options.show_progress {
            reporter.report(received, total, &items[index].to_string());
        }

        match outcome {
            Ok(output) => {
                result.succeeded += 1;
                outputs.push((index, output));
            }
            Err(message) => {
                debug!(index, error = %message, "Batch item failed");
                result.failed += 1;
                result.errors.push(BatchError::new(index, items[index].clone(), message));

                if !options.continue_on_error {
                    // Soft stop: in-flight work finishes, its outcome is dropped.
                    let mut discarded = 0_usize;
                    while results.recv().await.is_some() {
                        discarded += 1;
                    }
                    warn!(index, discarded, "Batch stopped at first failure");
                    break;
                }
            }
        }
    }

    outputs.sort_by_key(|(index, _)| *index);
    result.results = outputs.into_iter().map(|(_, output)| output).collect();
    result.errors.sort_by_key(|e| e.index);
    result
}

/// Runs the operation for one item, turning errors and panics into messages.
async fn run_guarded<T, R, E, F, Fut>(operation: &F, item: T) -> Result<R, String>
where
    E: Display,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| operation(item))) {
        Ok(future) => future,
        Err(panic) => return Err(panic_message(panic.as_ref())),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(output)) => Ok(output),
        // Alternate form keeps the whole cause chain of context-wrapped errors.
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CollectingProgressReporter;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    async fn echo(item: String) -> Result<String, String> {
        if item == "fail" {
            Err("simulated error".to_string())
        } else {
            Ok(item)
        }
    }

    #[test]
    fn test_default_workers() {
        let processor = BatchProcessor::new(BatchOptions::new().with_parallel(true));
        assert_eq!(processor.options().workers, 4);
    }

    #[tokio::test]
    async fn test_sequential_all_succeed() {
        let processor = BatchProcessor::new(BatchOptions::new().with_continue_on_error(true));

        let result = processor.process(strings(&["item1", "item2", "item3"]), echo).await;

        assert_eq!(result.total_items, 3);
        assert_eq!(result.processed, 3);
        assert_eq!(result.succeeded, 3);
        assert_eq!(result.failed, 0);
        assert_eq!(result.results, strings(&["item1", "item2", "item3"]));
    }

    #[tokio::test]
    async fn test_sequential_continue_on_error() {
        let processor = BatchProcessor::new(BatchOptions::new().with_continue_on_error(true));

        let result = processor.process(strings(&["success", "fail", "success"]), echo).await;

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.processed, 3);
        assert_eq!(
            result.errors,
            vec![BatchError::new(1, "fail".to_string(), "simulated error")]
        );
    }

    #[tokio::test]
    async fn test_sequential_stop_on_error() {
        let attempted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempted);
        let processor = BatchProcessor::new(BatchOptions::new());

        let result = processor
            .process(strings(&["success", "fail", "should_not_process"]), move |item| {
                counter.fetch_add(1, Ordering::SeqCst);
                echo(item)
            })
            .await;

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.processed, 2);
        assert!(result.halted_early());
        assert_eq!(attempted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sequential_duration_covers_work() {
        let processor = BatchProcessor::new(BatchOptions::new());

        let result = processor
            .process(vec![1, 2, 3], |item: i32| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, String>(item)
            })
            .await;

        assert!(result.duration >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_parallel_all_succeed_in_input_order() {
        let processor = BatchProcessor::new(
            BatchOptions::new()
                .with_parallel(true)
                .with_continue_on_error(true)
                .with_workers(3),
        );

        let items: Vec<u64> = (0..12).collect();
        let result = processor
            .process(items.clone(), |item: u64| async move {
                // Later items finish first.
                tokio::time::sleep(Duration::from_millis(24 - item * 2)).await;
                Ok::<_, String>(item * 10)
            })
            .await;

        assert_eq!(result.succeeded, 12);
        assert_eq!(result.failed, 0);
        assert!(result.duration > Duration::ZERO);
        assert_eq!(result.results, items.iter().map(|i| i * 10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_parallel_throughput_uses_all_workers() {
        let processor = BatchProcessor::new(
            BatchOptions::new()
                .with_parallel(true)
                .with_continue_on_error(true)
                .with_workers(4),
        );

        let result = processor
            .process((0..8).collect::<Vec<u32>>(), |item: u32| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, String>(item)
            })
            .await;

        // ceil(8 / 4) * 50ms, far below the 400ms a sequential run needs.
        assert_eq!(result.succeeded, 8);
        assert!(result.duration >= Duration::from_millis(100));
        assert!(result.duration < Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_parallel_continue_on_error_sorted_errors() {
        let processor = BatchProcessor::new(
            BatchOptions::new()
                .with_parallel(true)
                .with_continue_on_error(true)
                .with_workers(2),
        );

        let result = processor
            .process(strings(&["a", "fail", "b", "fail", "c"]), echo)
            .await;

        assert_eq!(result.processed, 5);
        assert_eq!(result.succeeded, 3);
        assert_eq!(result.failed, 2);
        assert_eq!(
            result.errors.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(result.results, strings(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_parallel_stop_on_error_soft_stop() {
        let attempted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempted);
        let processor = BatchProcessor::new(
            BatchOptions::new().with_parallel(true).with_workers(2),
        );

        let result = processor
            .process(strings(&["fail", "b", "c", "d", "e"]), move |item: String| {
                let counter = Arc::clone(&counter);
                async move {
                    if item != "fail" {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                    }
                    counter.fetch_add(1, Ordering::SeqCst);
                    echo(item).await
                }
            })
            .await;

        assert!(result.has_errors());
        assert_eq!(result.failed, 1);
        assert_eq!(result.processed, result.succeeded + result.failed);
        assert!(result.processed < result.total_items);
        // Nothing is cancelled: every queued item still ran.
        assert_eq!(attempted.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_parallel_empty_input() {
        let processor = BatchProcessor::new(BatchOptions::new().with_parallel(true));

        let result = processor.process(Vec::<String>::new(), echo).await;

        assert_eq!(result.total_items, 0);
        assert_eq!(result.processed, 0);
        assert!(!result.has_errors());
    }

    #[tokio::test]
    async fn test_panicking_operation_is_recorded() {
        for parallel in [false, true] {
            let processor = BatchProcessor::new(
                BatchOptions::new()
                    .with_parallel(parallel)
                    .with_continue_on_error(true)
                    .with_workers(2),
            );

            let result = processor
                .process(strings(&["ok", "boom", "ok"]), |item: String| async move {
                    if item == "boom" {
                        panic!("exploded on {item}");
                    }
                    Ok::<_, String>(item)
                })
                .await;

            assert_eq!(result.succeeded, 2);
            assert_eq!(result.failed, 1);
            assert_eq!(result.errors[0].index, 1);
            assert_eq!(result.errors[0].error, "operation panicked: exploded on boom");
        }
    }

    #[tokio::test]
    async fn test_progress_reported_per_item() {
        let reporter = Arc::new(CollectingProgressReporter::new());
        let processor = BatchProcessor::new(
            BatchOptions::new()
                .with_continue_on_error(true)
                .with_show_progress(true),
        )
        .with_reporter(reporter.clone());

        processor.process(strings(&["a", "fail", "c"]), echo).await;

        assert_eq!(
            reporter.lines(),
            vec![
                "[1/3] (33.3%) Processing: a".to_string(),
                "[2/3] (66.7%) Processing: fail".to_string(),
                "[3/3] (100.0%) Processing: c".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_parallel_progress_counts_completions() {
        let reporter = Arc::new(CollectingProgressReporter::new());
        let processor = BatchProcessor::new(
            BatchOptions::new()
                .with_parallel(true)
                .with_continue_on_error(true)
                .with_show_progress(true)
                .with_workers(2),
        )
        .with_reporter(reporter.clone());

        processor.process(strings(&["a", "b", "c", "d"]), echo).await;

        let currents: Vec<usize> = reporter.events().iter().map(|(c, _, _)| *c).collect();
        assert_eq!(currents, vec![1, 2, 3, 4]);
        assert!(reporter.events().iter().all(|(_, total, _)| *total == 4));
    }

    #[tokio::test]
    async fn test_progress_disabled_reports_nothing() {
        let reporter = Arc::new(CollectingProgressReporter::new());
        let processor = BatchProcessor::new(BatchOptions::new().with_continue_on_error(true))
            .with_reporter(reporter.clone());

        processor.process(strings(&["a", "b"]), echo).await;

        assert!(reporter.is_empty());
    }

    struct PanickingReporter;

    impl ProgressReporter for PanickingReporter {
        fn report(&self, _current: usize, _total: usize, _item: &str) {
            panic!("reporter exploded");
        }
    }

    #[tokio::test]
    #[should_panic(expected = "reporter exploded")]
    async fn test_parallel_reporter_panic_reaches_caller() {
        let processor = BatchProcessor::new(
            BatchOptions::new()
                .with_parallel(true)
                .with_show_progress(true)
                .with_workers(2),
        )
        .with_reporter(Arc::new(PanickingReporter));

        // Must not come back as an empty success.
        let _ = processor.process(strings(&["fail", "x"]), echo).await;
    }

    #[tokio::test]
    #[should_panic(expected = "reporter exploded")]
    async fn test_sequential_reporter_panic_reaches_caller() {
        let processor = BatchProcessor::new(BatchOptions::new().with_show_progress(true))
            .with_reporter(Arc::new(PanickingReporter));

        let _ = processor.process(strings(&["fail", "x"]), echo).await;
    }

    #[tokio::test]
    async fn test_error_message_keeps_cause_chain() {
        use anyhow::Context;

        for parallel in [false, true] {
            let processor = BatchProcessor::new(BatchOptions::new().with_parallel(parallel));

            let result = processor
                .process(strings(&["phase-1"]), |item: String| async move {
                    Err::<(), _>(anyhow::anyhow!("root cause")).context(format!("loading {item}"))
                })
                .await;

            assert_eq!(result.errors.len(), 1);
            assert_eq!(result.errors[0].error, "loading phase-1: root cause");
        }
    }
}
