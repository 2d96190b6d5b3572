//! Sequential batch orchestration
//!
//! Items run one at a time in input order with a pacing delay between them.
//! One item failing never stops the batch; a cancellation token or the batch
//! deadline does, and only between items.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::scrape_service::ProductScraper;
use crate::domain::{BatchItemResult, BatchReport, BatchState, BatchSummary, ExtractionTarget};
use crate::infrastructure::config::BatchConfig;
use crate::infrastructure::parsing_error::ScrapeError;

pub struct BatchOrchestrator {
    scraper: Arc<ProductScraper>,
    config: BatchConfig,
}

impl BatchOrchestrator {
    pub fn new(scraper: Arc<ProductScraper>, config: BatchConfig) -> Self {
        Self { scraper, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run a batch to completion
    pub async fn run_batch(&self, targets: Vec<ExtractionTarget>) -> Result<BatchReport, ScrapeError> {
        self.run_batch_with_cancellation(targets, CancellationToken::new())
            .await
    }

    /// Run a batch that stops early once `cancel` fires or the deadline passes
    ///
    /// Oversized batches are rejected before anything is fetched.
    pub async fn run_batch_with_cancellation(
        &self,
        targets: Vec<ExtractionTarget>,
        cancel: CancellationToken,
    ) -> Result<BatchReport, ScrapeError> {
        let total = targets.len();
        if total > self.config.max_batch_size {
            return Err(ScrapeError::validation(format!(
                "batch of {total} exceeds the maximum of {}",
                self.config.max_batch_size
            )));
        }

        let batch_id = Uuid::new_v4();
        let span = info_span!("batch", batch_id = %batch_id, total);
        self.process(targets, cancel).instrument(span).await
    }

    async fn process(
        &self,
        targets: Vec<ExtractionTarget>,
        cancel: CancellationToken,
    ) -> Result<BatchReport, ScrapeError> {
        let total = targets.len();
        let pacing = Duration::from_millis(self.config.pacing_delay_ms);
        let deadline = self
            .config
            .batch_deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        info!("Batch started");

        let mut results = Vec::with_capacity(total);
        let mut state = BatchState::start(total);

        while let BatchState::Running { index } = state {
            if cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
                state = state.cancel();
                break;
            }

            let target = &targets[index];
            let item = match self.scraper.fetch_and_extract(target).await {
                Ok(record) => {
                    info!(index, target = %target, matched = record.matched_fields(), "Item succeeded");
                    BatchItemResult::success(index, target, record)
                }
                Err(error) => {
                    warn!(index, target = %target, kind = ?error.kind(), "Item failed: {}", error);
                    BatchItemResult::failure(index, target, error.kind(), error.to_string())
                }
            };
            results.push(item);

            state = state.advance(total);
            if matches!(state, BatchState::Running { .. }) && !pacing.is_zero() {
                tokio::select! {
                    () = sleep(pacing) => {}
                    () = cancel.cancelled() => state = state.cancel(),
                    () = wait_for(deadline) => state = state.cancel(),
                }
            }
        }

        let summary = BatchSummary::from_results(total, &results);
        match state {
            BatchState::Cancelled { next_index } => warn!(
                next_index,
                skipped = summary.skipped,
                "Batch cancelled"
            ),
            _ => info!(
                successful = summary.successful,
                failed = summary.failed,
                success_rate = summary.success_rate,
                "Batch completed"
            ),
        }

        Ok(BatchReport {
            batch_summary: summary,
            results,
            state,
        })
    }
}

/// Resolves at the deadline, or never when there is none
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ScraperConfig;
    use crate::infrastructure::parsing::ProductMetricsParser;
    use crate::infrastructure::parsing_error::{ErrorKind, TransportError};
    use crate::test_utils::{ScriptedFetcher, product_page};
    use url::Url;

    fn item_url(n: usize) -> String {
        format!("https://www.aliexpress.us/item/{n}.html")
    }

    fn targets(n: usize) -> Vec<ExtractionTarget> {
        (0..n)
            .map(|i| ExtractionTarget::url(Url::parse(&item_url(i)).unwrap()))
            .collect()
    }

    fn orchestrator(fetcher: Arc<ScriptedFetcher>, config: BatchConfig) -> BatchOrchestrator {
        let scraper = ProductScraper::new(
            fetcher,
            Arc::new(ProductMetricsParser::new().unwrap()),
            ScraperConfig::default(),
        );
        BatchOrchestrator::new(Arc::new(scraper), config)
    }

    fn fetcher_for(n: usize) -> ScriptedFetcher {
        (0..n).fold(ScriptedFetcher::new(), |f, i| {
            f.with_page(&item_url(i), product_page(4.5, i as u64, 10))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_outcomes_summary() {
        let fetcher = Arc::new(
            fetcher_for(3).with_error(&item_url(1), TransportError::Connect("refused".into())),
        );
        let report = orchestrator(fetcher, BatchConfig::default())
            .run_batch(targets(3))
            .await
            .unwrap();

        assert_eq!(report.state, BatchState::Completed);
        assert_eq!(report.batch_summary.total, 3);
        assert_eq!(report.batch_summary.successful, 2);
        assert_eq!(report.batch_summary.failed, 1);
        assert_eq!(report.batch_summary.success_rate, 67);
        assert!(matches!(
            report.results[1],
            BatchItemResult::Failure { index: 1, error_kind: ErrorKind::NetworkError, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_batch_is_rejected_without_fetching() {
        let fetcher = Arc::new(fetcher_for(11));
        let err = orchestrator(fetcher.clone(), BatchConfig::default())
            .run_batch(targets(11))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_items_only() {
        let fetcher = Arc::new(fetcher_for(3));
        let started = Instant::now();
        orchestrator(fetcher, BatchConfig::default())
            .run_batch(targets(3))
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch() {
        let report = orchestrator(Arc::new(ScriptedFetcher::new()), BatchConfig::default())
            .run_batch(Vec::new())
            .await
            .unwrap();

        assert_eq!(report.state, BatchState::Completed);
        assert!(report.results.is_empty());
        assert_eq!(report.batch_summary.success_rate, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_pacing() {
        let fetcher = Arc::new(fetcher_for(4));
        let orchestrator = orchestrator(fetcher.clone(), BatchConfig::default());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            // lands inside the pause after the second item
            sleep(Duration::from_millis(3000)).await;
            trigger.cancel();
        });

        let report = orchestrator
            .run_batch_with_cancellation(targets(4), cancel)
            .await
            .unwrap();

        assert_eq!(report.state, BatchState::Cancelled { next_index: 2 });
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.batch_summary.skipped, 2);
        assert_eq!(report.batch_summary.total, 4);
        assert_eq!(report.batch_summary.success_rate, 50);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_precancelled_token_runs_nothing() {
        let fetcher = Arc::new(fetcher_for(2));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = orchestrator(fetcher.clone(), BatchConfig::default())
            .run_batch_with_cancellation(targets(2), cancel)
            .await
            .unwrap();

        assert_eq!(report.state, BatchState::Cancelled { next_index: 0 });
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_stops_batch() {
        let config = BatchConfig {
            batch_deadline_ms: Some(2500),
            ..BatchConfig::default()
        };
        let report = orchestrator(Arc::new(fetcher_for(5)), config)
            .run_batch(targets(5))
            .await
            .unwrap();

        assert_eq!(report.state, BatchState::Cancelled { next_index: 2 });
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.batch_summary.skipped, 3);
    }
}
