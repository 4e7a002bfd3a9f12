use crate::core::rate_limit::RateLimiter;
use crate::core::render::{render, RenderOptions};
use crate::domain::model::{EnrichmentResult, Identifier, ListingFailure, RunReport};
use crate::domain::ports::{EnrichmentSource, ListingPage};
use crate::utils::error::{EnrichError, Result};
use chrono::Utc;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Serial discover → fetch → render → attach pipeline for one page visit.
///
/// Identifiers handled during the visit are remembered so a resumed run skips
/// them without touching the page; across page loads the fragment marker in
/// the document is the only record.
pub struct EnrichmentPipeline<S: EnrichmentSource> {
    source: S,
    limiter: RateLimiter,
    handled: HashSet<Identifier>,
}

enum FetchOutcome {
    Done(Result<EnrichmentResult>),
    Cancelled,
}

impl<S: EnrichmentSource> EnrichmentPipeline<S> {
    pub fn new(source: S, limiter: RateLimiter) -> Self {
        Self {
            source,
            limiter,
            handled: HashSet::new(),
        }
    }

    pub fn has_handled(&self, identifier: &Identifier) -> bool {
        self.handled.contains(identifier)
    }

    /// Runs one pass over the page. Stops early only when `cancel` fires.
    pub async fn run<P: ListingPage>(&mut self, page: &mut P, cancel: &CancellationToken) -> RunReport {
        let mut report = RunReport::new(page.page_type());
        let options = RenderOptions {
            full_width: page.full_width(),
        };

        let listings = page.discover();
        report.discovered = listings.len();
        tracing::info!(
            "🔍 Found {} listings on the {} page",
            listings.len(),
            page.page_type()
        );

        for listing in listings {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let Some(identifier) = page.extract_identifier(listing) else {
                report.skipped_no_identifier += 1;
                continue;
            };

            if self.has_handled(&identifier) || page.is_already_enriched(listing, &identifier) {
                tracing::debug!("Price history already handled for {}", identifier);
                report.skipped_already_enriched += 1;
                continue;
            }

            if !self.limiter.wait_turn(cancel).await {
                report.cancelled = true;
                break;
            }

            let outcome = tokio::select! {
                result = self.source.fetch(&identifier) => FetchOutcome::Done(result),
                _ = cancel.cancelled() => FetchOutcome::Cancelled,
            };

            let result = match outcome {
                FetchOutcome::Cancelled => {
                    self.limiter.record_attempt();
                    report.cancelled = true;
                    break;
                }
                FetchOutcome::Done(Ok(result)) => {
                    self.limiter.record_success();
                    result
                }
                FetchOutcome::Done(Err(e)) => {
                    self.limiter.record_failure();
                    record_failure(&mut report, identifier, e);
                    continue;
                }
            };

            match render(&identifier, &result, options) {
                Some(fragment) => match page.attach(listing, &fragment) {
                    Ok(()) => {
                        tracing::info!("✅ Price history attached for {}", identifier);
                        report.attached += 1;
                        self.handled.insert(identifier);
                    }
                    Err(e) => record_failure(&mut report, identifier, e),
                },
                None => {
                    tracing::debug!("No price change history for {}", identifier);
                    report.without_history += 1;
                    self.handled.insert(identifier);
                }
            }
        }

        if report.cancelled {
            tracing::info!("⏸️ Enrichment stopped before the end of the page");
        }

        report.finished_at = Some(Utc::now());
        tracing::info!(
            "📊 Run finished - attached: {}, no history: {}, failed: {}, skipped: {}",
            report.attached,
            report.without_history,
            report.failures.len(),
            report.skipped_no_identifier + report.skipped_already_enriched
        );

        report
    }
}

fn record_failure(report: &mut RunReport, identifier: Identifier, error: EnrichError) {
    if error.is_listing_scoped() {
        tracing::warn!(
            "⚠️ Skipping price history for {}: {} (Category: {:?})",
            identifier,
            error,
            error.category()
        );
    } else {
        tracing::error!(
            "❌ Error fetching price history for {}: {} (Category: {:?})",
            identifier,
            error,
            error.category()
        );
    }
    report.failures.push(ListingFailure {
        identifier,
        kind: error.kind().to_string(),
        message: error.to_string(),
    });
}
