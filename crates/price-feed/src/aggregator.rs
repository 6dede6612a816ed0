//! Price aggregator - fans a pair out to every source and ranks the answers

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, info, warn};

use swapc_core::{
    is_valid_quote, rank, AggregationError, AggregationResult, AggregatorConfig, BuildError,
    PairContext, PairRequest, Quote, SourceFailure,
};

use crate::resolver::TokenResolver;
use crate::sources::PriceSource;

type Slot = Option<Result<Quote, SourceFailure>>;

/// Main price aggregator
pub struct PriceAggregator {
    config: AggregatorConfig,
    sources: Vec<Arc<dyn PriceSource>>,
    resolver: Arc<dyn TokenResolver>,
    stats: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    comparisons: AtomicU64,
    failed_comparisons: AtomicU64,
    grace_windows: AtomicU64,
    source_failures: AtomicU64,
    rejected_quotes: AtomicU64,
}

impl PriceAggregator {
    pub fn builder() -> PriceAggregatorBuilder {
        PriceAggregatorBuilder::new()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Registered source names, in tie-break order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve, fan out, collect, validate and rank
    pub async fn compare(&self, request: &PairRequest) -> Result<AggregationResult, AggregationError> {
        let started = Instant::now();
        self.stats.comparisons.fetch_add(1, Ordering::Relaxed);
        info!("Starting price comparison for {}", request);

        let pair = Arc::new(self.resolve_pair(request).await.inspect_err(|_| {
            self.stats.failed_comparisons.fetch_add(1, Ordering::Relaxed);
        })?);
        debug!(
            "Token mints: {}={}, {}={}",
            pair.base.symbol, pair.base.mint, pair.quote.symbol, pair.quote.mint
        );

        let overall_deadline = started + self.config.overall_timeout();
        let (slots, grace_applied) = self.collect(&pair, started, overall_deadline).await;

        let mut quotes = Vec::new();
        let mut failures = Vec::new();
        let mut rejected = 0;

        for (source, slot) in self.sources.iter().zip(slots) {
            match slot {
                Some(Ok(quote)) if is_valid_quote(&quote) => quotes.push(quote),
                Some(Ok(quote)) => {
                    warn!("Dropping invalid price {} from {}", quote.price, quote.source);
                    rejected += 1;
                }
                Some(Err(failure)) => failures.push(failure),
                None => failures.push(SourceFailure::timeout(
                    source.name(),
                    "still in flight at the collection deadline",
                )),
            }
        }

        for failure in &failures {
            warn!("{} failed: {} ({})", failure.source_name, failure.reason, failure.detail);
        }
        self.stats
            .source_failures
            .fetch_add(failures.len() as u64, Ordering::Relaxed);
        self.stats.rejected_quotes.fetch_add(rejected as u64, Ordering::Relaxed);

        let Some(ranking) = rank(quotes) else {
            self.stats.failed_comparisons.fetch_add(1, Ordering::Relaxed);
            return Err(AggregationError::NoValidQuotes {
                pair: pair.label(),
                failures,
                rejected,
            });
        };

        let elapsed = started.elapsed();
        info!(
            "Compared {} in {:?}: {} prices, best {} ${:.4}, worst {} ${:.4} ({:.2}%)",
            pair,
            elapsed,
            ranking.quotes.len(),
            ranking.best.source,
            ranking.best.price,
            ranking.worst.source,
            ranking.worst.price,
            ranking.percent_spread
        );

        Ok(AggregationResult {
            pair: (*pair).clone(),
            quotes: ranking.quotes,
            best: ranking.best,
            worst: ranking.worst,
            absolute_spread: ranking.absolute_spread,
            percent_spread: ranking.percent_spread,
            elapsed,
            failures,
            grace_applied,
        })
    }

    async fn resolve_pair(&self, request: &PairRequest) -> Result<PairContext, AggregationError> {
        let base = self.resolve_symbol(&request.token_a).await?;
        let quote = self.resolve_symbol(&request.token_b).await?;
        Ok(PairContext::new(base, quote))
    }

    async fn resolve_symbol(&self, symbol: &str) -> Result<swapc_core::TokenInfo, AggregationError> {
        self.resolver
            .resolve(symbol)
            .await
            .map_err(|e| AggregationError::UnknownSymbol {
                symbol: symbol.to_string(),
                detail: e.to_string(),
            })
    }

    fn source_budget(&self, source: &dyn PriceSource) -> Duration {
        source.timeout().unwrap_or_else(|| self.config.source_timeout())
    }

    /// Deadline handed to one source: its own budget, capped by the overall deadline
    fn source_deadline(&self, source: &dyn PriceSource, started: Instant, overall: Instant) -> Instant {
        (started + self.source_budget(source)).min(overall)
    }

    /// Settle-all fan-out.
    ///
    /// Each source runs in its own task, bounded by its own budget, and reports
    /// into the slot at its registration index. Collection stops once every
    /// task has settled or the cut-off passes. The cut-off is the overall
    /// deadline, pushed back once by the grace window when fewer than
    /// `min_quotes_before_grace` quotes have arrived. Tasks still running at the
    /// final cut-off are aborted and their slots stay empty. Dropping the
    /// returned future aborts every task as well.
    async fn collect(
        &self,
        pair: &Arc<PairContext>,
        started: Instant,
        overall_deadline: Instant,
    ) -> (Vec<Slot>, bool) {
        let mut slots: Vec<Slot> = (0..self.sources.len()).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, source) in self.sources.iter().enumerate() {
            let deadline = self.source_deadline(source.as_ref(), started, overall_deadline);
            let budget_end = started + self.source_budget(source.as_ref());
            let source = Arc::clone(source);
            let pair = Arc::clone(pair);

            tasks.spawn(async move {
                let fetch = AssertUnwindSafe(source.fetch(&pair, deadline)).catch_unwind();
                let outcome = match timeout_at(budget_end, fetch).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(_)) => Err(SourceFailure::network(source.name(), "source task panicked")),
                    Err(_) => Err(SourceFailure::timeout(
                        source.name(),
                        "no answer within the source deadline",
                    )),
                };
                (index, outcome)
            });
        }

        let mut collected = 0;
        let mut cutoff = overall_deadline;
        let mut grace_applied = false;

        loop {
            tokio::select! {
                next = tasks.join_next() => match next {
                    Some(Ok((index, outcome))) => {
                        match &outcome {
                            Ok(quote) => {
                                info!("{} price: ${} ({:?})", quote.source, quote.price, quote.latency);
                                collected += 1;
                            }
                            Err(failure) => debug!("{} settled with {}", failure.source_name, failure.reason),
                        }
                        slots[index] = Some(outcome);
                    }
                    // tasks are only aborted once collection is over
                    Some(Err(e)) => warn!("Source task ended abnormally: {}", e),
                    None => break,
                },
                _ = sleep_until(cutoff) => {
                    if !grace_applied && collected < self.config.min_quotes_before_grace {
                        grace_applied = true;
                        self.stats.grace_windows.fetch_add(1, Ordering::Relaxed);
                        cutoff = overall_deadline + self.config.grace_window();
                        debug!(
                            "Only {} prices by the deadline, waiting {:?} for slower sources",
                            collected,
                            self.config.grace_window()
                        );
                        continue;
                    }
                    break;
                }
            }
        }

        for (index, slot) in slots.iter().enumerate() {
            if slot.is_none() {
                debug!("Abandoning {}", self.sources[index].name());
            }
        }
        tasks.abort_all();

        (slots, grace_applied)
    }

    /// Get statistics
    pub fn stats(&self) -> AggregatorStats {
        AggregatorStats {
            source_count: self.sources.len(),
            comparisons: self.stats.comparisons.load(Ordering::Relaxed),
            failed_comparisons: self.stats.failed_comparisons.load(Ordering::Relaxed),
            grace_windows: self.stats.grace_windows.load(Ordering::Relaxed),
            source_failures: self.stats.source_failures.load(Ordering::Relaxed),
            rejected_quotes: self.stats.rejected_quotes.load(Ordering::Relaxed),
        }
    }
}

/// Aggregator statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorStats {
    pub source_count: usize,
    pub comparisons: u64,
    pub failed_comparisons: u64,
    pub grace_windows: u64,
    pub source_failures: u64,
    pub rejected_quotes: u64,
}

/// Builder for the aggregator
pub struct PriceAggregatorBuilder {
    config: AggregatorConfig,
    sources: Vec<Arc<dyn PriceSource>>,
    resolver: Option<Arc<dyn TokenResolver>>,
}

impl PriceAggregatorBuilder {
    pub fn new() -> Self {
        Self {
            config: AggregatorConfig::default(),
            sources: vec![],
            resolver: None,
        }
    }

    pub fn config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn overall_timeout(mut self, timeout: Duration) -> Self {
        self.config.overall_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn source_timeout(mut self, timeout: Duration) -> Self {
        self.config.source_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn grace_window(mut self, window: Duration) -> Self {
        self.config.grace_window_ms = window.as_millis() as u64;
        self
    }

    pub fn source(mut self, source: Arc<dyn PriceSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = Arc<dyn PriceSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn TokenResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<PriceAggregator, BuildError> {
        self.config.validate()?;

        if self.sources.is_empty() {
            return Err(BuildError::NoSources);
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            let name = source.name();
            if name.trim().is_empty() {
                return Err(BuildError::EmptySourceName);
            }
            if !seen.insert(name.to_string()) {
                return Err(BuildError::DuplicateSource(name.to_string()));
            }
        }

        let resolver = self.resolver.ok_or(BuildError::MissingResolver)?;

        info!(
            "Price aggregator ready with {} sources: {}",
            self.sources.len(),
            self.sources.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
        );

        Ok(PriceAggregator {
            config: self.config,
            sources: self.sources,
            resolver,
            stats: Counters::default(),
        })
    }
}

impl Default for PriceAggregatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticResolver;
    use std::sync::atomic::AtomicUsize;
    use swapc_core::FailureReason;

    enum Behavior {
        Price(f64),
        Fail(FailureReason),
        /// Never answers on its own
        Hang,
        Panic,
    }

    struct MockSource {
        name: &'static str,
        delay: Duration,
        behavior: Behavior,
        timeout: Option<Duration>,
        calls: Arc<AtomicUsize>,
        finished: Arc<AtomicUsize>,
    }

    impl MockSource {
        fn new(name: &'static str, delay_ms: u64, behavior: Behavior) -> Self {
            Self {
                name,
                delay: Duration::from_millis(delay_ms),
                behavior,
                timeout: None,
                calls: Arc::new(AtomicUsize::new(0)),
                finished: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = Some(timeout);
            self
        }

        fn arc(self) -> Arc<dyn PriceSource> {
            Arc::new(self)
        }
    }

    #[async_trait::async_trait]
    impl PriceSource for MockSource {
        fn name(&self) -> &str {
            self.name
        }

        fn timeout(&self) -> Option<Duration> {
            self.timeout
        }

        async fn fetch(&self, _pair: &PairContext, _deadline: Instant) -> Result<Quote, SourceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let outcome = match self.behavior {
                Behavior::Price(price) => Ok(Quote::new(self.name, price, self.delay)),
                Behavior::Fail(reason) => Err(SourceFailure::new(self.name, reason, "mock failure")),
                Behavior::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                Behavior::Panic => panic!("mock source blew up"),
            };
            self.finished.fetch_add(1, Ordering::SeqCst);
            outcome
        }
    }

    fn aggregator(sources: Vec<Arc<dyn PriceSource>>) -> PriceAggregator {
        PriceAggregator::builder()
            .overall_timeout(Duration::from_secs(4))
            .source_timeout(Duration::from_secs(3))
            .grace_window(Duration::from_secs(1))
            .sources(sources)
            .resolver(Arc::new(StaticResolver))
            .build()
            .unwrap()
    }

    fn sol_usdc() -> PairRequest {
        PairRequest::new("SOL", "USDC")
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_quotes_and_a_timeout() {
        let agg = aggregator(vec![
            MockSource::new("A", 50, Behavior::Price(100.0)).arc(),
            MockSource::new("B", 80, Behavior::Price(102.0)).arc(),
            MockSource::new("C", 0, Behavior::Hang).arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert_eq!(result.best.source, "B");
        assert_eq!(result.best.price, 102.0);
        assert_eq!(result.worst.source, "A");
        assert_eq!(result.worst.price, 100.0);
        assert!((result.absolute_spread - 2.0).abs() < 1e-9);
        assert!((result.percent_spread - 2.0).abs() < 1e-9);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].source_name, "C");
        assert_eq!(result.failures[0].reason, FailureReason::Timeout);
        // C is cut off at its own 3s budget, not the overall deadline
        assert!(!result.grace_applied);
        assert!(result.elapsed >= Duration::from_secs(3));
        assert!(result.elapsed < Duration::from_secs(4));
        assert_eq!(result.pair.label(), "SOL/USDC");
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_source() {
        let agg = aggregator(vec![MockSource::new("A", 10, Behavior::Price(50.0)).arc()]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert_eq!(result.best, result.worst);
        assert_eq!(result.best.price, 50.0);
        assert_eq!(result.absolute_spread, 0.0);
        assert_eq!(result.percent_spread, 0.0);
        assert!(result.failures.is_empty());
        // every source settled early; no waiting for the deadline
        assert!(result.elapsed < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_sources_fail() {
        let agg = aggregator(vec![
            MockSource::new("A", 5, Behavior::Fail(FailureReason::NetworkError)).arc(),
            MockSource::new("B", 10, Behavior::Fail(FailureReason::NetworkError)).arc(),
            MockSource::new("C", 15, Behavior::Fail(FailureReason::NetworkError)).arc(),
        ]);

        let err = agg.compare(&sol_usdc()).await.unwrap_err();

        match err {
            AggregationError::NoValidQuotes { pair, failures, rejected } => {
                assert_eq!(pair, "SOL/USDC");
                assert_eq!(failures.len(), 3);
                assert!(failures.iter().all(|f| f.reason == FailureReason::NetworkError));
                assert_eq!(rejected, 0);
            }
            other => panic!("expected NoValidQuotes, got {other:?}"),
        }
        assert_eq!(agg.stats().failed_comparisons, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_prices_are_dropped_not_failed() {
        let agg = aggregator(vec![
            MockSource::new("Zero", 5, Behavior::Price(0.0)).arc(),
            MockSource::new("NaN", 5, Behavior::Price(f64::NAN)).arc(),
            MockSource::new("Inf", 5, Behavior::Price(f64::INFINITY)).arc(),
            MockSource::new("Negative", 5, Behavior::Price(-1.0)).arc(),
            MockSource::new("Good", 5, Behavior::Price(42.0)).arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert_eq!(result.quotes.len(), 1);
        assert_eq!(result.best.source, "Good");
        assert!(result.failures.is_empty());
        assert_eq!(agg.stats().rejected_quotes, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_invalid_prices_is_no_valid_quotes() {
        let agg = aggregator(vec![MockSource::new("Zero", 5, Behavior::Price(0.0)).arc()]);

        let err = agg.compare(&sol_usdc()).await.unwrap_err();
        assert!(matches!(
            err,
            AggregationError::NoValidQuotes { rejected: 1, ref failures, .. } if failures.is_empty()
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_window_admits_late_source() {
        // A arrives fast, B overruns the overall deadline but lands in the grace window
        let agg = aggregator(vec![
            MockSource::new("A", 100, Behavior::Price(100.0)).arc(),
            MockSource::new("B", 4_500, Behavior::Price(101.0))
                .with_timeout(Duration::from_secs(10))
                .arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert!(result.grace_applied);
        assert_eq!(result.quotes.len(), 2);
        assert_eq!(result.best.source, "B");
        assert!(result.failures.is_empty());
        assert!(result.elapsed >= Duration::from_millis(4_500));
        assert!(result.elapsed < Duration::from_secs(5));
        assert_eq!(agg.stats().grace_windows, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_window_is_bounded() {
        let agg = aggregator(vec![
            MockSource::new("A", 100, Behavior::Price(100.0)).arc(),
            MockSource::new("B", 60_000, Behavior::Price(101.0))
                .with_timeout(Duration::from_secs(120))
                .arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert!(result.grace_applied);
        assert_eq!(result.quotes.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].source_name, "B");
        assert_eq!(result.failures[0].reason, FailureReason::Timeout);
        assert!(result.elapsed >= Duration::from_secs(5));
        assert!(result.elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enough_quotes_skip_grace_window() {
        let agg = aggregator(vec![
            MockSource::new("A", 100, Behavior::Price(100.0)).arc(),
            MockSource::new("B", 200, Behavior::Price(99.0)).arc(),
            MockSource::new("C", 4_500, Behavior::Price(105.0)).arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert!(!result.grace_applied);
        assert_eq!(result.quotes.len(), 2);
        assert_eq!(result.failed_sources().collect::<Vec<_>>(), vec!["C"]);
        assert!(result.elapsed < Duration::from_millis(4_500));
        assert_eq!(agg.stats().grace_windows, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_source_is_cancelled() {
        let late = MockSource::new("Late", 60_000, Behavior::Price(1.0))
            .with_timeout(Duration::from_secs(120));
        let finished = Arc::clone(&late.finished);
        let agg = aggregator(vec![
            MockSource::new("A", 10, Behavior::Price(10.0)).arc(),
            MockSource::new("B", 20, Behavior::Price(11.0)).arc(),
            late.arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();
        assert_eq!(result.quotes.len(), 2);

        // the aborted task never completes, even once its delay would have passed
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_source_is_cut_off_at_its_own_budget() {
        let agg = aggregator(vec![
            MockSource::new("A", 10, Behavior::Price(100.0)).arc(),
            MockSource::new("Stuck", 0, Behavior::Hang)
                .with_timeout(Duration::from_millis(500))
                .arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert_eq!(result.quotes.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].source_name, "Stuck");
        assert_eq!(result.failures[0].reason, FailureReason::Timeout);
        // settled before the overall deadline, so no grace window either
        assert!(!result.grace_applied);
        assert!(result.elapsed >= Duration::from_millis(500));
        assert!(result.elapsed <= Duration::from_millis(600));
        assert_eq!(agg.stats().grace_windows, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_comparison_cancels_sources() {
        let slow = MockSource::new("Slow", 200, Behavior::Price(1.0));
        let calls = Arc::clone(&slow.calls);
        let finished = Arc::clone(&slow.finished);
        let agg = aggregator(vec![slow.arc()]);

        let gave_up = tokio::time::timeout(Duration::from_millis(50), agg.compare(&sol_usdc())).await;
        assert!(gave_up.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // the caller went away; the fetch must not run to completion behind its back
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_source_is_isolated() {
        let agg = aggregator(vec![
            MockSource::new("Boom", 5, Behavior::Panic).arc(),
            MockSource::new("A", 10, Behavior::Price(10.0)).arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        assert_eq!(result.best.source, "A");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].source_name, "Boom");
        assert_eq!(result.failures[0].reason, FailureReason::NetworkError);
        assert_eq!(result.failures[0].detail, "source task panicked");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ties_follow_registration_order() {
        // C finishes first but was registered last
        let agg = aggregator(vec![
            MockSource::new("A", 30, Behavior::Price(7.0)).arc(),
            MockSource::new("B", 20, Behavior::Price(7.0)).arc(),
            MockSource::new("C", 10, Behavior::Price(7.0)).arc(),
        ]);

        let result = agg.compare(&sol_usdc()).await.unwrap();

        let order: Vec<_> = result.quotes.iter().map(|q| q.source.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(result.best.source, "A");
        assert_eq!(result.worst.source, "C");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_symbol_contacts_no_source() {
        let source = MockSource::new("A", 10, Behavior::Price(10.0));
        let calls = Arc::clone(&source.calls);
        let agg = aggregator(vec![source.arc()]);

        let err = agg.compare(&PairRequest::new("NOTATOKEN", "USDC")).await.unwrap_err();

        assert!(matches!(err, AggregationError::UnknownSymbol { ref symbol, .. } if symbol == "NOTATOKEN"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_deadline_is_capped_by_overall() {
        let mut slow = MockSource::new("Slow", 0, Behavior::Hang);
        slow.timeout = Some(Duration::from_secs(30));
        let agg = aggregator(vec![slow.arc()]);

        let started = Instant::now();
        let overall = started + Duration::from_secs(4);
        let budgeted = agg.source_deadline(agg.sources[0].as_ref(), started, overall);
        assert_eq!(budgeted, overall);

        let fast = MockSource::new("Fast", 0, Behavior::Hang);
        assert_eq!(
            agg.source_deadline(&fast, started, overall),
            started + Duration::from_secs(3)
        );
    }

    #[test]
    fn test_builder_rejects_duplicates_and_empty() {
        let dup = PriceAggregator::builder()
            .source(MockSource::new("A", 0, Behavior::Hang).arc())
            .source(MockSource::new("A", 0, Behavior::Hang).arc())
            .resolver(Arc::new(StaticResolver))
            .build();
        assert!(matches!(dup, Err(BuildError::DuplicateSource(name)) if name == "A"));

        let empty_name = PriceAggregator::builder()
            .source(MockSource::new(" ", 0, Behavior::Hang).arc())
            .resolver(Arc::new(StaticResolver))
            .build();
        assert!(matches!(empty_name, Err(BuildError::EmptySourceName)));

        let none = PriceAggregator::builder().resolver(Arc::new(StaticResolver)).build();
        assert!(matches!(none, Err(BuildError::NoSources)));

        let no_resolver = PriceAggregator::builder()
            .source(MockSource::new("A", 0, Behavior::Hang).arc())
            .build();
        assert!(matches!(no_resolver, Err(BuildError::MissingResolver)));
    }
}
