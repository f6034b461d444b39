use std::time::Duration;
use vise::{Buckets, Counter, Histogram, Metrics, Unit};

#[derive(Debug, Metrics)]
#[metrics(prefix = "ingest")]
pub(crate) struct IngestMetrics {
    /// Blocks fully processed, across live and catch-up ingests.
    pub blocks_processed: Counter,
    #[metrics(buckets = Buckets::LATENCIES, unit = Unit::Seconds)]
    pub block_processing_time: Histogram<Duration>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<IngestMetrics> = vise::Global::new();
