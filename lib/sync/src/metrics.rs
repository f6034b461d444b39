use vise::{Counter, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "sync")]
pub(crate) struct SyncMetrics {
    /// Catch-up job invocations.
    pub ticks: Counter,
    /// Blocks ingested by the backward walk (store hits excluded).
    pub blocks_walked: Counter,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<SyncMetrics> = vise::Global::new();
