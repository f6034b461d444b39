use vise::{Counter, LabeledFamily, Metrics};

#[derive(Debug, Metrics)]
#[metrics(prefix = "live_feed")]
pub(crate) struct LiveFeedMetrics {
    /// Recognized events received on the live feed.
    #[metrics(labels = ["event"])]
    pub events: LabeledFamily<&'static str, Counter>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<LiveFeedMetrics> = vise::Global::new();
