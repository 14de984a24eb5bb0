use serde::Serialize;
use tokio::sync::watch;

/// Groups consolidated so far out of the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupProgress {
    pub current: usize,
    pub total: usize,
}

/// Receives read-only progress counters from the aggregation loop.
pub trait ProgressSink {
    fn report(&self, progress: GroupProgress);
}

/// Discards all progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: GroupProgress) {}
}

/// Publishes the latest counters to a watcher on another task.
impl ProgressSink for watch::Sender<GroupProgress> {
    fn report(&self, progress: GroupProgress) {
        self.send_replace(progress);
    }
}
