//! In-process snapshot sharing between the sampler and query handlers.
//!
//! After every tick the sampler swaps in a freshly sorted copy of the
//! registry. Readers clone the current `Arc` and never wait on a tick in
//! progress; they always see one whole tick, never a mix of two.

use cpuwatch_core::{ProcessRecord, ProcessRegistry, Result, SnapshotProvider, SnapshotSink};
use std::sync::Arc;
use tokio::sync::watch;

type Shared = Arc<Vec<ProcessRecord>>;

/// Create a connected publisher/reader pair. The reader starts out empty.
pub fn live_snapshot() -> (LivePublisher, LiveSnapshot) {
    let (tx, rx) = watch::channel(Shared::default());
    (LivePublisher { tx }, LiveSnapshot { rx })
}

/// Sampler-side half of [`live_snapshot`].
#[derive(Debug)]
pub struct LivePublisher {
    tx: watch::Sender<Shared>,
}

impl SnapshotSink for LivePublisher {
    fn publish(&mut self, registry: &ProcessRegistry) -> Result<()> {
        // send_replace succeeds even when every reader has been dropped.
        self.tx.send_replace(Arc::new(registry.snapshot()));
        Ok(())
    }
}

/// Query-side half of [`live_snapshot`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    rx: watch::Receiver<Shared>,
}

impl LiveSnapshot {
    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<Vec<ProcessRecord>> {
        Arc::clone(&self.rx.borrow())
    }

    /// Wait until the sampler publishes again. Returns `false` once the
    /// publisher is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl SnapshotProvider for LiveSnapshot {
    fn current_processes(&self) -> Result<Vec<ProcessRecord>> {
        Ok(self.latest().as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpuwatch_core::{ProcessSample, ProcessStatus};
    use std::num::NonZeroUsize;

    fn sample(pid: u32, name: &str) -> ProcessSample {
        ProcessSample {
            pid,
            name: name.into(),
            status: ProcessStatus::Running,
            user_secs: 1.0,
            sys_secs: 1.0,
        }
    }

    #[test]
    fn empty_before_first_publish() {
        let (_publisher, reader) = live_snapshot();
        assert!(reader.current_processes().unwrap().is_empty());
    }

    #[test]
    fn reader_sees_published_registry_sorted() {
        let (mut publisher, reader) = live_snapshot();
        let mut registry = ProcessRegistry::new(NonZeroUsize::new(5).unwrap(), 2);
        registry.reconcile([Ok(sample(2, "sshd")), Ok(sample(1, "init"))]);

        publisher.publish(&registry).unwrap();

        let names: Vec<String> = reader
            .current_processes()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["init", "sshd"]);
    }

    #[test]
    fn held_snapshot_is_unaffected_by_later_publish() {
        let (mut publisher, reader) = live_snapshot();
        let mut registry = ProcessRegistry::new(NonZeroUsize::new(5).unwrap(), 2);
        registry.reconcile([Ok(sample(1, "init"))]);
        publisher.publish(&registry).unwrap();

        let held = reader.latest();
        registry.reconcile([Ok(sample(3, "cron"))]);
        publisher.publish(&registry).unwrap();

        assert_eq!(held.len(), 1);
        assert_eq!(held[0].pid, 1);
        assert_eq!(reader.latest()[0].pid, 3);
    }
}
