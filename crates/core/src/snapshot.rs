use crate::error::Result;
use crate::record::ProcessRecord;
use crate::registry::ProcessRegistry;

/// Read side: what the HTTP layer asks for on every `/cpu_usage` request.
///
/// Implementations never block on a sampler tick in progress. The view may
/// lag the registry by up to one tick.
pub trait SnapshotProvider: Send + Sync {
    /// Currently tracked processes, sorted by name ascending then pid.
    ///
    /// An empty registry yields an empty list, not an error.
    fn current_processes(&self) -> Result<Vec<ProcessRecord>>;
}

/// Write side: receives the registry after every completed tick.
pub trait SnapshotSink: Send {
    fn publish(&mut self, registry: &ProcessRegistry) -> Result<()>;
}

/// Sort records into the order every snapshot is served in.
pub fn sort_for_display(records: &mut [ProcessRecord]) {
    records.sort_by(ProcessRecord::display_order);
}
