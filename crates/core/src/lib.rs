pub mod error;
pub mod record;
pub mod registry;
pub mod snapshot;
pub mod source;
pub mod window;

pub use error::{CpuWatchError, Result};
pub use record::{ProcessRecord, ProcessSample, ProcessStatus};
pub use registry::{Observation, ProcessQueues, ProcessRegistry, TickReport};
pub use snapshot::{sort_for_display, SnapshotProvider, SnapshotSink};
pub use source::{Lookup, ProcessSource};
pub use window::BoundedAverageQueue;
