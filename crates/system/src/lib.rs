#[cfg(target_os = "linux")]
pub mod proc_stat;
pub mod process;
pub mod publish;
pub mod sampler;
pub mod store;

pub use process::SysinfoSource;
pub use publish::{live_snapshot, LivePublisher, LiveSnapshot};
pub use sampler::{Sampler, SamplerState};
pub use store::{read_snapshot, FileSnapshotProvider, FileSnapshotStore};

use cpuwatch_core::ProcessSource;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Spawn a background Tokio task that drives `sampler` until `shutdown`
/// flips to `true`.
///
/// Await the returned handle to wait for the loop to wind down; it yields
/// the sampler back with its final registry.
pub fn spawn_sampler<S>(sampler: Sampler<S>, shutdown: watch::Receiver<bool>) -> JoinHandle<Sampler<S>>
where
    S: ProcessSource + 'static,
{
    tokio::spawn(sampler.run(shutdown))
}
