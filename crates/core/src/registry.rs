use crate::error::{CpuWatchError, Result};
use crate::record::{ProcessRecord, ProcessSample};
use crate::snapshot::sort_for_display;
use crate::source::Lookup;
use crate::window::BoundedAverageQueue;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// The user-time and system-time windows of one tracked process.
#[derive(Debug, Clone)]
pub struct ProcessQueues {
    pub user: BoundedAverageQueue,
    pub sys:  BoundedAverageQueue,
}

impl ProcessQueues {
    fn new(window: NonZeroUsize) -> Self {
        Self {
            user: BoundedAverageQueue::with_capacity(window),
            sys:  BoundedAverageQueue::with_capacity(window),
        }
    }

    fn clear(&mut self) {
        self.user.clear();
        self.sys.clear();
    }
}

/// Record and windows live in the same slot, so a pid can never have one
/// without the other.
#[derive(Debug, Clone)]
struct TrackedProcess {
    record: ProcessRecord,
    queues: ProcessQueues,
}

/// What [`ProcessRegistry::observe`] did with a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// First sighting of this pid.
    New,
    /// Same process as last tick.
    Updated,
    /// The pid now belongs to a different program; its windows were reset.
    Reused { previous: String },
    /// Reported as a zombie and dropped from the registry.
    Zombie { was_tracked: bool },
}

/// Per-tick counters, logged by the sampler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Samples successfully read from the process table.
    pub observed: usize,
    pub new:      usize,
    pub reused:   usize,
    pub zombies:  usize,
    /// Entries that vanished or failed before their details could be read.
    pub skipped:  usize,
    pub culled:   usize,
    /// Registry size after the tick.
    pub tracked:  usize,
}

/// Tracked processes keyed by pid, each with its rolling CPU-time windows.
///
/// Owned by the sampler. Readers only ever see the copies handed to a
/// [`SnapshotSink`](crate::snapshot::SnapshotSink).
#[derive(Debug, Clone)]
pub struct ProcessRegistry {
    entries:      HashMap<u32, TrackedProcess>,
    avg_interval: NonZeroUsize,
    round_to:     u32,
}

impl ProcessRegistry {
    /// `avg_interval` is the window length in samples, not seconds.
    pub fn new(avg_interval: NonZeroUsize, round_to: u32) -> Self {
        Self {
            entries: HashMap::new(),
            avg_interval,
            round_to,
        }
    }

    pub fn avg_interval(&self) -> NonZeroUsize {
        self.avg_interval
    }

    /// Fold one process-table entry into the registry.
    ///
    /// Zombies are removed outright. A known pid reporting a new name is
    /// treated as reused: both windows restart from this sample. The average
    /// is computed eagerly, so a process seen for the first time reports its
    /// single-sample value.
    pub fn observe(&mut self, sample: ProcessSample) -> Result<Observation> {
        if sample.status.is_zombie() {
            let was_tracked = self.entries.remove(&sample.pid).is_some();
            return Ok(Observation::Zombie { was_tracked });
        }

        let round_to = self.round_to;
        let window = self.avg_interval;

        let (tracked, observation) = match self.entries.entry(sample.pid) {
            Entry::Vacant(slot) => {
                let tracked = slot.insert(TrackedProcess {
                    record: ProcessRecord {
                        pid:      sample.pid,
                        name:     sample.name.clone(),
                        status:   sample.status,
                        user_avg: 0.0,
                        sys_avg:  0.0,
                    },
                    queues: ProcessQueues::new(window),
                });
                (tracked, Observation::New)
            }
            Entry::Occupied(slot) => {
                let tracked = slot.into_mut();
                if tracked.record.name == sample.name {
                    (tracked, Observation::Updated)
                } else {
                    tracked.queues.clear();
                    let previous = tracked.record.name.clone();
                    (tracked, Observation::Reused { previous })
                }
            }
        };

        tracked.queues.user.enqueue(sample.user_secs);
        tracked.queues.sys.enqueue(sample.sys_secs);
        let user_avg = tracked.queues.user.average(round_to)?;
        let sys_avg = tracked.queues.sys.average(round_to)?;

        tracked.record = ProcessRecord {
            pid: sample.pid,
            name: sample.name,
            status: sample.status,
            user_avg,
            sys_avg,
        };

        Ok(observation)
    }

    /// Drop every pid not present in `seen`. Returns how many were removed.
    pub fn cull(&mut self, seen: &HashSet<u32>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|pid, _| seen.contains(pid));
        before - self.entries.len()
    }

    /// Run one full tick's worth of lookups: observe each, then cull pids
    /// that were not reported.
    ///
    /// Lookups that failed are skipped for this tick and, since their pid is
    /// not marked as seen, culled along with exited processes.
    pub fn reconcile<I>(&mut self, lookups: I) -> TickReport
    where
        I: IntoIterator<Item = Lookup>,
    {
        let mut report = TickReport::default();
        let mut seen = HashSet::new();

        for lookup in lookups {
            let sample = match lookup {
                Ok(sample) => sample,
                Err(CpuWatchError::TransientLookup { pid }) => {
                    debug!(pid, "process exited mid-scan; skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Skipping process entry: {e}");
                    report.skipped += 1;
                    continue;
                }
            };

            let pid = sample.pid;
            seen.insert(pid);
            report.observed += 1;

            match self.observe(sample) {
                Ok(Observation::New) => report.new += 1,
                Ok(Observation::Updated) => {}
                Ok(Observation::Reused { previous }) => {
                    debug!(pid, %previous, "pid reused; windows reset");
                    report.reused += 1;
                }
                Ok(Observation::Zombie { .. }) => report.zombies += 1,
                Err(e) => warn!(pid, "Failed to update process: {e}"),
            }
        }

        report.culled = self.cull(&seen);
        report.tracked = self.entries.len();
        report
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.entries.get(&pid).map(|t| &t.record)
    }

    pub fn queues(&self, pid: u32) -> Option<&ProcessQueues> {
        self.entries.get(&pid).map(|t| &t.queues)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All records in unspecified order.
    pub fn records(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.entries.values().map(|t| &t.record)
    }

    /// Owned copy of every record, sorted by name then pid.
    pub fn snapshot(&self) -> Vec<ProcessRecord> {
        let mut records: Vec<ProcessRecord> = self.records().cloned().collect();
        sort_for_display(&mut records);
        records
    }
}
