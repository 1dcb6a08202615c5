use cpuwatch_core::{ProcessRegistry, ProcessSource, SnapshotSink, TickReport};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where the sampler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Between ticks, sleeping.
    Idle,
    /// Enumerating and reconciling.
    Sampling,
}

/// Periodic driver: enumerate → reconcile → cull → publish → sleep.
///
/// Owns the registry outright. Everything outside the sampler reads the
/// copies handed to its sinks.
pub struct Sampler<S> {
    source:   S,
    registry: ProcessRegistry,
    sinks:    Vec<Box<dyn SnapshotSink>>,
    period:   Duration,
    state:    SamplerState,
    ticks:    u64,
}

impl<S: ProcessSource> Sampler<S> {
    /// `period` is the sleep between the end of one tick and the start of
    /// the next, so a slow enumeration stretches the effective cadence.
    pub fn new(source: S, registry: ProcessRegistry, period: Duration) -> Self {
        Self {
            source,
            registry,
            sinks: Vec::new(),
            period,
            state: SamplerState::Idle,
            ticks: 0,
        }
    }

    /// Publish to `sink` after every tick.
    pub fn with_sink(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Completed ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one cycle without sleeping.
    ///
    /// A failed enumeration leaves the registry as it was rather than culling
    /// everything. Sink failures are logged. Neither is returned: one bad
    /// sample never stops the loop.
    pub fn tick(&mut self) -> TickReport {
        self.state = SamplerState::Sampling;

        let report = match self.source.enumerate() {
            Ok(lookups) => self.registry.reconcile(lookups),
            Err(e) => {
                warn!("Process enumeration failed; keeping previous registry: {e}");
                TickReport {
                    tracked: self.registry.len(),
                    ..TickReport::default()
                }
            }
        };

        for sink in &mut self.sinks {
            if let Err(e) = sink.publish(&self.registry) {
                warn!("Snapshot publish failed: {e}");
            }
        }

        self.ticks += 1;
        self.state = SamplerState::Idle;

        debug!(
            tick     = self.ticks,
            observed = report.observed,
            new      = report.new,
            reused   = report.reused,
            zombies  = report.zombies,
            skipped  = report.skipped,
            culled   = report.culled,
            tracked  = report.tracked,
            "tick complete"
        );
        report
    }

    /// Tick until `shutdown` turns `true` (or its sender is dropped), then
    /// hand the sampler back.
    ///
    /// Shutdown is only observed between ticks.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        info!(period = ?self.period, window = self.registry.avg_interval().get(), "Sampler started");

        while !*shutdown.borrow() {
            self.tick();

            tokio::select! {
                _ = tokio::time::sleep(self.period) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(ticks = self.ticks, "Sampler stopped");
        self
    }
}
