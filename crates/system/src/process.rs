use cpuwatch_core::{Lookup, ProcessSample, ProcessSource, ProcessStatus, Result};
use sysinfo::{Process, ProcessesToUpdate, System};

/// [`ProcessSource`] backed by the `sysinfo` process table.
///
/// On Linux the user/system split comes from `/proc/<pid>/stat`. Elsewhere
/// `sysinfo` only exposes total CPU time, which is reported as user time with
/// zero system time.
pub struct SysinfoSource {
    sys: System,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoSource {
    fn enumerate(&mut self) -> Result<Vec<Lookup>> {
        // true = forget processes that have exited since the last refresh
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        let lookups = self
            .sys
            .processes()
            .values()
            // Linux lists threads alongside processes; keep only the leaders.
            .filter(|p| p.thread_kind().is_none())
            .map(sample_process)
            .collect();

        Ok(lookups)
    }
}

fn sample_process(process: &Process) -> Lookup {
    let pid = process.pid().as_u32();
    let status = map_status(process.status());
    let (user_secs, sys_secs) = cpu_times(process)?;

    Ok(ProcessSample {
        pid,
        name: process.name().to_string_lossy().into_owned(),
        status,
        user_secs,
        sys_secs,
    })
}

#[cfg(target_os = "linux")]
fn cpu_times(process: &Process) -> Result<(f64, f64)> {
    use cpuwatch_core::CpuWatchError;

    let pid = process.pid().as_u32();
    crate::proc_stat::read_cpu_times(pid).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CpuWatchError::TransientLookup { pid },
        _ => CpuWatchError::Enumeration(format!("pid {pid}: {e}")),
    })
}

#[cfg(not(target_os = "linux"))]
fn cpu_times(process: &Process) -> Result<(f64, f64)> {
    Ok((process.accumulated_cpu_time() as f64 / 1000.0, 0.0))
}

fn map_status(status: sysinfo::ProcessStatus) -> ProcessStatus {
    use sysinfo::ProcessStatus as Os;
    match status {
        Os::Run                      => ProcessStatus::Running,
        Os::Sleep                    => ProcessStatus::Sleeping,
        Os::Idle                     => ProcessStatus::Idle,
        Os::Stop                     => ProcessStatus::Stopped,
        Os::Tracing                  => ProcessStatus::Tracing,
        Os::Zombie                   => ProcessStatus::Zombie,
        Os::Dead                     => ProcessStatus::Dead,
        Os::Waking                   => ProcessStatus::Waking,
        Os::Parked                   => ProcessStatus::Parked,
        Os::LockBlocked              => ProcessStatus::LockBlocked,
        Os::UninterruptibleDiskSleep => ProcessStatus::UninterruptibleDiskSleep,
        _                            => ProcessStatus::Unknown,
    }
}
