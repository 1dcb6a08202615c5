use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduler state of a process as last reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStatus {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "sleeping")]
    Sleeping,
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "stopped")]
    Stopped,
    #[serde(rename = "tracing-stop")]
    Tracing,
    #[serde(rename = "zombie")]
    Zombie,
    #[serde(rename = "dead")]
    Dead,
    #[serde(rename = "waking")]
    Waking,
    #[serde(rename = "parked")]
    Parked,
    #[serde(rename = "locked")]
    LockBlocked,
    #[serde(rename = "disk-sleep")]
    UninterruptibleDiskSleep,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ProcessStatus {
    /// Lowercase label, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running                  => "running",
            Self::Sleeping                 => "sleeping",
            Self::Idle                     => "idle",
            Self::Stopped                  => "stopped",
            Self::Tracing                  => "tracing-stop",
            Self::Zombie                   => "zombie",
            Self::Dead                     => "dead",
            Self::Waking                   => "waking",
            Self::Parked                   => "parked",
            Self::LockBlocked              => "locked",
            Self::UninterruptibleDiskSleep => "disk-sleep",
            Self::Unknown                  => "unknown",
        }
    }

    pub fn is_zombie(self) -> bool {
        self == Self::Zombie
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw entry from a process-table enumeration.
///
/// CPU times are cumulative since process start, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid:       u32,
    pub name:      String,
    pub status:    ProcessStatus,
    pub user_secs: f64,
    pub sys_secs:  f64,
}

/// The externally visible state of one tracked process.
///
/// Field order and names match the JSON served at `/cpu_usage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid:      u32,
    pub name:     String,
    pub status:   ProcessStatus,
    /// Rolling average of cumulative user CPU seconds.
    pub user_avg: f64,
    /// Rolling average of cumulative system CPU seconds.
    pub sys_avg:  f64,
}

impl ProcessRecord {
    /// Display order used by every snapshot: name ascending, then pid.
    pub fn display_order(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.name.cmp(&b.name).then(a.pid.cmp(&b.pid))
    }
}
