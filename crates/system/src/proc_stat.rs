//! User/system CPU split from the Linux procfs `stat` file.

use std::io;
use std::sync::OnceLock;

/// Read `(user_secs, sys_secs)` for `pid` from `/proc/<pid>/stat`.
///
/// `ErrorKind::NotFound` means the process exited after it was listed.
pub fn read_cpu_times(pid: u32) -> io::Result<(f64, f64)> {
    let raw = std::fs::read_to_string(format!("/proc/{pid}/stat"))?;
    parse_cpu_times(&raw, clock_ticks_per_sec()).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, format!("malformed /proc/{pid}/stat"))
    })
}

/// Extract `utime` and `stime` (fields 14 and 15) converted to seconds.
///
/// The command name in field 2 may itself contain spaces and parentheses,
/// so fields are counted from the last `)`.
pub fn parse_cpu_times(stat: &str, ticks_per_sec: f64) -> Option<(f64, f64)> {
    let (_, rest) = stat.rsplit_once(')')?;
    let mut fields = rest.split_whitespace().skip(11);
    let utime = fields.next()?.parse::<u64>().ok()?;
    let stime = fields.next()?.parse::<u64>().ok()?;
    Some((utime as f64 / ticks_per_sec, stime as f64 / ticks_per_sec))
}

fn clock_ticks_per_sec() -> f64 {
    static TICKS: OnceLock<f64> = OnceLock::new();
    *TICKS.get_or_init(|| {
        // SAFETY: sysconf has no preconditions and only reads a constant.
        let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if ticks > 0 { ticks as f64 } else { 100.0 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utime_and_stime() {
        let stat = "1234 (bash) S 1 1234 1234 34816 1234 4194304 1500 0 0 0 250 75 0 0 20 0 1 0 100 0 0";
        assert_eq!(parse_cpu_times(stat, 100.0), Some((2.5, 0.75)));
    }

    #[test]
    fn command_with_parens_and_spaces() {
        let stat = "42 (Web Content (x)) R 1 42 42 0 -1 4194560 10 0 0 0 1000 500 0 0 20 0 30 0 5 0 0";
        assert_eq!(parse_cpu_times(stat, 100.0), Some((10.0, 5.0)));
    }

    #[test]
    fn truncated_stat_is_rejected() {
        assert_eq!(parse_cpu_times("1 (init) S 0 1", 100.0), None);
        assert_eq!(parse_cpu_times("garbage", 100.0), None);
    }

    #[test]
    fn reads_own_process() {
        let (user, sys) = read_cpu_times(std::process::id()).unwrap();
        assert!(user >= 0.0);
        assert!(sys >= 0.0);
    }

    #[test]
    fn missing_pid_is_not_found() {
        // pid_max never reaches u32::MAX.
        let err = read_cpu_times(u32::MAX).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
