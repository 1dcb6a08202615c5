use crate::error::Result;
use crate::record::ProcessSample;

/// Outcome of reading one process-table entry.
///
/// `Err(CpuWatchError::TransientLookup)` marks a process that exited between
/// being listed and being read.
pub type Lookup = Result<ProcessSample>;

/// Anything that can list the processes currently on the machine.
///
/// Implementations discard whatever the OS reports beyond the fields of
/// [`ProcessSample`].
pub trait ProcessSource: Send {
    /// Take one pass over the process table.
    ///
    /// # Errors
    /// Fails only when the table as a whole cannot be read. Per-process
    /// failures are reported inside the returned list.
    fn enumerate(&mut self) -> Result<Vec<Lookup>>;
}

impl<S: ProcessSource + ?Sized> ProcessSource for Box<S> {
    fn enumerate(&mut self) -> Result<Vec<Lookup>> {
        (**self).enumerate()
    }
}
