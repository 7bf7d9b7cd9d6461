//! Result output port for writing per-file classification results.

use crate::domain::FileResult;

/// Port for outputting classification results.
pub trait ResultOutput: Send + Sync {
    /// Writes a single result.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &FileResult) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
