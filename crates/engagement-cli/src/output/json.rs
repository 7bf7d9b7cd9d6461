//! JSON output adapter.

use anyhow::Result;
use engagement_core::{FileResult, ResultOutput};
use std::io::{self, Write};
use std::sync::Mutex;

/// Output layout for per-file results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLayout {
    /// One JSON object per line, written as results arrive.
    Lines,
    /// A single JSON array written on flush.
    Array {
        /// Pretty-print the array.
        pretty: bool,
    },
}

/// JSON output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    layout: JsonLayout,
    pending: Mutex<Vec<FileResult>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout(layout: JsonLayout) -> Self {
        Self::new(Box::new(io::stdout()), layout)
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>, layout: JsonLayout) -> Self {
        Self {
            writer: Mutex::new(writer),
            layout,
            pending: Mutex::new(Vec::new()),
        }
    }

    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, result: &FileResult) -> Result<()> {
        match self.layout {
            JsonLayout::Lines => self.write_line(&serde_json::to_string(result)?),
            JsonLayout::Array { .. } => {
                self.pending
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?
                    .push(result.clone());
                Ok(())
            }
        }
    }

    fn flush(&self) -> Result<()> {
        if let JsonLayout::Array { pretty } = self.layout {
            let results = std::mem::take(
                &mut *self
                    .pending
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?,
            );
            let json = if pretty {
                serde_json::to_string_pretty(&results)?
            } else {
                serde_json::to_string(&results)?
            };
            self.write_line(&json)?;
        }

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
