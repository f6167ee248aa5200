//! Consumers of a finished retention matrix.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use cohort_core::CohortResult;

use crate::matrix::RetentionMatrix;

/// What a sink produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutput {
    File(PathBuf),
    Displayed,
}

/// A destination for the retention matrix. Sinks never modify the matrix.
pub trait MatrixSink {
    fn name(&self) -> &'static str;

    fn consume(&self, matrix: &RetentionMatrix) -> CohortResult<SinkOutput>;
}

/// Prints the table as an aligned text grid.
pub struct TerminalDisplay<W: Write = std::io::Stdout> {
    out: Mutex<W>,
}

impl TerminalDisplay {
    pub fn stdout() -> Self {
        Self {
            out: Mutex::new(std::io::stdout()),
        }
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write> MatrixSink for TerminalDisplay<W> {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn consume(&self, matrix: &RetentionMatrix) -> CohortResult<SinkOutput> {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        write!(out, "{matrix}")?;
        out.flush()?;
        Ok(SinkOutput::Displayed)
    }
}
