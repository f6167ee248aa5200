//! CSV export of the retention table, cohorts as rows.

use std::path::{Path, PathBuf};
use tracing::info;

use cohort_core::CohortResult;

use crate::matrix::RetentionMatrix;
use crate::sink::{MatrixSink, SinkOutput};

/// Render the transposed matrix: header `cohort,1,2,…`, one row per cohort,
/// empty fields where a cohort has no observation at that index.
pub fn to_csv(matrix: &RetentionMatrix) -> String {
    let mut header = vec!["cohort".to_string()];
    header.extend((1..=matrix.max_index()).map(|i| i.to_string()));

    let mut csv = header.join(",");
    csv.push('\n');
    for (cohort, cells) in matrix.transposed() {
        let mut fields = vec![quote(&cohort.label())];
        fields.extend(cells.into_iter().map(|cell| match cell {
            Some(v) => format!("{v:?}"),
            None => String::new(),
        }));
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes `<base_name>.csv`.
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MatrixSink for CsvExporter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn consume(&self, matrix: &RetentionMatrix) -> CohortResult<SinkOutput> {
        let csv = to_csv(matrix);
        std::fs::write(&self.path, &csv)?;
        info!(path = %self.path.display(), bytes = csv.len(), "Retention CSV written");
        Ok(SinkOutput::File(self.path.clone()))
    }
}
