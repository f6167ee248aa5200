use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::CohortResult;
use crate::types::{Granularity, CUSTOMER_ID_FIELD};

/// Root configuration for a cohort retention report. Loaded from environment
/// variables with the prefix `COHORT_RETENTION__` and an optional TOML file,
/// or built programmatically.
#[derive(Debug, Clone, Deserialize)]
pub struct CohortConfig {
    /// Field to aggregate; `customer_id` counts the customers themselves.
    #[serde(default = "default_metric_field")]
    pub metric_field: String,
    /// Strategy name, validated when the builder is created.
    #[serde(default = "default_aggregation")]
    pub aggregation: String,
    #[serde(default)]
    pub granularity: Granularity,
    /// Base name of the `.csv` and `.png` artifacts.
    #[serde(default = "default_save_as")]
    pub save_as: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Print the retention table to stdout after the artifacts are written.
    #[serde(default)]
    pub show: bool,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default = "default_width_in")]
    pub width_in: f64,
    #[serde(default = "default_height_in")]
    pub height_in: f64,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Write the ratio into each cell.
    #[serde(default = "default_annotate")]
    pub annotate: bool,
}

// Default functions
fn default_metric_field() -> String {
    CUSTOMER_ID_FIELD.to_string()
}
fn default_aggregation() -> String {
    "count-distinct".to_string()
}
fn default_save_as() -> String {
    "cohort".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_width_in() -> f64 {
    15.0
}
fn default_height_in() -> f64 {
    12.0
}
fn default_dpi() -> u32 {
    150
}
fn default_annotate() -> bool {
    true
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            width_in: default_width_in(),
            height_in: default_height_in(),
            dpi: default_dpi(),
            annotate: default_annotate(),
        }
    }
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            metric_field: default_metric_field(),
            aggregation: default_aggregation(),
            granularity: Granularity::default(),
            save_as: default_save_as(),
            output_dir: default_output_dir(),
            show: false,
            heatmap: HeatmapConfig::default(),
        }
    }
}

impl CohortConfig {
    /// Load configuration from environment variables.
    pub fn load() -> CohortResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, overridden by
    /// environment variables.
    pub fn load_from(path: Option<&Path>) -> CohortResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("COHORT_RETENTION")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(
            metric_field = %config.metric_field,
            aggregation = %config.aggregation,
            granularity = %config.granularity,
            "Cohort configuration loaded"
        );
        Ok(config)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.save_as))
    }

    pub fn png_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.png", self.save_as))
    }
}
