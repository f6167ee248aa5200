//! Retention heatmap: cohorts as rows, relative period index as columns.
//!
//! Drawn as SVG, then rasterized to PNG with resvg.

pub mod canvas;
pub mod color;

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use cohort_core::{CohortError, CohortResult, HeatmapConfig};

use crate::matrix::RetentionMatrix;
use crate::sink::{MatrixSink, SinkOutput};
use canvas::{Anchor, Canvas, TextStyle};
use color::{Color, ColorScale};

const POINTS_PER_INCH: f64 = 72.0;

/// Format with `sig` significant digits, printf `%g` style: trailing zeros
/// dropped, exponent form outside 1e-4..1e`sig`.
pub fn format_significant(value: f64, sig: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return if value == 0.0 { "0".into() } else { value.to_string() };
    }
    let sig = sig.max(1);
    let sci = format!("{:.*e}", sig - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= sig as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let precision = (sig as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{value:.precision$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Render the matrix to an SVG document sized by `config`.
pub fn render_svg(matrix: &RetentionMatrix, config: &HeatmapConfig) -> String {
    let fig_w = config.width_in * POINTS_PER_INCH;
    let fig_h = config.height_in * POINTS_PER_INCH;
    let mut canvas = Canvas::new(fig_w, fig_h);

    let Some((min, max)) = matrix.value_range() else {
        let style = TextStyle {
            size: 14.0,
            anchor: Anchor::Middle,
            ..Default::default()
        };
        canvas.text(fig_w / 2.0, fig_h / 2.0, "No cohort data", &style);
        return canvas.finish_svg();
    };
    let scale = ColorScale::new(min, max);
    let rows = matrix.transposed();
    let n_rows = rows.len();
    let n_cols = matrix.max_index();

    let tick_size = 10.0;
    let max_label = rows.iter().map(|(p, _)| p.label().len()).max().unwrap_or(4);
    let left = 40.0 + max_label as f64 * tick_size * 0.62;
    let top = 40.0;
    let right = 20.0;
    let bottom = 50.0;
    let plot_w = (fig_w - left - right).max(1.0);
    let plot_h = (fig_h - top - bottom).max(1.0);

    // Half a row of padding above and below keeps edge annotations inside.
    let cell_w = plot_w / n_cols as f64;
    let cell_h = plot_h / (n_rows as f64 + 1.0);
    let grid_top = top + cell_h * 0.5;

    let title = TextStyle {
        size: 13.0,
        anchor: Anchor::Middle,
        bold: true,
        ..Default::default()
    };
    canvas.text(
        left + plot_w / 2.0,
        top / 2.0,
        &format!("Retention ({} of {})", matrix.aggregation, matrix.metric_field),
        &title,
    );

    let annotation_size = (cell_h.min(cell_w) * 0.35).clamp(5.0, 14.0);
    for (row, (_, cells)) in rows.iter().enumerate() {
        let y = grid_top + row as f64 * cell_h;
        for (col, cell) in cells.iter().enumerate() {
            let Some(value) = cell else { continue };
            let x = left + col as f64 * cell_w;
            let fill = scale.color(*value);
            canvas.rect(x, y, cell_w, cell_h, fill);

            if config.annotate {
                let style = TextStyle {
                    size: annotation_size,
                    color: fill.contrasting_text(),
                    anchor: Anchor::Middle,
                    ..Default::default()
                };
                canvas.text(x + cell_w / 2.0, y + cell_h / 2.0, &format_significant(*value, 2), &style);
            }
        }
    }

    // Cohort labels stay upright.
    let y_tick = TextStyle {
        size: tick_size,
        anchor: Anchor::End,
        ..Default::default()
    };
    for (row, (cohort, _)) in rows.iter().enumerate() {
        let y = grid_top + (row as f64 + 0.5) * cell_h;
        canvas.text(left - 6.0, y, &cohort.label(), &y_tick);
    }

    let x_tick = TextStyle {
        size: tick_size,
        anchor: Anchor::Middle,
        ..Default::default()
    };
    let plot_bottom = top + plot_h;
    for col in 0..n_cols {
        let x = left + (col as f64 + 0.5) * cell_w;
        canvas.text(x, plot_bottom + 10.0, &(col + 1).to_string(), &x_tick);
    }

    let axis_label = TextStyle {
        size: 11.0,
        anchor: Anchor::Middle,
        ..Default::default()
    };
    canvas.text(left + plot_w / 2.0, plot_bottom + 32.0, "cohort_period", &axis_label);
    canvas.text_rotated(14.0, top + plot_h / 2.0, "cohort", &axis_label, -90.0);

    let frame = Color::rgb(80, 80, 80);
    canvas.line(left, top, left, plot_bottom, frame, 0.6);
    canvas.line(left, plot_bottom, left + plot_w, plot_bottom, frame, 0.6);

    canvas.finish_svg()
}

/// Convert an SVG document to PNG bytes at the given DPI.
pub fn svg_to_png(svg: &str, dpi: u32) -> CohortResult<Vec<u8>> {
    use resvg::{tiny_skia, usvg};

    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| CohortError::Render(e.to_string()))?;

    let scale = dpi as f32 / POINTS_PER_INCH as f32;
    let size = tree.size();
    let w = (size.width() * scale).ceil() as u32;
    let h = (size.height() * scale).ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| CohortError::Render(format!("cannot allocate {w}x{h} pixmap")))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| CohortError::Render(e.to_string()))
}

/// Writes `<base_name>.png`.
pub struct HeatmapRenderer {
    path: PathBuf,
    config: HeatmapConfig,
}

impl HeatmapRenderer {
    pub fn new(path: impl Into<PathBuf>, config: HeatmapConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MatrixSink for HeatmapRenderer {
    fn name(&self) -> &'static str {
        "heatmap"
    }

    fn consume(&self, matrix: &RetentionMatrix) -> CohortResult<SinkOutput> {
        if matrix.is_empty() {
            warn!(path = %self.path.display(), "Rendering heatmap for an empty retention matrix");
        }
        let svg = render_svg(matrix, &self.config);
        let png = svg_to_png(&svg, self.config.dpi)?;
        std::fs::write(&self.path, &png)?;
        info!(
            path = %self.path.display(),
            bytes = png.len(),
            dpi = self.config.dpi,
            "Retention heatmap written"
        );
        Ok(SinkOutput::File(self.path.clone()))
    }
}
