//src/plot.rs

use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::types::KrakenReportRow;

const PLOT_SIZE: (u32, u32) = (1200, 800);
const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);
const PLOT_TITLE: &str = "Percentage Distribution of Taxon IDs";

fn plot_err<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Plot(e.to_string())
}

/// Render a log-scale bar chart of taxon name vs. percentage.
/// The drawing area lives only for this call and is flushed before returning.
pub fn draw_abundance_plot<P: AsRef<Path>>(rows: &[KrakenReportRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    // Log axis needs a strictly positive floor below the smallest bar.
    let y_max = rows.iter().map(|r| r.percentage).fold(0.0_f64, f64::max) + 0.01;
    let y_min = rows
        .iter()
        .map(|r| r.percentage)
        .filter(|p| *p > 0.0)
        .fold(f64::INFINITY, f64::min)
        .min(y_max / 10.0)
        / 2.0;
    let y_min = if y_min.is_finite() && y_min > 0.0 { y_min } else { 1e-4 };

    let names: Vec<&str> = rows.iter().map(|r| r.taxon_name.as_str()).collect();
    let bars = rows.len().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(PLOT_TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(220)
        .y_label_area_size(80)
        .build_cartesian_2d((0..bars).into_segmented(), (y_min..y_max).log_scale())
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Taxon")
        .y_desc("Percent")
        .x_labels(bars)
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => names.get(*i).map(|s| s.to_string()).unwrap_or_default(),
            _ => String::new(),
        })
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(4)
                .baseline(y_min)
                .data(rows.iter().enumerate().map(|(i, r)| (i, r.percentage))),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Wrote abundance plot for {} taxa to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(taxon_id: u32, percentage: f64, name: &str) -> KrakenReportRow {
        KrakenReportRow {
            percentage,
            fragments_covered: 0,
            fragments_assigned: 0,
            rank_code: "S".parse().unwrap(),
            taxon_id,
            taxon_name: name.to_string(),
        }
    }

    #[test]
    fn test_plot_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let rows = vec![
            row(1, 0.7, "Human alphaherpesvirus 1"),
            row(2, 0.299, "Torque teno virus"),
            row(3, 0.001, "Escherichia virus Lambda"),
        ];
        draw_abundance_plot(&rows, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Torque teno virus"));
    }

    #[test]
    fn test_empty_plot_still_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        draw_abundance_plot(&[], &path).unwrap();
        assert!(path.exists());
    }
}
