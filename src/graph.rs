#![cfg(feature = "web")]

use crate::analyzer::ProgressPoint;
use plotters::prelude::*;
use std::fs::remove_file;
use uuid::Uuid;

/// Configuration options for the reading pace chart
///
/// This structure contains the customizable properties for rendering the
/// per-line view time curve of a finished reading session.
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    /// Creates a default configuration for the reading pace chart
    ///
    /// # Returns
    /// * `ChartOptions` - 800x400 pixels with Japanese axis labels matching
    ///   the result page
    fn default() -> Self {
        Self {
            title: "読書ペース".to_string(),
            x_label: "進行度（%）".to_string(),
            y_label: "表示時間（秒）".to_string(),
            width: 800,
            height: 400,
        }
    }
}

/// Renders the reading pace curve as a PNG image
///
/// Plots how long each sampled line stayed in view against how far through
/// the passage it sits, the same curve the result page shows. Slow stretches
/// show up as peaks, skimmed stretches as valleys.
///
/// # Arguments
/// * `points` - Progress points from the scroll analysis, in reading order
/// * `options` - Chart styling options
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
///
/// # Implementation Notes
/// * Renders through a uniquely named temporary file, read back and removed
/// * Automatically scales both axes from the data
/// * Uses a blue line with dot markers on the sampled points
pub fn reading_pace_chart(
    points: &[ProgressPoint],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if points.is_empty() {
        return Err("no progress points to plot".into());
    }

    let filename = std::env::temp_dir().join(format!("suiren_chart_{}.png", Uuid::new_v4()));
    let filename = filename.to_string_lossy().into_owned();
    {
        let root =
            BitMapBackend::new(&filename, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let max_x = points.iter().map(|p| p.progress).fold(0.0_f64, f64::max);
        let max_y = points.iter().map(|p| p.view_time).fold(0.0_f64, f64::max);

        let x_range = 0.0..max_x + 1.0;
        let y_range = 0.0..max_y + 1.0;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(LineSeries::new(
            points.iter().map(|p| (p.progress, p.view_time)),
            &BLUE,
        ))?;

        chart.draw_series(
            points
                .iter()
                .map(|p| Circle::new((p.progress, p.view_time), 3, BLUE.filled())),
        )?;

        root.present()?;
    }

    let mut file = std::fs::File::open(&filename)?;
    let mut buffer = Vec::new();
    use std::io::Read;
    file.read_to_end(&mut buffer)?;
    remove_file(&filename)?;
    Ok(buffer)
}
