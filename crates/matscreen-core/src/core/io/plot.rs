use super::display_path;
use super::results::OutputError;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::fmt;
use std::path::Path;
use tracing::info;

const CHART_SIZE: (u32, u32) = (800, 600);
const START_ANGLE_DEG: f64 = 140.0;
const TRUE_POSITIVE_COLOR: RGBColor = RGBColor(0x66, 0xc2, 0xa5);
const FALSE_POSITIVE_COLOR: RGBColor = RGBColor(0xfc, 0x8d, 0x62);

fn plot_error(path: &Path, e: impl fmt::Display) -> OutputError {
    OutputError::Plot {
        path: display_path(path),
        message: e.to_string(),
    }
}

/// Draws the true-positive / false-positive split of a run as an SVG pie chart
/// titled with the synthesis rate.
pub fn write_synthesis_pie(
    path: &Path,
    true_positive: usize,
    false_positive: usize,
) -> Result<(), OutputError> {
    let total = true_positive + false_positive;
    if total == 0 {
        return Err(plot_error(path, "no materials to plot"));
    }
    let synthesis_rate = true_positive as f64 * 100.0 / total as f64;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_error(path, e))?;
    let area = root
        .titled(
            &format!("P-Syn: {:.2}%", synthesis_rate),
            ("sans-serif", 28).into_font(),
        )
        .map_err(|e| plot_error(path, e))?;

    let (width, height) = area.dim_in_pixel();
    let center = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let radius = f64::from(width.min(height)) * 0.35;

    let slices = [
        ("True Positive", true_positive, TRUE_POSITIVE_COLOR),
        ("False Positive", false_positive, FALSE_POSITIVE_COLOR),
    ];

    let mut start = START_ANGLE_DEG;
    for (label, count, color) in slices {
        if count == 0 {
            continue;
        }
        let fraction = count as f64 / total as f64;
        let sweep = 360.0 * fraction;

        area.draw(&Polygon::new(
            sector_points(center, radius, start, sweep),
            color.filled(),
        ))
        .map_err(|e| plot_error(path, e))?;

        let mid = (start + sweep / 2.0).to_radians();
        let label_pos = polar(center, radius * 1.12, mid);
        area.draw(&Text::new(
            format!("{} ({:.1}%)", label, fraction * 100.0),
            label_pos,
            ("sans-serif", 18).into_font(),
        ))
        .map_err(|e| plot_error(path, e))?;

        start += sweep;
    }

    root.present().map_err(|e| plot_error(path, e))?;
    info!("Wrote synthesis pie chart to {:?}", path);
    Ok(())
}

fn polar(center: (f64, f64), radius: f64, angle_rad: f64) -> (i32, i32) {
    (
        (center.0 + radius * angle_rad.cos()).round() as i32,
        (center.1 - radius * angle_rad.sin()).round() as i32,
    )
}

fn sector_points(center: (f64, f64), radius: f64, start_deg: f64, sweep_deg: f64) -> Vec<(i32, i32)> {
    let steps = sweep_deg.ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    if sweep_deg < 360.0 {
        points.push((center.0.round() as i32, center.1.round() as i32));
    }
    for i in 0..=steps {
        let angle = start_deg + sweep_deg * i as f64 / steps as f64;
        points.push(polar(center, radius, angle * PI / 180.0));
    }
    points
}
