//! RIC-plane conjunction plot, rendered to a PNG and base64-encoded.
//! Only produced for sub-10km approaches (spec.md §4.8 step 9).

use crate::{ScreenerError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use plotters::prelude::*;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Render the secondary's radial/in-track offset from the primary
/// (origin) on a single scatter plot and return the base64-encoded PNG.
pub fn render_ric_plot(radial_km: f64, in_track_km: f64, min_dist_km: f64) -> Result<String> {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;
    let path = file.path().to_path_buf();

    {
        let root = BitMapBackend::new(&path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;

        let bound = (radial_km.abs().max(in_track_km.abs()).max(min_dist_km) * 1.5).max(1.0);

        let mut chart = ChartBuilder::on(&root)
            .caption("RIC conjunction geometry", ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(-bound..bound, -bound..bound)
            .map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;

        chart
            .configure_mesh()
            .x_desc("in-track (km)")
            .y_desc("radial (km)")
            .draw()
            .map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;

        chart
            .draw_series(std::iter::once(Circle::new((0.0, 0.0), 5, BLUE.filled())))
            .map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;

        chart
            .draw_series(std::iter::once(Circle::new(
                (in_track_km, radial_km),
                5,
                RED.filled(),
            )))
            .map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;

        root.present()
            .map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;
    }

    let bytes = std::fs::read(&path).map_err(|e| ScreenerError::PlotFailed(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}
