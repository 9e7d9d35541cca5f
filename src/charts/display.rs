//! Chart display sinks.

use super::plotter::Figure;
use super::renderer::{ChartError, StaticChartRenderer};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Receives finished figures.
pub trait ChartDisplay {
    fn show(&mut self, figure: &Figure) -> Result<(), ChartError>;
}

/// Writes each figure as `{dir}/{slug}.png` and opens it in the system viewer.
pub struct PngViewer {
    output_dir: PathBuf,
    open_viewer: bool,
}

impl PngViewer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            open_viewer: true,
        }
    }

    /// Only write the PNG files.
    pub fn without_viewer(mut self) -> Self {
        self.open_viewer = false;
        self
    }

    pub fn path_for(&self, figure: &Figure) -> PathBuf {
        self.output_dir.join(format!("{}.png", figure.slug()))
    }
}

impl ChartDisplay for PngViewer {
    fn show(&mut self, figure: &Figure) -> Result<(), ChartError> {
        let png = StaticChartRenderer::render_png(figure)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(figure);
        fs::write(&path, png)?;
        info!(path = %path.display(), series = figure.series.len(), "chart written");

        if self.open_viewer {
            // Headless hosts have no viewer; the file is still there.
            if let Err(e) = open::that(&path) {
                warn!(path = %path.display(), error = %e, "could not open chart viewer");
            }
        }

        Ok(())
    }
}
