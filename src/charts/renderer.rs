//! Static Chart Renderer
//! Draws a [`Figure`] with plotters into an RGB buffer and encodes it as PNG.
//!
//! Layout:
//! 1. Title centered above the plot
//! 2. Plot area with mesh, axis descriptions and one line per series
//! 3. Legend, either inside the plot (upper right) or in a strip to the
//!    right of it when the figure asks for an outside legend

use super::plotter::{Figure, LegendPlacement, SeriesPoints, XAxis};
use crate::data::ProcessorError;
use chrono::{Days, NaiveDate, Utc};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 20;
const LABEL_SIZE: u32 = 14;
const LEGEND_ROW_H: u32 = 20;
/// Rows shrink to this height before the legend wraps into more columns.
const LEGEND_MIN_ROW_H: u32 = 14;
const LEGEND_PAD: u32 = 4;
/// Share of the canvas width kept for the plot when the legend sits outside.
const OUTSIDE_PLOT_SHARE: f64 = 0.78;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Data error: {0}")]
    Data(#[from] ProcessorError),
    #[error("{country}: {column} is missing")]
    MissingDate {
        country: String,
        column: &'static str,
    },
    #[error("{country}: {column} value '{value}' is not a date")]
    InvalidDate {
        country: String,
        column: &'static str,
        value: String,
    },
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `figure` to PNG bytes.
    pub fn render_png(figure: &Figure) -> Result<Vec<u8>, ChartError> {
        let (width, height) = figure.size;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::draw(&root, figure)?;
            root.present().map_err(draw_err)?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ChartError::Draw("pixel buffer does not match canvas size".into()))?;
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }

    /// Draw onto any plotters backend.
    pub fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        figure: &Figure,
    ) -> Result<(), ChartError> {
        root.fill(&WHITE).map_err(draw_err)?;

        let (width, _) = root.dim_in_pixel();
        let (plot_area, legend_area) = match figure.legend {
            Some(LegendPlacement::OutsideUpperLeft { .. }) => {
                let split = (width as f64 * OUTSIDE_PLOT_SHARE) as u32;
                let (plot, legend) = root.split_horizontally(split);
                (plot, Some(legend))
            }
            _ => (root.clone(), None),
        };

        match &figure.x_axis {
            XAxis::Categories(categories) => Self::draw_categorical(&plot_area, figure, categories)?,
            XAxis::Dates => Self::draw_dated(&plot_area, figure)?,
        }

        if let (Some(area), Some(LegendPlacement::OutsideUpperLeft { anchor })) =
            (legend_area, figure.legend)
        {
            let (plot_w, plot_h) = plot_area.dim_in_pixel();
            let origin = Self::outside_legend_origin(
                anchor,
                (plot_w, plot_h),
                (Self::margin(figure) + TITLE_SIZE + 10) as i32,
            );
            Self::draw_outside_legend(&area, figure, origin)?;
        }

        Ok(())
    }

    fn margin(figure: &Figure) -> u32 {
        if figure.tight_layout {
            10
        } else {
            30
        }
    }

    fn draw_categorical<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        figure: &Figure,
        categories: &[String],
    ) -> Result<(), ChartError> {
        let (y_min, y_max) = figure.y_range();
        let slots = categories.len().max(1) as u32;

        let mut chart = ChartBuilder::on(area)
            .caption(&figure.title, (FONT, TITLE_SIZE))
            .margin(Self::margin(figure))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d((0..slots).into_segmented(), y_min..y_max)
            .map_err(draw_err)?;

        let label_for = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                categories.get(*i as usize).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len().max(1))
            .x_label_formatter(&label_for)
            .x_desc(figure.x_label.as_str())
            .y_desc(figure.y_label.as_str())
            .label_style((FONT, LABEL_SIZE))
            .draw()
            .map_err(draw_err)?;

        for (idx, series) in figure.series.iter().enumerate() {
            let SeriesPoints::Categorical(values) = &series.points else {
                continue;
            };
            let color = Figure::series_color(idx);
            chart
                .draw_series(
                    LineSeries::new(
                        values
                            .iter()
                            .enumerate()
                            .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v)),
                        color.stroke_width(2),
                    )
                    .point_size(series.marker.radius()),
                )
                .map_err(draw_err)?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        if matches!(figure.legend, Some(LegendPlacement::Inside)) && !figure.series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font((FONT, LABEL_SIZE))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        Ok(())
    }

    fn draw_dated<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        figure: &Figure,
    ) -> Result<(), ChartError> {
        let (y_min, y_max) = figure.y_range();
        let (start, end) = Self::padded_date_range(figure.date_range());

        let mut chart = ChartBuilder::on(area)
            .caption(&figure.title, (FONT, TITLE_SIZE))
            .margin(Self::margin(figure))
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(start..end, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m-%d").to_string())
            .x_desc(figure.x_label.as_str())
            .y_desc(figure.y_label.as_str())
            .label_style((FONT, LABEL_SIZE))
            .draw()
            .map_err(draw_err)?;

        for (idx, series) in figure.series.iter().enumerate() {
            let SeriesPoints::Dated(points) = &series.points else {
                continue;
            };
            let color = Figure::series_color(idx);
            chart
                .draw_series(
                    LineSeries::new(points.iter().copied(), color.stroke_width(2))
                        .point_size(series.marker.radius()),
                )
                .map_err(draw_err)?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        if matches!(figure.legend, Some(LegendPlacement::Inside)) && !figure.series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font((FONT, LABEL_SIZE))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        Ok(())
    }

    /// Date axis bounds: data range widened by 15 days per side. An empty
    /// figure gets a window around today.
    fn padded_date_range(range: Option<(NaiveDate, NaiveDate)>) -> (NaiveDate, NaiveDate) {
        let (lo, hi) = range.unwrap_or_else(|| {
            let today = Utc::now().date_naive();
            (today, today)
        });
        let pad = Days::new(15);
        (
            lo.checked_sub_days(pad).unwrap_or(lo),
            hi.checked_add_days(pad).unwrap_or(hi),
        )
    }

    /// Pixel position, inside the legend strip, of the legend's upper-left
    /// corner. `top` is where the axes start vertically.
    fn outside_legend_origin(anchor: (f64, f64), plot_size: (u32, u32), top: i32) -> (i32, i32) {
        let (plot_w, plot_h) = plot_size;
        let x = ((anchor.0 - 1.0) * plot_w as f64).max(0.0) as i32;
        let y = top + ((1.0 - anchor.1) * plot_h as f64).max(0.0) as i32;
        (x, y)
    }

    /// Fit `entries` legend rows into `avail_h` pixels: full-height rows in one
    /// column if they fit, else compact rows, else compact rows in columns.
    fn legend_grid(entries: usize, avail_h: u32) -> LegendGrid {
        let inner = avail_h.saturating_sub(2 * LEGEND_PAD);
        let capacity = |row_h: u32| ((inner / row_h) as usize).max(1);

        let row_h = if capacity(LEGEND_ROW_H) >= entries {
            LEGEND_ROW_H
        } else {
            LEGEND_MIN_ROW_H
        };
        let rows = capacity(row_h).min(entries.max(1));
        LegendGrid {
            rows,
            columns: entries.div_ceil(rows).max(1),
            row_h,
        }
    }

    fn draw_outside_legend<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        figure: &Figure,
        origin: (i32, i32),
    ) -> Result<(), ChartError> {
        if figure.series.is_empty() {
            return Ok(());
        }

        let (area_w, area_h) = area.dim_in_pixel();
        let (x0, y0) = origin;
        let avail_h = (area_h as i32 - y0 - Self::margin(figure) as i32).max(0) as u32;
        let grid = Self::legend_grid(figure.series.len(), avail_h);

        let box_right = (area_w as i32 - 6).max(x0 + 40);
        let col_w = (box_right - x0) / grid.columns as i32;
        let row_h = grid.row_h as i32;
        let font_size = grid.row_h * 7 / 10;

        area.draw(&Rectangle::new(
            [
                (x0, y0),
                (box_right, y0 + grid.rows as i32 * row_h + 2 * LEGEND_PAD as i32),
            ],
            BLACK.stroke_width(1),
        ))
        .map_err(draw_err)?;

        for (idx, series) in figure.series.iter().enumerate() {
            let color = Figure::series_color(idx);
            let (col, row) = ((idx / grid.rows) as i32, (idx % grid.rows) as i32);
            let x = x0 + col * col_w + 6;
            let y = y0 + LEGEND_PAD as i32 + row * row_h + row_h / 2;
            let radius = series.marker.radius().min(grid.row_h / 3);

            area.draw(&PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)))
                .map_err(draw_err)?;
            area.draw(&Circle::new((x + 10, y), radius, color.filled()))
                .map_err(draw_err)?;
            area.draw(&Text::new(
                series.label.as_str(),
                (x + 26, y - font_size as i32 / 2),
                (FONT, font_size),
            ))
            .map_err(draw_err)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LegendGrid {
    rows: usize,
    columns: usize,
    row_h: u32,
}
