//! Chart Plotter Module
//! Backend-independent figure model: what gets drawn, not how.
//!
//! A [`Figure`] is assembled the way one would script a plot (size, series,
//! title, axis labels, legend, tight layout) and is then handed to a
//! [`ChartDisplay`](super::ChartDisplay).

use chrono::NaiveDate;
use plotters::style::RGBColor;

/// Series colors, cycled in plot order.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// X-axis semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum XAxis {
    /// Ordinal labels, one slot each.
    Categories(Vec<String>),
    /// Calendar dates.
    Dates,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesPoints {
    /// One y value per category slot.
    Categorical(Vec<f64>),
    Dated(Vec<(NaiveDate, f64)>),
}

impl SeriesPoints {
    pub fn len(&self) -> usize {
        match self {
            SeriesPoints::Categorical(v) => v.len(),
            SeriesPoints::Dated(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn y_values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            SeriesPoints::Categorical(v) => Box::new(v.iter().copied()),
            SeriesPoints::Dated(v) => Box::new(v.iter().map(|(_, y)| *y)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
}

impl Marker {
    /// Point radius in pixels.
    pub fn radius(self) -> u32 {
        match self {
            Marker::Circle => 4,
        }
    }
}

/// One labelled line.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: SeriesPoints,
    pub marker: Marker,
}

impl Series {
    pub fn categorical(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            points: SeriesPoints::Categorical(values),
            marker: Marker::Circle,
        }
    }

    pub fn dated(label: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            label: label.into(),
            points: SeriesPoints::Dated(points),
            marker: Marker::Circle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendPlacement {
    /// Upper-right corner inside the plot area.
    Inside,
    /// Legend box's upper-left corner placed at `anchor`, in axes-relative
    /// coordinates (`(1.0, 1.0)` is the top-right corner of the axes).
    OutsideUpperLeft { anchor: (f64, f64) },
}

/// A complete chart description.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Canvas size in pixels.
    pub size: (u32, u32),
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_axis: XAxis,
    pub series: Vec<Series>,
    /// `None` until a legend is requested.
    pub legend: Option<LegendPlacement>,
    pub tight_layout: bool,
}

impl Figure {
    pub fn new(size: (u32, u32), x_axis: XAxis) -> Self {
        Self {
            size,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            x_axis,
            series: Vec::new(),
            legend: None,
            tight_layout: false,
        }
    }

    pub fn plot(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_axis_labels(&mut self, x: impl Into<String>, y: impl Into<String>) {
        self.x_label = x.into();
        self.y_label = y.into();
    }

    pub fn set_legend(&mut self, placement: LegendPlacement) {
        self.legend = Some(placement);
    }

    pub fn tight_layout(&mut self) {
        self.tight_layout = true;
    }

    /// Color assigned to the series at `index`.
    pub fn series_color(index: usize) -> RGBColor {
        PALETTE[index % PALETTE.len()]
    }

    /// Y bounds with 5% headroom on both sides; `0..1` when nothing is plotted.
    pub fn y_range(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for y in self.series.iter().flat_map(|s| s.points.y_values()) {
            if y.is_finite() {
                min = min.min(y);
                max = max.max(y);
            }
        }

        if !min.is_finite() {
            return (0.0, 1.0);
        }
        if min == max {
            let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.05 };
            return (min - pad, max + pad);
        }
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }

    /// Earliest and latest date across dated series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.series
            .iter()
            .filter_map(|s| match &s.points {
                SeriesPoints::Dated(points) => Some(points.iter().map(|(d, _)| *d)),
                SeriesPoints::Categorical(_) => None,
            })
            .flatten()
            .fold(None, |acc, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
    }

    /// File-name friendly version of the title.
    pub fn slug(&self) -> String {
        let base = self.title.split(':').next().unwrap_or_default();
        let slug = base
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect::<String>()
            .split('_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        if slug.is_empty() {
            "chart".to_string()
        } else {
            slug
        }
    }
}
