//! Charts module - Figure model, rendering and display

mod comparison;
mod display;
mod plotter;
mod renderer;

pub use comparison::{
    core_inflation_figure, render_core_inflation_comparison, render_stock_market_comparison,
    stock_market_figure, CORE_INFLATION_CATEGORY, STOCK_MARKET_CATEGORY,
};
pub use display::{ChartDisplay, PngViewer};
pub use plotter::{Figure, LegendPlacement, Marker, Series, SeriesPoints, XAxis, PALETTE};
pub use renderer::{ChartError, StaticChartRenderer};
