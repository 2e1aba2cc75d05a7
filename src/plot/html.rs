//! Interactive HTML output via `plotly`.

use std::path::Path;

use plotly::common::Fill;
use plotly::common::Line;
use plotly::common::Mode;
use plotly::common::Position;
use plotly::common::TickMode;
use plotly::common::Title;
use plotly::layout::Axis;
use plotly::layout::GridPattern;
use plotly::layout::LayoutGrid;
use plotly::layout::RowOrder;
use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use tracing::warn;

use crate::errors::Error;
use crate::errors::Result;
use crate::plot::figure::Figure;
use crate::plot::figure::Panel;
use crate::plot::figure::COVERAGE_ALPHA;
use crate::plot::geometry::ARC_SEGMENTS;
use crate::plot::FigureBackend;

/// Resolution assumed for sizes in the browser.
const SCREEN_DPI: f64 = 96.0;

/// The number of y axes `plotly` lets us configure individually.
const CONFIGURABLE_Y_AXES: usize = 8;

/// Rotation of the x tick labels, in degrees.
const X_TICK_ANGLE: f64 = -45.0;

/// Draws figures as standalone HTML pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlBackend;

impl FigureBackend for HtmlBackend {
    fn name(&self) -> &'static str {
        "html"
    }

    fn draw(&self, figure: &Figure, output: &Path) -> Result<()> {
        let plot = build_plot(figure);
        std::fs::write(output, plot.to_html()).map_err(|e| Error::io(e, output))
    }
}

/// The name of the y axis for the panel at `index` (`y`, `y2`, `y3`, ...).
fn y_axis_name(index: usize) -> String {
    match index {
        0 => String::from("y"),
        i => format!("y{}", i + 1),
    }
}

fn points_to_screen(points: f64) -> f64 {
    points * SCREEN_DPI / 72.0
}

/// Adds the traces for one panel.
fn add_panel(plot: &mut Plot, figure: &Figure, index: usize, panel: &Panel) {
    let y_axis = y_axis_name(index);
    let color = panel.color.to_css_rgba(1.0);

    // (1) Coverage.
    let (x, y): (Vec<f64>, Vec<f64>) = panel.area.iter().copied().unzip();
    let coverage = Scatter::new(x, y)
        .name(&panel.sample)
        .mode(Mode::Lines)
        .fill(Fill::ToZeroY)
        .fill_color(panel.color.to_css_rgba(COVERAGE_ALPHA))
        .line(Line::new().width(0.0))
        .x_axis("x")
        .y_axis(y_axis.as_str())
        .show_legend(false);
    plot.add_trace(coverage);

    // (2) Arcs.
    for arc in &panel.arcs {
        let (x, y): (Vec<f64>, Vec<f64>) = arc.curve.flatten(ARC_SEGMENTS).into_iter().unzip();
        let trace = Scatter::new(x, y)
            .name(arc.junction.as_str())
            .mode(Mode::Lines)
            .line(Line::new().color(color.clone()).width(points_to_screen(arc.width)))
            .x_axis("x")
            .y_axis(y_axis.as_str())
            .show_legend(false);
        plot.add_trace(trace);
    }

    // (3) Read counts at the arc midpoints.
    if !panel.arcs.is_empty() {
        let (x, y): (Vec<f64>, Vec<f64>) = panel.arcs.iter().map(|a| a.label_position()).unzip();
        let text = panel.arcs.iter().map(|a| a.reads.to_string()).collect::<Vec<_>>();
        let labels = Scatter::new(x, y)
            .mode(Mode::Text)
            .text_array(text)
            .text_position(Position::MiddleCenter)
            .x_axis("x")
            .y_axis(y_axis.as_str())
            .show_legend(false);
        plot.add_trace(labels);
    }

    // (4) The sample label.
    let (x0, x1) = figure.x_range;
    let label = Scatter::new(vec![x0 + (x1 - x0) * 0.01], vec![panel.y_max * 0.85])
        .mode(Mode::Text)
        .text_array(vec![panel.label.clone()])
        .text_position(Position::MiddleRight)
        .x_axis("x")
        .y_axis(y_axis.as_str())
        .show_legend(false);
    plot.add_trace(label);
}

/// Sets the range and description of the y axis at `index`.
fn configure_y_axis(layout: Layout, index: usize, panel: &Panel) -> Layout {
    let axis = Axis::new()
        .title(Title::new("Coverage"))
        .range(vec![0.0, panel.y_max])
        .show_grid(false)
        .zero_line(false);

    match index {
        0 => layout.y_axis(axis),
        1 => layout.y_axis2(axis),
        2 => layout.y_axis3(axis),
        3 => layout.y_axis4(axis),
        4 => layout.y_axis5(axis),
        5 => layout.y_axis6(axis),
        6 => layout.y_axis7(axis),
        7 => layout.y_axis8(axis),
        _ => layout,
    }
}

/// Builds the `plotly` plot for a figure.
pub fn build_plot(figure: &Figure) -> Plot {
    let mut plot = Plot::new();

    for (i, panel) in figure.panels.iter().enumerate() {
        add_panel(&mut plot, figure, i, panel);
    }

    if figure.panels.len() > CONFIGURABLE_Y_AXES {
        warn!(
            "Only the first {} of {} panels get a fixed coverage axis; the rest are auto-ranged.",
            CONFIGURABLE_Y_AXES,
            figure.panels.len()
        );
    }

    let (width, height) = figure.size_inches();
    let (x0, x1) = figure.x_range;
    let ticks = figure.x_ticks.iter().map(|t| *t as f64).collect::<Vec<_>>();
    let tick_text = figure.x_ticks.iter().map(|t| t.to_string()).collect::<Vec<_>>();

    let mut layout = Layout::new()
        .title(Title::new(&figure.title.join("<br>")))
        .show_legend(false)
        .width((width * SCREEN_DPI).round() as usize)
        .height((height * SCREEN_DPI).round() as usize)
        .grid(
            LayoutGrid::new()
                .rows(figure.panels.len())
                .columns(1)
                .pattern(GridPattern::Coupled)
                .row_order(RowOrder::TopToBottom),
        )
        .x_axis(
            Axis::new()
                .title(Title::new(&figure.x_label))
                .range(vec![x0, x1])
                .tick_mode(TickMode::Array)
                .tick_values(ticks)
                .tick_text(tick_text)
                .tick_angle(X_TICK_ANGLE)
                .show_grid(false),
        );

    for (i, panel) in figure.panels.iter().enumerate() {
        layout = configure_y_axis(layout, i, panel);
    }

    plot.set_layout(layout);
    plot
}
