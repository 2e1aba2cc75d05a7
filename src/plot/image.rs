//! Raster (PNG) and vector (SVG) output.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::HPos;
use plotters::style::text_anchor::Pos;
use plotters::style::text_anchor::VPos;
use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::plot::color::Rgb;
use crate::plot::figure::font_size;
use crate::plot::figure::Figure;
use crate::plot::figure::Panel;
use crate::plot::figure::COVERAGE_ALPHA;
use crate::plot::figure::PANEL_HEIGHT_INCHES;
use crate::plot::figure::TITLE_LINE_INCHES;
use crate::plot::figure::X_AXIS_INCHES;
use crate::plot::geometry::ARC_SEGMENTS;
use crate::plot::FigureBackend;

/// Font family used when none is configured.
const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Width of the y axis labels and description, in inches.
const Y_AXIS_INCHES: f64 = 0.45;

/// Blank space to the right of each panel, in inches.
const RIGHT_MARGIN_INCHES: f64 = 0.15;

/// Length of an x axis tick mark, in points.
const TICK_LENGTH: f64 = 3.0;

/// Draws figures with `plotters`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageBackend {
    /// PNG via the bitmap backend.
    Png,

    /// SVG via the SVG backend.
    Svg,
}

impl FigureBackend for ImageBackend {
    fn name(&self) -> &'static str {
        match self {
            ImageBackend::Png => "png",
            ImageBackend::Svg => "svg",
        }
    }

    fn draw(&self, figure: &Figure, output: &Path) -> Result<()> {
        let size = figure.size_pixels();
        debug!("image size: {}x{} px", size.0, size.1);

        match self {
            ImageBackend::Png => {
                let root = BitMapBackend::new(output, size).into_drawing_area();
                draw_figure(&root, figure).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
            ImageBackend::Svg => {
                let root = SVGBackend::new(output, size).into_drawing_area();
                draw_figure(&root, figure).map_err(render_error)?;
                root.present().map_err(render_error)?;
            }
        }

        Ok(())
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

fn to_plotters(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Draws the whole figure onto `root`.
fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let family = figure
        .font_family
        .as_deref()
        .unwrap_or(DEFAULT_FONT_FAMILY);
    let (width, _) = root.dim_in_pixel();

    // (1) The title band, one line per title entry.
    let line_height = figure.inches_to_pixels(TITLE_LINE_INCHES);
    let (title_area, body) =
        root.split_vertically(line_height * figure.title.len() as u32);
    let title_style = (family, figure.points_to_pixels(font_size::TITLE))
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (i, line) in figure.title.iter().enumerate() {
        let y = line_height * i as u32 + line_height / 2;
        title_area.draw_text(line, &title_style, ((width / 2) as i32, y as i32))?;
    }

    // (2) One panel per sample; the last one also holds the x axis.
    let panel_height = figure.inches_to_pixels(PANEL_HEIGHT_INCHES);
    let mut rest = body;
    for (i, panel) in figure.panels.iter().enumerate() {
        if i + 1 < figure.panels.len() {
            let (area, below) = rest.split_vertically(panel_height);
            draw_panel(&area, figure, panel, family, false)?;
            rest = below;
        } else {
            draw_panel(&rest, figure, panel, family, true)?;
        }
    }

    Ok(())
}

/// Draws one panel onto `area`.
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    figure: &Figure,
    panel: &Panel,
    family: &str,
    is_bottom: bool,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let px = |points: f64| figure.points_to_pixels(points);
    let color = to_plotters(panel.color);
    let (x0, x1) = figure.x_range;

    let axis_height = if is_bottom {
        figure.inches_to_pixels(X_AXIS_INCHES)
    } else {
        0
    };

    let mut chart = ChartBuilder::on(area)
        .margin_right(figure.inches_to_pixels(RIGHT_MARGIN_INCHES))
        .x_label_area_size(axis_height)
        .y_label_area_size(figure.inches_to_pixels(Y_AXIS_INCHES))
        .build_cartesian_2d(x0..x1, 0.0..panel.y_max)?;

    // (1) Axes: only the y axis is drawn by the mesh.
    let y_fmt = |y: &f64| format!("{:.0}", y);
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(3)
        .y_label_formatter(&y_fmt)
        .y_label_style((family, px(font_size::TICK)))
        .y_desc("Coverage")
        .axis_desc_style((family, px(font_size::Y_LABEL)))
        .draw()?;

    // (2) Coverage.
    chart.draw_series(AreaSeries::new(
        panel.area.iter().copied(),
        0.0,
        color.mix(COVERAGE_ALPHA).filled(),
    ))?;

    // (3) Arcs, then their read counts on a white background.
    for arc in &panel.arcs {
        let stroke = px(arc.width).round().max(1.0) as u32;
        chart.draw_series(std::iter::once(PathElement::new(
            arc.curve.flatten(ARC_SEGMENTS),
            color.stroke_width(stroke),
        )))?;
    }

    let label_size = px(font_size::ARC_LABEL);
    let label_style = (family, label_size)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(panel.arcs.iter().map(|arc| {
        let text = arc.reads.to_string();
        let half_width = (text.len() as f64 * label_size * 0.3).ceil() as i32;
        let half_height = (label_size * 0.5).ceil() as i32;

        EmptyElement::at(arc.label_position())
            + Rectangle::new(
                [(-half_width, -half_height), (half_width, half_height)],
                WHITE.filled(),
            )
            + Text::new(text, (0, 0), label_style.clone())
    }))?;

    // (4) The sample label in the upper-left corner.
    let corner_style = (family, px(font_size::PANEL_LABEL))
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(std::iter::once(Text::new(
        panel.label.clone(),
        (x0 + (x1 - x0) * 0.01, panel.y_max * 0.85),
        corner_style,
    )))?;

    // (5) Ticks and the description under the bottom panel.
    if is_bottom {
        let base = area.get_base_pixel();
        let tick_length = px(TICK_LENGTH).round() as i32;
        let tick_style = (family, px(font_size::TICK))
            .into_font()
            .transform(FontTransform::Rotate270)
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Center));

        for tick in &figure.x_ticks {
            let (x, y) = chart.backend_coord(&(*tick as f64, 0.0));
            let (x, y) = (x - base.0, y - base.1);

            area.draw(&PathElement::new(vec![(x, y), (x, y + tick_length)], BLACK))?;
            area.draw_text(&tick.to_string(), &tick_style, (x, y + tick_length * 2))?;
        }

        let (width, height) = area.dim_in_pixel();
        let plot_left = chart.backend_coord(&(x0, 0.0)).0 - base.0;
        let plot_right = chart.backend_coord(&(x1, 0.0)).0 - base.0;
        let desc_style = (family, px(font_size::X_LABEL))
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));

        area.draw_text(
            &figure.x_label,
            &desc_style,
            (
                ((plot_left + plot_right) / 2).clamp(0, width as i32),
                height as i32 - tick_length,
            ),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indexmap::IndexMap;

    use super::*;
    use crate::junctions::JunctionCounts;
    use crate::metadata::ExperimentMetadata;
    use crate::metadata::SampleInfo;
    use crate::plot::render;
    use crate::plot::RenderOptions;
    use crate::plot::SashimiInputs;
    use crate::region::GenomicInterval;
    use crate::region::JunctionId;

    struct Inputs {
        interval: GenomicInterval,
        coverage: IndexMap<String, Vec<u64>>,
        junctions: JunctionCounts,
        metadata: ExperimentMetadata,
    }

    /// Two samples in two groups, each with two junctions inside the region.
    fn inputs() -> Inputs {
        let interval = GenomicInterval::new("chr1", 1_000, 2_000).unwrap();

        let mut metadata = ExperimentMetadata::new();
        let mut coverage = IndexMap::new();
        let mut junctions = JunctionCounts::new();
        for (sample, group, reads) in [("S1", "ref", 17), ("S2", "alt", 73)] {
            metadata.insert(
                sample,
                SampleInfo {
                    group: group.to_string(),
                    bam: PathBuf::from(format!("{}.bam", sample)),
                },
            );

            let depth = (0..1_000u64)
                .map(|i| if (200..300).contains(&i) || (500..800).contains(&i) { 30 } else { 5 })
                .collect();
            coverage.insert(sample.to_string(), depth);

            let mut counts = IndexMap::new();
            counts.insert(JunctionId::new("chr1:1300-1500"), reads);
            counts.insert(JunctionId::new("chr1:1300-1800"), 5);
            junctions.insert(sample.to_string(), counts);
        }

        Inputs {
            interval,
            coverage,
            junctions,
            metadata,
        }
    }

    fn render_to(inputs: &Inputs, output: &Path) {
        let inputs = SashimiInputs {
            interval: &inputs.interval,
            coverage: &inputs.coverage,
            junctions: &inputs.junctions,
            metadata: &inputs.metadata,
            annotations: None,
        };
        let options = RenderOptions {
            dpi: 100,
            ..Default::default()
        };

        render(&inputs, &options, output).unwrap();
    }

    #[test]
    fn test_names() {
        assert_eq!(ImageBackend::Png.name(), "png");
        assert_eq!(ImageBackend::Svg.name(), "svg");
    }

    #[test]
    fn test_to_plotters() {
        assert_eq!(
            to_plotters(Rgb(0x1f, 0x78, 0xb4)),
            RGBColor(0x1f, 0x78, 0xb4)
        );
    }

    #[test]
    fn test_draw_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plot.png");

        render_to(&inputs(), &output);

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_draw_svg() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("plot.svg");

        render_to(&inputs(), &output);

        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.starts_with("<svg"));

        let texts = [
            "chr1:1000-2000",
            "S1",
            "S2",
            "17",
            "73",
            "1000",
            "1900",
            "Genomic coordinate (chr1)",
        ];
        for text in texts {
            assert!(svg.contains(&format!("{}</text>", text)), "missing {}", text);
        }

        // Ticks are only drawn under the bottom panel.
        assert_eq!(svg.matches("1900</text>").count(), 1);

        // All ten tick labels are rotated.
        assert!(svg.matches("rotate(270,").count() >= 10);
    }
}
