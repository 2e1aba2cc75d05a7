//! A fully laid out sashimi figure, ready to be drawn by any backend.
//!
//! Building a [`Figure`] performs every check and computation that can fail
//! for reasons other than I/O, so that nothing is written to disk unless the
//! whole figure can be produced.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;
use tracing::warn;

use crate::coverage::CoverageArray;
use crate::errors::Error;
use crate::errors::Result;
use crate::metadata::psi::PsiValues;
use crate::plot::color::Rgb;
use crate::plot::geometry::junction_arc;
use crate::plot::geometry::step_points;
use crate::plot::geometry::tick_positions;
use crate::plot::geometry::CubicBezier;
use crate::plot::geometry::LineWidthScale;
use crate::plot::geometry::Point;
use crate::plot::order::PanelOrder;
use crate::plot::SashimiInputs;
use crate::region::event::ArcDirection;
use crate::region::GenomicInterval;
use crate::region::JunctionId;

/// Figure width in inches.
pub const FIGURE_WIDTH_INCHES: f64 = 8.0;

/// Height of each sample panel in inches.
pub const PANEL_HEIGHT_INCHES: f64 = 1.0;

/// Height of each title line in inches.
pub const TITLE_LINE_INCHES: f64 = 0.25;

/// Height of the x axis ticks and description under the bottom panel, in
/// inches.
pub const X_AXIS_INCHES: f64 = 0.8;

/// Headroom above the tallest coverage value of a panel.
pub const Y_HEADROOM: f64 = 1.4;

/// Opacity of the coverage fill.
pub const COVERAGE_ALPHA: f64 = 0.8;

/// Font sizes, in points.
pub mod font_size {
    /// The figure title.
    pub const TITLE: f64 = 12.0;

    /// The sample label in the corner of each panel.
    pub const PANEL_LABEL: f64 = 10.0;

    /// The x axis description.
    pub const X_LABEL: f64 = 10.0;

    /// The y axis description.
    pub const Y_LABEL: f64 = 8.0;

    /// Read counts on arcs.
    pub const ARC_LABEL: f64 = 8.0;

    /// Tick labels.
    pub const TICK: f64 = 6.0;
}

/// One junction arc within a panel.
#[derive(Clone, Debug)]
pub struct Arc {
    /// The junction drawn.
    pub junction: JunctionId,

    /// Reads supporting the junction in this sample.
    pub reads: u64,

    /// The shape of the arc.
    pub curve: CubicBezier,

    /// Stroke width in points.
    pub width: f64,
}

impl Arc {
    /// Where the read count label is centred.
    pub fn label_position(&self) -> Point {
        self.curve.midpoint()
    }
}

/// One sample's coverage track and arcs.
#[derive(Clone, Debug)]
pub struct Panel {
    /// The sample shown.
    pub sample: String,

    /// The group color.
    pub color: Rgb,

    /// The text in the upper-left corner.
    pub label: String,

    /// The outline of the coverage area.
    pub area: Vec<Point>,

    /// The top of the y axis.
    pub y_max: f64,

    /// The junction arcs.
    pub arcs: Vec<Arc>,
}

/// A complete, backend-independent sashimi figure.
#[derive(Clone, Debug)]
pub struct Figure {
    /// Title lines, top first.
    pub title: Vec<String>,

    /// The x range shown by every panel.
    pub x_range: (f64, f64),

    /// Tick positions on the bottom panel.
    pub x_ticks: Vec<u64>,

    /// The description under the bottom panel.
    pub x_label: String,

    /// Panels, top first.
    pub panels: Vec<Panel>,

    /// Output resolution in dots per inch.
    pub dpi: u32,

    /// Font family for all text, if not the backend default.
    pub font_family: Option<String>,
}

impl Figure {
    /// The size of the figure in inches as `(width, height)`.
    pub fn size_inches(&self) -> (f64, f64) {
        (
            FIGURE_WIDTH_INCHES,
            PANEL_HEIGHT_INCHES * self.panels.len() as f64
                + TITLE_LINE_INCHES * self.title.len() as f64
                + X_AXIS_INCHES,
        )
    }

    /// Converts a length in inches to pixels at the figure's resolution.
    pub fn inches_to_pixels(&self, inches: f64) -> u32 {
        (inches * self.dpi as f64).round() as u32
    }

    /// The size of the figure in pixels at the figure's resolution.
    pub fn size_pixels(&self) -> (u32, u32) {
        let (width, height) = self.size_inches();
        (self.inches_to_pixels(width), self.inches_to_pixels(height))
    }

    /// Converts a size in points to pixels at the figure's resolution.
    pub fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

/// The text in the corner of a panel.
fn panel_label(sample: &str, psi: Option<&PsiValues>) -> String {
    match psi {
        None => sample.to_string(),
        Some(values) => match values.get(sample).copied().flatten() {
            Some(psi) => format!("{} (PSI = {:.2})", sample, psi),
            None => format!("{} (PSI = NA)", sample),
        },
    }
}

/// The title lines of the figure.
fn title_lines(inputs: &SashimiInputs<'_>) -> Vec<String> {
    let mut title = vec![inputs.interval.to_string()];

    if let Some(annotations) = inputs.annotations {
        let strand = inputs
            .interval
            .strand()
            .map_or_else(|| String::from("."), |s| s.to_string());
        title.push(format!(
            "{}, {} ({})",
            annotations.event_label,
            annotations.gene_name.as_deref().unwrap_or("NA"),
            strand
        ));
    }

    title
}

fn coverage_for<'a>(
    coverage: &'a IndexMap<String, CoverageArray>,
    interval: &GenomicInterval,
    sample: &str,
) -> Result<&'a CoverageArray> {
    let values = coverage
        .get(sample)
        .ok_or_else(|| Error::Render(format!("no coverage for sample `{}`", sample)))?;

    if values.len() as u64 != interval.len() {
        return Err(Error::Render(format!(
            "coverage for sample `{}` has {} value(s), expected {}",
            sample,
            values.len(),
            interval.len()
        )));
    }

    Ok(values)
}

/// Lays out the figure for the given inputs, panel order, and group colors.
pub fn build_figure(
    inputs: &SashimiInputs<'_>,
    order: &PanelOrder,
    colors: &IndexMap<String, Rgb>,
    dpi: u32,
    font_family: Option<&str>,
) -> Result<Figure> {
    let interval = inputs.interval;
    let directions: HashMap<&JunctionId, ArcDirection> = inputs
        .annotations
        .map(|a| {
            a.junctions
                .iter()
                .filter_map(|j| j.direction.map(|d| (&j.id, d)))
                .collect()
        })
        .unwrap_or_default();

    // (1) Line widths are scaled across every plotted sample.
    let empty = IndexMap::new();
    let per_sample = order
        .samples
        .iter()
        .map(|sample| {
            let counts = inputs.junctions.get(sample).unwrap_or_else(|| {
                warn!("No junction counts for sample `{}`.", sample);
                &empty
            });
            (sample, counts)
        })
        .collect::<Vec<_>>();

    let scale = LineWidthScale::from_counts(
        per_sample
            .iter()
            .flat_map(|(_, counts)| counts.values().copied()),
    )?;

    // (2) One panel per sample.
    let mut panels = Vec::with_capacity(per_sample.len());
    for (sample, counts) in per_sample {
        let info = inputs
            .metadata
            .get(sample)
            .ok_or_else(|| Error::UnknownSample(sample.clone()))?;
        let color = *colors
            .get(&info.group)
            .ok_or_else(|| Error::UnknownGroup(info.group.clone()))?;

        let coverage = coverage_for(inputs.coverage, interval, sample)?;
        let peak = coverage.iter().copied().max().unwrap_or(0);

        let mut arcs = Vec::new();
        for (junction, reads) in counts {
            let direction = directions
                .get(junction)
                .copied()
                .unwrap_or(ArcDirection::FromCoverage);

            if let Some(curve) = junction_arc(interval, coverage, junction, direction, peak)? {
                arcs.push(Arc {
                    junction: junction.clone(),
                    reads: *reads,
                    curve,
                    width: scale.width(*reads),
                });
            }
        }

        debug!(
            "panel `{}`: peak depth {}, {} arc(s)",
            sample,
            peak,
            arcs.len()
        );

        panels.push(Panel {
            sample: sample.clone(),
            color,
            label: panel_label(sample, inputs.annotations.and_then(|a| a.psi.as_ref())),
            area: step_points(interval.start(), coverage),
            y_max: (peak as f64 * Y_HEADROOM).max(1.0),
            arcs,
        });
    }

    Ok(Figure {
        title: title_lines(inputs),
        x_range: (interval.start() as f64, interval.end() as f64),
        x_ticks: tick_positions(interval),
        x_label: format!("Genomic coordinate ({})", interval.display_chrom()),
        panels,
        dpi,
        font_family: font_family.map(String::from),
    })
}
