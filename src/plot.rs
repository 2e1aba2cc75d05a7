//! Rendering of sashimi plots.
//!
//! # Overview
//!
//! A sashimi plot stacks one panel per sample. Each panel shows the sample's
//! coverage as a filled step track in its group's color, with an arc for every
//! junction whose flanking bases fall inside the plotted region. Arcs are
//! labelled with the junction's read count and their width grows with it.
//!
//! Rendering happens in two stages. [`figure::build_figure`] turns the inputs
//! into a backend-independent [`figure::Figure`], performing every check that
//! does not involve I/O. A [`FigureBackend`] then draws that figure to disk:
//! [`image`] handles raster and vector images and [`html`] handles interactive
//! HTML pages.

pub mod color;
pub mod command;
pub mod figure;
pub mod geometry;
pub mod html;
pub mod image;
pub mod order;

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;
use tracing::info;

use crate::coverage::CoverageArray;
use crate::errors::Error;
use crate::errors::Result;
use crate::junctions::JunctionCounts;
use crate::metadata::psi::PsiValues;
use crate::metadata::ExperimentMetadata;
use crate::region::event::AnnotatedJunction;
use crate::region::GenomicInterval;

/// Default output resolution in dots per inch.
pub const DEFAULT_DPI: u32 = 300;

/// Event-level annotations, present when plotting a splicing event.
#[derive(Clone, Debug, Default)]
pub struct Annotations {
    /// The event identifier shown in the title.
    pub event_label: String,

    /// The gene the event belongs to.
    pub gene_name: Option<String>,

    /// Per-sample PSI values, if they could be read.
    pub psi: Option<PsiValues>,

    /// The event's junctions and their arc anchoring.
    pub junctions: Vec<AnnotatedJunction>,
}

/// Everything a sashimi plot is drawn from.
#[derive(Clone, Copy, Debug)]
pub struct SashimiInputs<'a> {
    /// The plotted region.
    pub interval: &'a GenomicInterval,

    /// Smoothed coverage for every plotted sample.
    pub coverage: &'a IndexMap<String, CoverageArray>,

    /// Junction read counts by sample.
    pub junctions: &'a JunctionCounts,

    /// Sample groups and alignment files.
    pub metadata: &'a ExperimentMetadata,

    /// Event annotations, in event mode.
    pub annotations: Option<&'a Annotations>,
}

/// Presentation options.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Explicit panel order.
    pub samples: Option<Vec<String>>,

    /// Explicit group order.
    pub groups: Option<Vec<String>>,

    /// Explicit group colors.
    pub colors: Option<Vec<String>>,

    /// Output resolution.
    pub dpi: u32,

    /// Font family for all text.
    pub font_family: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            samples: None,
            groups: None,
            colors: None,
            dpi: DEFAULT_DPI,
            font_family: None,
        }
    }
}

/// The kind of file written, chosen by the output file's extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// A PNG raster image.
    Png,

    /// An SVG vector image.
    Svg,

    /// An interactive HTML page.
    Html,
}

impl OutputFormat {
    /// Determines the output format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("png") => Ok(OutputFormat::Png),
            Some("svg") => Ok(OutputFormat::Svg),
            Some("html") | Some("htm") => Ok(OutputFormat::Html),
            _ => Err(Error::UnsupportedOutputFormat(path.to_path_buf())),
        }
    }

    /// The backend that draws this format.
    pub fn backend(&self) -> Box<dyn FigureBackend> {
        match self {
            OutputFormat::Png => Box::new(image::ImageBackend::Png),
            OutputFormat::Svg => Box::new(image::ImageBackend::Svg),
            OutputFormat::Html => Box::new(html::HtmlBackend),
        }
    }
}

//======================//
// Figure backend trait //
//======================//

/// Something that can write a laid out [`figure::Figure`] to disk.
pub trait FigureBackend {
    /// The name of this backend.
    fn name(&self) -> &'static str;

    /// Draws `figure` to `output`.
    fn draw(&self, figure: &figure::Figure, output: &Path) -> Result<()>;
}

/// Renders a sashimi plot for `inputs` to `output`.
///
/// The output format, panel order, colors, and figure layout are all resolved
/// before `output` is created.
pub fn render(inputs: &SashimiInputs<'_>, options: &RenderOptions, output: &Path) -> Result<()> {
    // (1) Validate the output format first.
    let format = OutputFormat::from_path(output)?;
    debug!("output format: {:?}", format);

    // (2) Resolve panel order and colors.
    let order = order::resolve_order(
        inputs.metadata,
        options.samples.as_deref(),
        options.groups.as_deref(),
    )?;
    let colors = order::assign_colors(&order.groups, options.colors.as_deref())?;

    // (3) Lay out the figure.
    let figure = figure::build_figure(
        inputs,
        &order,
        &colors,
        options.dpi,
        options.font_family.as_deref(),
    )?;

    // (4) Draw it.
    let backend = format.backend();
    info!(
        "Drawing {} panel(s) with the {} backend to {}.",
        figure.panels.len(),
        backend.name(),
        output.display()
    );
    backend.draw(&figure, output)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::metadata::SampleInfo;
    use crate::region::JunctionId;

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out/plot.PNG")).unwrap(),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("plot.svg")).unwrap(),
            OutputFormat::Svg
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("plot.html")).unwrap(),
            OutputFormat::Html
        );

        for path in ["plot.pdf", "plot", "plot.png.gz"] {
            assert!(matches!(
                OutputFormat::from_path(Path::new(path)),
                Err(Error::UnsupportedOutputFormat(_))
            ));
        }
    }

    #[test]
    fn test_render_validates_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let interval = GenomicInterval::new("chr1", 0, 100).unwrap();

        let mut metadata = ExperimentMetadata::new();
        let mut coverage = IndexMap::new();
        let mut junctions = JunctionCounts::new();
        for (sample, group) in [("S1", "ref"), ("S2", "alt")] {
            metadata.insert(
                sample,
                SampleInfo {
                    group: group.to_string(),
                    bam: PathBuf::from(format!("{}.bam", sample)),
                },
            );
            coverage.insert(sample.to_string(), vec![5; 100]);

            let mut counts = IndexMap::new();
            counts.insert(JunctionId::new("chr1:20-60"), 3);
            junctions.insert(sample.to_string(), counts);
        }

        let inputs = SashimiInputs {
            interval: &interval,
            coverage: &coverage,
            junctions: &junctions,
            metadata: &metadata,
            annotations: None,
        };

        // Too few colors.
        let output = dir.path().join("plot.png");
        let options = RenderOptions {
            colors: Some(Vec::new()),
            ..Default::default()
        };
        assert!(matches!(
            render(&inputs, &options, &output),
            Err(Error::ColorCountMismatch {
                colors: 0,
                groups: 2
            })
        ));
        assert!(!output.exists());

        // Unsupported extension.
        let output = dir.path().join("plot.pdf");
        assert!(matches!(
            render(&inputs, &RenderOptions::default(), &output),
            Err(Error::UnsupportedOutputFormat(_))
        ));
        assert!(!output.exists());
    }
}
