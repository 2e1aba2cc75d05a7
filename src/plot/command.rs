//! Functionality related to the `sashimi` command itself.

use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use clap::Args;
use indexmap::IndexMap;
use tracing::debug;
use tracing::info;

use crate::coverage;
use crate::junctions::aggregate;
use crate::junctions::junctions_table_path;
use crate::junctions::Selection;
use crate::metadata::psi::psi_matrix_path;
use crate::metadata::psi::read_sample_psi;
use crate::metadata::ExperimentMetadata;
use crate::plot::order::assign_colors;
use crate::plot::order::resolve_order;
use crate::plot::render;
use crate::plot::Annotations;
use crate::plot::OutputFormat;
use crate::plot::RenderOptions;
use crate::plot::SashimiInputs;
use crate::plot::DEFAULT_DPI;
use crate::region::event::resolve_event;
use crate::region::resolve_explicit;

//========================//
// Command-line arguments //
//========================//

/// Command line arguments for `sashimi`.
#[derive(Args, Debug)]
pub struct SashimiArgs {
    /// Experiment table: tab-delimited, with `sample`, `bam`, and `group`
    /// columns.
    #[arg(short = 'e', long, value_name = "TSV")]
    pub experiment: PathBuf,

    /// Output directory of the splicing analysis run.
    #[arg(short = 's', long = "shiba", value_name = "PATH")]
    pub results_root: PathBuf,

    /// The image to write. The format follows the extension: `.png`, `.svg`,
    /// or `.html`.
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: PathBuf,

    /// The region to plot, as `chrom:start-end`.
    #[arg(
        short = 'c',
        long,
        value_name = "COORDINATE",
        conflicts_with = "id",
        required_unless_present = "id"
    )]
    pub coordinate: Option<String>,

    /// The positional identifier of the splicing event to plot.
    #[arg(long, value_name = "POSITIONAL_ID")]
    pub id: Option<String>,

    /// Samples to plot, in panel order (comma-separated).
    #[arg(long, value_name = "SAMPLES", value_delimiter = ',')]
    pub samples: Option<Vec<String>>,

    /// Groups to plot, in panel order (comma-separated).
    #[arg(long, value_name = "GROUPS", value_delimiter = ',')]
    pub groups: Option<Vec<String>>,

    /// One color per group, in group order (comma-separated).
    #[arg(long, value_name = "COLORS", value_delimiter = ',')]
    pub colors: Option<Vec<String>>,

    /// Bases added after the event, when plotting by identifier.
    #[arg(long, value_name = "BASES", default_value_t = 500)]
    pub extend_up: u64,

    /// Bases added before the event, when plotting by identifier.
    #[arg(long, value_name = "BASES", default_value_t = 500)]
    pub extend_down: u64,

    /// Resolution of raster output.
    #[arg(long, value_name = "DPI", default_value_t = DEFAULT_DPI)]
    pub dpi: u32,

    /// Font family for all text.
    #[arg(long, value_name = "FAMILY")]
    pub font_family: Option<String>,
}

//==============//
// Main command //
//==============//

/// Main method for the `sashimi` command.
pub fn plot(args: SashimiArgs) -> anyhow::Result<()> {
    info!("Starting sashimi plot...");

    //========//
    // Region //
    //========//

    let (interval, event) = match (&args.coordinate, &args.id) {
        (Some(coordinate), _) => (resolve_explicit(coordinate)?, None),
        (None, Some(id)) => {
            let event = resolve_event(id, &args.results_root, args.extend_up, args.extend_down)
                .with_context(|| format!("resolving event `{}`", id))?;
            info!(
                "  [*] Event: {} ({}, {} junction(s))",
                event.event_id,
                event.event_type.tag(),
                event.junctions.len()
            );
            (event.interval.clone(), Some(event))
        }
        (None, None) => bail!("either a coordinate or an event identifier is required"),
    };
    info!("  [*] Region: {}", interval);

    //===================//
    // Experiment layout //
    //===================//

    let metadata = ExperimentMetadata::read(&args.experiment)
        .with_context(|| format!("invalid experiment table: {}", args.experiment.display()))?;
    debug!("  [*] Samples in experiment table: {}", metadata.len());

    let options = RenderOptions {
        samples: args.samples,
        groups: args.groups,
        colors: args.colors,
        dpi: args.dpi,
        font_family: args.font_family,
    };

    // Everything that can be checked without reading alignments is checked
    // here, so a bad invocation fails fast.
    OutputFormat::from_path(&args.output)?;
    let order = resolve_order(
        &metadata,
        options.samples.as_deref(),
        options.groups.as_deref(),
    )?;
    assign_colors(&order.groups, options.colors.as_deref())?;

    //==========//
    // Coverage //
    //==========//

    let mut depth = IndexMap::new();
    for sample in &order.samples {
        let info = metadata
            .get(sample)
            .with_context(|| format!("sample `{}` is not in the experiment table", sample))?;

        debug!("  [*] Coverage for {} from {}", sample, info.bam.display());
        let values = coverage::extract(&info.bam, &interval)
            .with_context(|| format!("computing coverage for sample `{}`", sample))?;
        depth.insert(sample.clone(), values);
    }

    //===========//
    // Junctions //
    //===========//

    let table = junctions_table_path(&args.results_root);
    let ids = event
        .as_ref()
        .map(|event| event.junction_ids())
        .unwrap_or_default();
    let selection = match &event {
        Some(_) => Selection::Ids(&ids),
        None => Selection::Interval(&interval),
    };
    let junctions = aggregate(&table, selection)?;

    //=============//
    // Annotations //
    //=============//

    let annotations = match &event {
        Some(event) => {
            let psi = read_sample_psi(
                &psi_matrix_path(&args.results_root),
                &[event.event_id.as_str(), event.positional_id.as_str()],
                order.samples.iter().map(String::as_str),
            )?;

            Some(Annotations {
                event_label: event.positional_id.clone(),
                gene_name: event.gene_name.clone(),
                psi,
                junctions: event.junctions.clone(),
            })
        }
        None => None,
    };

    //========//
    // Render //
    //========//

    let inputs = SashimiInputs {
        interval: &interval,
        coverage: &depth,
        junctions: &junctions,
        metadata: &metadata,
        annotations: annotations.as_ref(),
    };

    render(&inputs, &options, &args.output)
        .with_context(|| format!("rendering {}", args.output.display()))?;
    info!("Wrote sashimi plot to {}.", args.output.display());

    Ok(())
}
