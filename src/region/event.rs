//! Resolution of positional splicing-event identifiers.
//!
//! A positional identifier looks like `SE@chr10@20327164-20327391@20326099-20328102`:
//! the event type, the chromosome, and then type-specific coordinates. The
//! identifier alone does not say which introns bound the event, so the row for
//! the event is looked up in the results table for its type
//! (`<root>/results/splicing/PSI_<TYPE>.txt`) and the intron columns named by
//! that type's [`EventSchema`] are read from it.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;
use tracing::info;

use crate::errors::Error;
use crate::errors::Result;
use crate::region::parse_coordinate;
use crate::region::strip_chr;
use crate::region::GenomicInterval;
use crate::region::JunctionId;
use crate::region::Strand;

/// Directory, relative to the pipeline output root, holding the results tables.
pub const RESULTS_SUBDIRECTORY: [&str; 2] = ["results", "splicing"];

/// Prefix of the header line in a results table.
const HEADER_PREFIX: &str = "event_id";

//=============//
// Event types //
//=============//

/// The kinds of alternative splicing events reported by the upstream pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Skipped exon (`SE`).
    SkippedExon,
    /// Alternative 5' splice site (`FIVE`).
    FivePrimeSite,
    /// Alternative 3' splice site (`THREE`).
    ThreePrimeSite,
    /// Mutually exclusive exons (`MXE`).
    MutuallyExclusiveExons,
    /// Retained intron (`RI`).
    RetainedIntron,
    /// Alternative first exon (`AFE`).
    AlternativeFirstExon,
    /// Alternative last exon (`ALE`).
    AlternativeLastExon,
    /// Multiple skipped exons (`MSE`).
    MultipleSkippedExons,
}

impl EventType {
    /// The tag used for this event type in identifiers and file names.
    pub fn tag(&self) -> &'static str {
        self.schema().tag
    }

    /// The column layout for this event type.
    pub fn schema(&self) -> &'static EventSchema {
        // `EVENT_SCHEMAS` is laid out in declaration order.
        let index = match self {
            EventType::SkippedExon => 0,
            EventType::FivePrimeSite => 1,
            EventType::ThreePrimeSite => 2,
            EventType::MutuallyExclusiveExons => 3,
            EventType::RetainedIntron => 4,
            EventType::AlternativeFirstExon => 5,
            EventType::AlternativeLastExon => 6,
            EventType::MultipleSkippedExons => 7,
        };

        &EVENT_SCHEMAS[index]
    }

    /// The results table for this event type beneath `results_root`.
    pub fn results_table(&self, results_root: &Path) -> PathBuf {
        let mut path = results_root.to_path_buf();
        path.extend(RESULTS_SUBDIRECTORY);
        path.push(format!("PSI_{}.txt", self.tag()));
        path
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EVENT_SCHEMAS
            .iter()
            .find(|schema| schema.tag == s)
            .map(|schema| schema.event_type)
            .ok_or_else(|| Error::UnsupportedEventType(s.to_string()))
    }
}

//========//
// Schema //
//========//

/// How a junction's arc is anchored when drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArcDirection {
    /// The arc starts and ends at the coverage height of the flanking bases.
    FromCoverage,

    /// The arc starts and ends at zero, regardless of coverage.
    Baseline,
}

/// Which columns bound the plotted region for an event type.
#[derive(Debug)]
pub enum Bounds {
    /// Both the start and the end come from one intron column.
    Single(&'static str),

    /// The start comes from the first column and the end from the second.
    Pair(&'static str, &'static str),

    /// The column holds `;`-separated introns; the last one bounds the region.
    LastOfList(&'static str),
}

/// A results-table column holding junction coordinates.
#[derive(Debug)]
pub struct JunctionField {
    /// The column name.
    pub name: &'static str,

    /// Whether the column holds several `;`-separated junctions.
    pub multi: bool,

    /// How arcs for the junction(s) in this column are anchored.
    pub direction: ArcDirection,
}

/// The column layout of a results table for a single event type.
#[derive(Debug)]
pub struct EventSchema {
    /// The event type described.
    pub event_type: EventType,

    /// The identifier prefix and file name tag.
    pub tag: &'static str,

    /// The column(s) that bound the plotted region.
    pub bounds: Bounds,

    /// The columns holding the event's junctions.
    pub junctions: &'static [JunctionField],
}

const fn field(name: &'static str, direction: ArcDirection) -> JunctionField {
    JunctionField {
        name,
        multi: false,
        direction,
    }
}

use ArcDirection::Baseline;
use ArcDirection::FromCoverage;

/// Column layouts for every supported event type.
pub static EVENT_SCHEMAS: [EventSchema; 8] = [
    EventSchema {
        event_type: EventType::SkippedExon,
        tag: "SE",
        bounds: Bounds::Single("intron_c"),
        junctions: &[
            field("intron_a", FromCoverage),
            field("intron_b", FromCoverage),
            field("intron_c", Baseline),
        ],
    },
    EventSchema {
        event_type: EventType::FivePrimeSite,
        tag: "FIVE",
        bounds: Bounds::Single("intron_b"),
        junctions: &[field("intron_a", FromCoverage), field("intron_b", Baseline)],
    },
    EventSchema {
        event_type: EventType::ThreePrimeSite,
        tag: "THREE",
        bounds: Bounds::Single("intron_b"),
        junctions: &[field("intron_a", FromCoverage), field("intron_b", Baseline)],
    },
    EventSchema {
        event_type: EventType::MutuallyExclusiveExons,
        tag: "MXE",
        bounds: Bounds::Pair("intron_a1", "intron_a2"),
        junctions: &[
            field("intron_a1", FromCoverage),
            field("intron_a2", FromCoverage),
            field("intron_b1", Baseline),
            field("intron_b2", Baseline),
        ],
    },
    EventSchema {
        event_type: EventType::RetainedIntron,
        tag: "RI",
        bounds: Bounds::Single("intron_a"),
        junctions: &[field("intron_a", FromCoverage)],
    },
    EventSchema {
        event_type: EventType::AlternativeFirstExon,
        tag: "AFE",
        bounds: Bounds::Single("intron_a"),
        junctions: &[field("intron_a", FromCoverage), field("intron_b", Baseline)],
    },
    EventSchema {
        event_type: EventType::AlternativeLastExon,
        tag: "ALE",
        bounds: Bounds::Single("intron_a"),
        junctions: &[field("intron_a", FromCoverage), field("intron_b", Baseline)],
    },
    EventSchema {
        event_type: EventType::MultipleSkippedExons,
        tag: "MSE",
        bounds: Bounds::LastOfList("intron"),
        junctions: &[JunctionField {
            name: "intron",
            multi: true,
            direction: FromCoverage,
        }],
    },
];

//================//
// Resolved event //
//================//

/// A junction relevant to an event, with the way its arc should be anchored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedJunction {
    /// The junction.
    pub id: JunctionId,

    /// How the junction's arc is anchored. `None` means the default
    /// ([`ArcDirection::FromCoverage`]).
    pub direction: Option<ArcDirection>,
}

/// The outcome of resolving a positional identifier.
#[derive(Clone, Debug)]
pub struct ResolvedEvent {
    /// The positional identifier that was resolved.
    pub positional_id: String,

    /// The value of the first (`event_id`) column of the matched row.
    pub event_id: String,

    /// The event type.
    pub event_type: EventType,

    /// The plotted region, with the strand from the results table.
    pub interval: GenomicInterval,

    /// The event's junctions, in schema order.
    pub junctions: Vec<AnnotatedJunction>,

    /// The gene name, when the results table carries one.
    pub gene_name: Option<String>,
}

impl ResolvedEvent {
    /// The identifiers of the event's junctions.
    pub fn junction_ids(&self) -> Vec<JunctionId> {
        self.junctions.iter().map(|j| j.id.clone()).collect()
    }
}

//============//
// Resolution //
//============//

/// Resolves a positional identifier into the plotted region and the event's
/// junctions.
///
/// The region spans the bounding intron(s) of the event, widened by
/// `extend_downstream` bases on the left and `extend_upstream` bases on the
/// right, with the start clamped at zero.
pub fn resolve_event(
    positional_id: &str,
    results_root: &Path,
    extend_upstream: u64,
    extend_downstream: u64,
) -> Result<ResolvedEvent> {
    // (1) Determine the event type before touching the filesystem.
    let mut parts = positional_id.split('@');
    let event_type = parts.next().unwrap_or_default().parse::<EventType>()?;
    let chrom = match parts.next() {
        Some(c) if !c.is_empty() => strip_chr(c).to_string(),
        _ => return Err(Error::MalformedCoordinate(positional_id.to_string())),
    };
    let schema = event_type.schema();
    debug!("event type: {}, chromosome: {}", schema.tag, chrom);

    // (2) Find the row for this event in the results table.
    let path = event_type.results_table(results_root);
    if !path.exists() {
        return Err(Error::ResultsFileNotFound(path));
    }

    let file = File::open(&path).map_err(|e| Error::io(e, &path))?;
    let row = find_event_row(BufReader::new(file), &path, positional_id)?.ok_or_else(|| {
        Error::EventNotFound {
            event_id: positional_id.to_string(),
            path: path.clone(),
        }
    })?;

    // (3) Compute the plotted region from the bounding intron(s).
    let (first, last) = match schema.bounds {
        Bounds::Single(name) => {
            let value = row.get(&path, name)?;
            (value, value)
        }
        Bounds::Pair(start, end) => (row.get(&path, start)?, row.get(&path, end)?),
        Bounds::LastOfList(name) => {
            let value = row.get(&path, name)?;
            let last = value.rsplit(';').next().unwrap_or(value);
            (last, last)
        }
    };

    let (_, bound_start, _) = parse_coordinate(first)?;
    let (_, _, bound_end) = parse_coordinate(last)?;
    let start = bound_start.saturating_sub(extend_downstream);
    let end = bound_end.saturating_add(extend_upstream);

    let strand = Strand::parse(row.get(&path, "strand")?);
    let interval = GenomicInterval::new(chrom, start, end)?.with_strand(strand);

    // (4) Collect the event's junctions.
    let mut junctions = Vec::new();
    for field in schema.junctions {
        let value = row.get(&path, field.name)?;
        let ids: Vec<&str> = if field.multi {
            value.split(';').filter(|s| !s.is_empty()).collect()
        } else {
            vec![value]
        };

        for id in ids {
            junctions.push(AnnotatedJunction {
                id: JunctionId::new(id),
                direction: Some(field.direction),
            });
        }
    }

    let gene_name = row
        .get(&path, "gene_name")
        .ok()
        .filter(|s| !s.is_empty() && *s != "NA")
        .map(String::from);

    info!(
        "Resolved {} to {} ({} junction(s)).",
        positional_id,
        interval,
        junctions.len()
    );

    Ok(ResolvedEvent {
        positional_id: positional_id.to_string(),
        event_id: row.values.first().cloned().unwrap_or_default(),
        event_type,
        interval,
        junctions,
        gene_name,
    })
}

/// A data row of a results table, addressable by column name.
struct ResultsRow {
    columns: HashMap<String, usize>,
    values: Vec<String>,
}

impl ResultsRow {
    fn get(&self, path: &Path, name: &str) -> Result<&str> {
        let index = self.columns.get(name).ok_or_else(|| {
            Error::malformed_table(path, format!("missing column `{}`", name))
        })?;

        self.values.get(*index).map(String::as_str).ok_or_else(|| {
            Error::malformed_table(
                path,
                format!(
                    "row for `{}` has no value for column `{}`",
                    self.values.get(1).map(String::as_str).unwrap_or_default(),
                    name
                ),
            )
        })
    }
}

/// Scans a results table for the row whose second column equals
/// `positional_id`. The first match wins.
fn find_event_row<R: BufRead>(
    reader: R,
    path: &Path,
    positional_id: &str,
) -> Result<Option<ResultsRow>> {
    let mut columns: Option<HashMap<String, usize>> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| Error::io(e, path))?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.starts_with(HEADER_PREFIX) {
            columns = Some(
                line.split('\t')
                    .enumerate()
                    .map(|(i, name)| (name.to_string(), i))
                    .collect(),
            );
            continue;
        }

        if line.split('\t').nth(1) != Some(positional_id) {
            continue;
        }

        let columns = columns.ok_or_else(|| {
            Error::malformed_table(path, "data row appears before the header row")
        })?;

        return Ok(Some(ResultsRow {
            columns,
            values: line.split('\t').map(String::from).collect(),
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const SE_HEADER: &str =
        "event_id\tpos_id\tgene_name\tstrand\texon_a\texon_b\tintron_a\tintron_b\tintron_c";

    fn write_results(root: &Path, tag: &str, contents: &str) {
        let mut dir = root.to_path_buf();
        dir.extend(RESULTS_SUBDIRECTORY);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("PSI_{}.txt", tag)), contents).unwrap();
    }

    #[test]
    fn test_schema_lookup() {
        for schema in EVENT_SCHEMAS.iter() {
            assert_eq!(schema.event_type.schema().tag, schema.tag);
            assert_eq!(schema.tag.parse::<EventType>().unwrap(), schema.event_type);
        }
    }

    #[test]
    fn test_every_tag_parses_to_its_own_schema() {
        for tag in ["SE", "FIVE", "THREE", "MXE", "RI", "AFE", "ALE", "MSE"] {
            let event_type = tag.parse::<EventType>().unwrap();
            assert_eq!(event_type.tag(), tag);
        }
    }

    #[test]
    fn test_unsupported_event_type_does_not_scan() {
        // The results root does not exist at all: if a table were looked up,
        // the error would be `ResultsFileNotFound`.
        let err = resolve_event(
            "FOO@chr1@1-2@3-4",
            Path::new("/nonexistent/results/root"),
            0,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedEventType(ref t) if t == "FOO"));
    }

    #[test]
    fn test_missing_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_event("SE@chr1@100-200@50-300", dir.path(), 0, 0).unwrap_err();
        assert!(matches!(err, Error::ResultsFileNotFound(_)));
    }

    #[test]
    fn test_skipped_exon_clamps_start() {
        let dir = tempfile::tempdir().unwrap();
        let contents = format!(
            "{}\nSE_1\tSE@chr1@100-200@50-300\tGENE1\t+\tchr1:100-200\tchr1:300-400\tchr1:201-499\tchr1:401-599\tchr1:500-600\n",
            SE_HEADER
        );
        write_results(dir.path(), "SE", &contents);

        let event = resolve_event("SE@chr1@100-200@50-300", dir.path(), 1000, 1000).unwrap();
        assert_eq!(event.event_type, EventType::SkippedExon);
        assert_eq!(event.interval.chrom(), "1");
        assert_eq!(event.interval.display_chrom(), "chr1");
        assert_eq!(event.interval.start(), 0);
        assert_eq!(event.interval.end(), 1600);
        assert_eq!(event.interval.strand(), Some(Strand::Forward));
        assert_eq!(event.event_id, "SE_1");
        assert_eq!(event.gene_name.as_deref(), Some("GENE1"));

        let ids = event.junction_ids();
        assert_eq!(
            ids,
            vec![
                JunctionId::new("chr1:201-499"),
                JunctionId::new("chr1:401-599"),
                JunctionId::new("chr1:500-600"),
            ]
        );
        assert_eq!(event.junctions[2].direction, Some(ArcDirection::Baseline));
        assert_eq!(event.junctions[0].direction, Some(ArcDirection::FromCoverage));
    }

    #[test]
    fn test_event_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let contents = format!(
            "{}\nSE_1\tSE@chr1@100-200@50-300\tGENE1\t+\ta\tb\tchr1:1-2\tchr1:3-4\tchr1:5-6\n",
            SE_HEADER
        );
        write_results(dir.path(), "SE", &contents);

        let err = resolve_event("SE@chr1@100-200@50-301", dir.path(), 0, 0).unwrap_err();
        assert!(
            matches!(err, Error::EventNotFound { ref event_id, .. } if event_id == "SE@chr1@100-200@50-301")
        );
    }

    #[test]
    fn test_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        let contents = format!(
            "{}\nSE_1\tSE@2@1-2@3-4\tA\t-\ta\tb\tchr2:10-20\tchr2:30-40\tchr2:1000-2000\n\
             SE_2\tSE@2@1-2@3-4\tB\t+\ta\tb\tchr2:10-20\tchr2:30-40\tchr2:5000-6000\n",
            SE_HEADER
        );
        write_results(dir.path(), "SE", &contents);

        let event = resolve_event("SE@2@1-2@3-4", dir.path(), 10, 20).unwrap();
        assert_eq!(event.event_id, "SE_1");
        assert_eq!(event.interval.start(), 980);
        assert_eq!(event.interval.end(), 2010);
        assert_eq!(event.interval.strand(), Some(Strand::Reverse));
    }

    #[test]
    fn test_mutually_exclusive_exons_use_two_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "event_id\tpos_id\tstrand\tintron_a1\tintron_a2\tintron_b1\tintron_b2\n\
             MXE_7\tMXE@chr3@x@y\t+\tchr3:1000-1100\tchr3:1200-1300\tchr3:1000-1400\tchr3:1500-1600\n";
        write_results(dir.path(), "MXE", contents);

        let event = resolve_event("MXE@chr3@x@y", dir.path(), 100, 50).unwrap();
        assert_eq!(event.event_type, EventType::MutuallyExclusiveExons);
        assert_eq!(event.interval.start(), 950);
        assert_eq!(event.interval.end(), 1400);
        assert_eq!(event.junctions.len(), 4);
        assert_eq!(event.gene_name, None);
    }

    #[test]
    fn test_multiple_skipped_exons_split_junctions() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "event_id\tpos_id\tstrand\tintron\n\
             MSE_1\tMSE@chr4@z\t-\tchr4:100-200;chr4:300-400;chr4:500-900\n";
        write_results(dir.path(), "MSE", contents);

        let event = resolve_event("MSE@chr4@z", dir.path(), 0, 0).unwrap();
        assert_eq!(event.interval.start(), 500);
        assert_eq!(event.interval.end(), 900);
        assert_eq!(
            event.junction_ids(),
            vec![
                JunctionId::new("chr4:100-200"),
                JunctionId::new("chr4:300-400"),
                JunctionId::new("chr4:500-900"),
            ]
        );
    }

    #[test]
    fn test_malformed_intron_names_the_value() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "event_id\tpos_id\tstrand\tintron_a\n\
             RI_1\tRI@chr5@q\t+\tchr5:nope\n";
        write_results(dir.path(), "RI", contents);

        let err = resolve_event("RI@chr5@q", dir.path(), 0, 0).unwrap_err();
        assert!(matches!(err, Error::MalformedCoordinate(ref v) if v == "chr5:nope"));
    }

    #[test]
    fn test_missing_column_is_malformed_table() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "event_id\tpos_id\tstrand\n\
             RI_1\tRI@chr5@q\t+\n";
        write_results(dir.path(), "RI", contents);

        let err = resolve_event("RI@chr5@q", dir.path(), 0, 0).unwrap_err();
        assert!(matches!(err, Error::MalformedTable { ref reason, .. } if reason.contains("intron_a")));
    }
}
