//! Per-sample junction read counts for a region.
//!
//! The upstream pipeline writes a genome-wide junction table
//! (`<root>/junctions/junctions.bed`): a header row starting with
//! `chr\tstart`, then one row per junction with the columns
//! `chrom, start, end, id` followed by one read-count column per sample.
//!
//! [`aggregate`] selects rows either by junction identifier or by containment
//! in a region and returns the counts per sample.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use num_format::Locale;
use num_format::ToFormattedString;
use tracing::debug;
use tracing::info;

use crate::errors::Error;
use crate::errors::Result;
use crate::region::GenomicInterval;
use crate::region::JunctionId;

/// Prefix of the header line in the junction table.
const HEADER_PREFIX: &str = "chr\tstart";

/// The number of leading coordinate/identifier columns before the samples.
const FIXED_COLUMNS: usize = 4;

/// Read counts keyed by sample, then by junction.
pub type JunctionCounts = IndexMap<String, IndexMap<JunctionId, u64>>;

/// Which rows of the junction table to keep.
#[derive(Clone, Copy, Debug)]
pub enum Selection<'a> {
    /// Keep junctions on the region's chromosome whose start and end both fall
    /// strictly inside the region.
    Interval(&'a GenomicInterval),

    /// Keep exactly the listed junctions.
    Ids(&'a [JunctionId]),
}

/// The location of the junction table beneath `results_root`.
pub fn junctions_table_path(results_root: &Path) -> PathBuf {
    results_root.join("junctions").join("junctions.bed")
}

/// Reads the selected junctions' read counts from the junction table at
/// `table`.
pub fn aggregate(table: &Path, selection: Selection<'_>) -> Result<JunctionCounts> {
    if !table.exists() {
        return Err(Error::JunctionsFileNotFound(table.to_path_buf()));
    }

    let file = File::open(table).map_err(|e| Error::io(e, table))?;
    let counts = read_counts(BufReader::new(file), table, selection)?;

    let junctions = counts.values().map(IndexMap::len).max().unwrap_or(0);
    info!(
        "Selected {} junction(s) across {} sample(s) from {}.",
        junctions.to_formatted_string(&Locale::en),
        counts.len(),
        table.display()
    );

    Ok(counts)
}

/// Reads the selected junctions' read counts from an already opened junction
/// table. `path` is only used for error messages.
pub fn read_counts<R: BufRead>(
    reader: R,
    path: &Path,
    selection: Selection<'_>,
) -> Result<JunctionCounts> {
    let wanted: Option<HashSet<&str>> = match selection {
        Selection::Ids(ids) => Some(ids.iter().map(JunctionId::as_str).collect()),
        Selection::Interval(_) => None,
    };

    let mut samples: Option<Vec<String>> = None;
    let mut counts = JunctionCounts::new();
    let mut scanned = 0usize;

    for line in reader.lines() {
        let line = line.map_err(|e| Error::io(e, path))?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        // (1) The header names the samples and seeds an entry for each.
        if line.starts_with(HEADER_PREFIX) {
            let names = line
                .split('\t')
                .skip(FIXED_COLUMNS)
                .map(String::from)
                .collect::<Vec<_>>();
            for name in &names {
                counts.entry(name.clone()).or_default();
            }
            samples = Some(names);
            continue;
        }

        let samples = samples.as_ref().ok_or_else(|| {
            Error::malformed_table(path, "data row appears before the header row")
        })?;

        scanned += 1;
        let fields = line.split('\t').collect::<Vec<_>>();
        if fields.len() < FIXED_COLUMNS + samples.len() {
            return Err(Error::malformed_table(
                path,
                format!("row has too few columns: `{}`", line),
            ));
        }

        // (2) Decide whether the row is selected.
        let id = fields[3];
        let selected = match selection {
            Selection::Ids(_) => wanted.as_ref().map_or(false, |w| w.contains(id)),
            Selection::Interval(interval) => {
                interval.is_on_chromosome(fields[0])
                    && interval.strictly_contains(parse_count(path, fields[1])?)
                    && interval.strictly_contains(parse_count(path, fields[2])?)
            }
        };

        if !selected {
            continue;
        }

        // (3) Record the read count for every sample.
        let id = JunctionId::new(id);
        for (sample, value) in samples.iter().zip(&fields[FIXED_COLUMNS..]) {
            let reads = parse_count(path, value)?;
            counts
                .entry(sample.clone())
                .or_default()
                .insert(id.clone(), reads);
        }
    }

    debug!("scanned {} junction row(s)", scanned);
    Ok(counts)
}

fn parse_count(path: &Path, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::malformed_table(path, format!("invalid integer `{}`", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "chr\tstart\tend\tID\tS1\tS2\n\
        chr1\t150\t180\tchr1:150-180\t5\t0\n\
        chr1\t100\t180\tchr1:100-180\t7\t1\n\
        chr1\t150\t200\tchr1:150-200\t3\t3\n\
        chr2\t150\t180\tchr2:150-180\t9\t9\n\
        1\t120\t130\t1:120-130\t2\t4\n";

    fn read(selection: Selection<'_>) -> Result<JunctionCounts> {
        read_counts(TABLE.as_bytes(), Path::new("junctions.bed"), selection)
    }

    #[test]
    fn test_interval_excludes_boundaries_and_other_chromosomes() {
        let interval = GenomicInterval::new("1", 100, 200).unwrap();
        let counts = read(Selection::Interval(&interval)).unwrap();

        assert_eq!(counts.len(), 2);
        let s1 = &counts["S1"];
        assert_eq!(
            s1.keys().map(JunctionId::as_str).collect::<Vec<_>>(),
            vec!["chr1:150-180", "1:120-130"]
        );
        assert_eq!(s1["chr1:150-180"], 5);
        assert_eq!(counts["S2"]["1:120-130"], 4);
        assert!(!s1.contains_key("chr2:150-180"));
    }

    #[test]
    fn test_ids_selection_ignores_duplicates_and_order() {
        let ids = vec![
            JunctionId::new("chr2:150-180"),
            JunctionId::new("chr1:100-180"),
            JunctionId::new("chr2:150-180"),
        ];
        let counts = read(Selection::Ids(&ids)).unwrap();

        assert_eq!(counts["S1"].len(), 2);
        assert_eq!(counts["S1"]["chr1:100-180"], 7);
        assert_eq!(counts["S2"]["chr2:150-180"], 9);
    }

    #[test]
    fn test_samples_without_selected_junctions_are_present() {
        let ids = vec![JunctionId::new("chr9:1-2")];
        let counts = read(Selection::Ids(&ids)).unwrap();
        assert_eq!(counts.len(), 2);
        assert!(counts.values().all(|j| j.is_empty()));
    }

    #[test]
    fn test_invalid_count_names_the_value() {
        let table = "chr\tstart\tend\tID\tS1\nchr1\t150\t180\tchr1:150-180\tfive\n";
        let interval = GenomicInterval::new("chr1", 100, 200).unwrap();
        let err = read_counts(
            table.as_bytes(),
            Path::new("junctions.bed"),
            Selection::Interval(&interval),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedTable { ref reason, .. } if reason.contains("five")));
    }

    #[test]
    fn test_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let interval = GenomicInterval::new("chr1", 100, 200).unwrap();
        let err = aggregate(
            &junctions_table_path(dir.path()),
            Selection::Interval(&interval),
        )
        .unwrap_err();
        assert!(matches!(err, Error::JunctionsFileNotFound(_)));
    }
}
