//! Per-sample PSI (percent spliced-in) values for a single event.
//!
//! The upstream pipeline writes a sample-level PSI matrix to
//! `<root>/results/splicing/PSI_matrix_sample.txt`: one row per event, one
//! column per sample. The row for an event is found by matching either its
//! `event_id` or its positional identifier against the row's leading columns.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

use crate::errors::Error;
use crate::errors::Result;
use crate::region::event::RESULTS_SUBDIRECTORY;

/// File name of the sample-level PSI matrix.
pub const PSI_MATRIX_FILENAME: &str = "PSI_matrix_sample.txt";

/// The number of leading identifier columns that are searched for a match.
const IDENTIFIER_COLUMNS: usize = 2;

/// PSI values keyed by sample. `None` means the value was `NA` (or empty).
pub type PsiValues = HashMap<String, Option<f64>>;

/// The location of the sample-level PSI matrix beneath `results_root`.
pub fn psi_matrix_path(results_root: &Path) -> PathBuf {
    let mut path = results_root.to_path_buf();
    path.extend(RESULTS_SUBDIRECTORY);
    path.push(PSI_MATRIX_FILENAME);
    path
}

/// Reads the PSI values of one event for the given samples.
///
/// PSI values are an optional annotation, so a missing matrix or a missing
/// row yields `Ok(None)` (with a warning) rather than an error.
pub fn read_sample_psi<'a>(
    path: &Path,
    keys: &[&str],
    samples: impl IntoIterator<Item = &'a str>,
) -> Result<Option<PsiValues>> {
    if !path.exists() {
        warn!(
            "PSI matrix not found at {}; plotting without PSI values.",
            path.display()
        );
        return Ok(None);
    }

    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let values = parse_sample_psi(BufReader::new(file), path, keys, samples)?;

    if values.is_none() {
        warn!(
            "Event not found in {}; plotting without PSI values.",
            path.display()
        );
    }

    Ok(values)
}

/// Parses a PSI matrix and extracts the row matching any of `keys`.
pub fn parse_sample_psi<'a, R: BufRead>(
    reader: R,
    path: &Path,
    keys: &[&str],
    samples: impl IntoIterator<Item = &'a str>,
) -> Result<Option<PsiValues>> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(|e| Error::io(e, path))?,
        None => return Ok(None),
    };
    let header = header
        .trim_end_matches(['\r', '\n'])
        .split('\t')
        .map(String::from)
        .collect::<Vec<_>>();

    let wanted = samples
        .into_iter()
        .filter_map(|sample| {
            header
                .iter()
                .position(|column| column == sample)
                .map(|i| (sample.to_string(), i))
        })
        .collect::<Vec<_>>();

    for line in lines {
        let line = line.map_err(|e| Error::io(e, path))?;
        let fields = line.trim_end_matches(['\r', '\n']).split('\t').collect::<Vec<_>>();

        let matched = fields
            .iter()
            .take(IDENTIFIER_COLUMNS)
            .any(|field| keys.contains(field));
        if !matched {
            continue;
        }

        let mut values = PsiValues::new();
        for (sample, i) in &wanted {
            let raw = fields.get(*i).map(|s| s.trim()).unwrap_or_default();
            let value = match raw {
                "" | "NA" | "nan" | "NaN" => None,
                v => Some(v.parse::<f64>().map_err(|_| {
                    Error::malformed_table(
                        path,
                        format!("invalid PSI value `{}` for sample `{}`", v, sample),
                    )
                })?),
            };
            values.insert(sample.clone(), value);
        }

        debug!("read PSI values for {} sample(s)", values.len());
        return Ok(Some(values));
    }

    Ok(None)
}
