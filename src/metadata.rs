//! Experiment metadata: which samples exist, where their alignments live, and
//! which group each belongs to.
//!
//! The experiment table is tab-delimited with a header row naming (at least)
//! the `sample`, `bam`, and `group` columns. Column order does not matter and
//! extra columns are ignored. Sample order in the table is significant: it is
//! the default panel order and determines the first-seen order of groups.

pub mod psi;

use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;

/// A single sample of the experiment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleInfo {
    /// The group (condition) the sample belongs to.
    pub group: String,

    /// The alignment file for the sample.
    pub bam: PathBuf,
}

/// All samples of an experiment, in table order.
#[derive(Clone, Debug, Default)]
pub struct ExperimentMetadata {
    samples: IndexMap<String, SampleInfo>,
}

impl ExperimentMetadata {
    /// Creates an empty set of metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample. A sample that is already present is replaced in place.
    pub fn insert(&mut self, sample: impl Into<String>, info: SampleInfo) {
        self.samples.insert(sample.into(), info);
    }

    /// Looks up a sample.
    pub fn get(&self, sample: &str) -> Option<&SampleInfo> {
        self.samples.get(sample)
    }

    /// Iterates over samples in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SampleInfo)> {
        self.samples.iter()
    }

    /// Sample names in table order.
    pub fn sample_names(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    /// The number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Group names in order of first appearance.
    pub fn groups(&self) -> Vec<&str> {
        self.samples
            .values()
            .map(|info| info.group.as_str())
            .unique()
            .collect()
    }

    /// The samples belonging to `group`, in table order.
    pub fn samples_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.samples
            .iter()
            .filter(move |(_, info)| info.group == group)
            .map(|(name, _)| name.as_str())
    }

    /// Reads an experiment table from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let metadata = Self::parse(BufReader::new(file), path)?;
        debug!(
            "read {} sample(s) in {} group(s) from {}",
            metadata.len(),
            metadata.groups().len(),
            path.display()
        );
        Ok(metadata)
    }

    /// Parses an experiment table. `path` is only used for error messages.
    pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line.map_err(|e| Error::io(e, path))?,
            None => return Err(Error::malformed_table(path, "empty experiment table")),
        };
        let columns: HashMap<&str, usize> = header
            .trim_end_matches(['\r', '\n'])
            .split('\t')
            .enumerate()
            .map(|(i, name)| (name.trim(), i))
            .collect();

        let column = |name: &str| {
            columns.get(name).copied().ok_or_else(|| {
                Error::malformed_table(path, format!("missing column `{}`", name))
            })
        };
        let sample_col = column("sample")?;
        let bam_col = column("bam")?;
        let group_col = column("group")?;

        let mut metadata = Self::new();
        for line in lines {
            let line = line.map_err(|e| Error::io(e, path))?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            let fields = line.split('\t').collect::<Vec<_>>();
            let value = |i: usize| {
                fields.get(i).map(|s| s.trim()).ok_or_else(|| {
                    Error::malformed_table(path, format!("row has too few columns: `{}`", line))
                })
            };

            metadata.insert(
                value(sample_col)?,
                SampleInfo {
                    group: value(group_col)?.to_string(),
                    bam: PathBuf::from(value(bam_col)?),
                },
            );
        }

        Ok(metadata)
    }
}
