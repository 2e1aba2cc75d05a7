//! Errors produced while resolving, reading, and drawing a sashimi plot.
//!
//! Every error is terminal for the current invocation: nothing in this crate
//! retries. The command line layer wraps these in [`anyhow`] context and is
//! responsible for how they are reported to the user.

use std::io;
use std::path::PathBuf;

/// All of the ways that drawing a sashimi plot can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `chrom:start-end` literal could not be parsed.
    #[error("malformed coordinate `{0}`: expected the form chrom:start-end")]
    MalformedCoordinate(String),

    /// The per-event-type results table was not found.
    #[error("results file not found: {}", .0.display())]
    ResultsFileNotFound(PathBuf),

    /// No row in the results table carried the requested positional identifier.
    #[error("event `{event_id}` not found in {}", .path.display())]
    EventNotFound {
        /// The positional identifier that was searched for.
        event_id: String,
        /// The results table that was scanned.
        path: PathBuf,
    },

    /// The event-type prefix of a positional identifier is not supported.
    #[error("unsupported event type `{0}`")]
    UnsupportedEventType(String),

    /// The alignment file does not exist.
    #[error("alignment file not found: {}", .0.display())]
    AlignmentFileMissing(PathBuf),

    /// The index that accompanies an alignment file does not exist.
    #[error("alignment index not found: {} (create one with `samtools index`)", .0.display())]
    AlignmentIndexMissing(PathBuf),

    /// The alignment file exists but could not be read.
    #[error("could not read alignment file {}: {reason}", .path.display())]
    AlignmentRead {
        /// The alignment file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Neither the requested chromosome nor its `chr`-toggled form is present
    /// in the alignment file's header.
    #[error("reference sequence `{name}` not present in {}", .path.display())]
    UnknownReferenceSequence {
        /// The requested chromosome.
        name: String,
        /// The alignment file.
        path: PathBuf,
    },

    /// The genome-wide junction table was not found.
    #[error("junctions file not found: {}", .0.display())]
    JunctionsFileNotFound(PathBuf),

    /// A tab-delimited input table did not have the expected shape.
    #[error("malformed table {}: {reason}", .path.display())]
    MalformedTable {
        /// The table being read.
        path: PathBuf,
        /// What was wrong, including the offending value.
        reason: String,
    },

    /// A sample was requested that is not present in the experiment metadata.
    #[error("unknown sample `{0}`")]
    UnknownSample(String),

    /// A group was requested that no sample in the experiment metadata belongs to.
    #[error("unknown group `{0}`")]
    UnknownGroup(String),

    /// The explicit sample list and group list disagree.
    #[error("sample order conflict: {0}")]
    SampleOrderConflict(String),

    /// Fewer colors are available than there are groups to color.
    #[error("{colors} color(s) supplied for {groups} group(s)")]
    ColorCountMismatch {
        /// The number of colors available.
        colors: usize,
        /// The number of groups that need a color.
        groups: usize,
    },

    /// A color literal could not be parsed.
    #[error("invalid color `{0}`: expected #rrggbb, #rgb, or a basic color name")]
    InvalidColor(String),

    /// None of the plotted samples carry any junction read counts.
    #[error("no junctions to render in the selected region")]
    NoJunctionsToRender,

    /// The output path does not end in a supported image extension.
    #[error("unsupported output format: {} (expected .png, .svg, or .html)", .0.display())]
    UnsupportedOutputFormat(PathBuf),

    /// The drawing backend failed.
    #[error("rendering failed: {0}")]
    Render(String),

    /// A file could not be opened or read.
    #[error("I/O error: {source} ({})", .path.display())]
    Io {
        /// The underlying error.
        source: io::Error,
        /// The file being accessed.
        path: PathBuf,
    },
}

impl Error {
    /// Wraps an [`io::Error`] with the path that was being accessed.
    pub fn io(source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    /// Convenience constructor for [`Error::MalformedTable`].
    pub fn malformed_table(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedTable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
