//! Genomic intervals, junction identifiers, and explicit coordinate parsing.
//!
//! # Overview
//!
//! Everything downstream of region resolution works on a [`GenomicInterval`]:
//! a chromosome plus a 0-based, half-open `[start, end)` range and an optional
//! strand. Intervals come from one of two places:
//!
//! * an explicit `chrom:start-end` string, handled by [`resolve_explicit`], or
//! * a positional splicing-event identifier, handled by
//!   [`event::resolve_event`].
//!
//! ```
//! use sashimi::region::resolve_explicit;
//!
//! let interval = resolve_explicit("chr10:20326000-20329000").unwrap();
//! assert_eq!(interval.chrom(), "chr10");
//! assert_eq!(interval.start(), 20326000);
//! assert_eq!(interval.end(), 20329000);
//! assert_eq!(interval.len(), 3000);
//! ```

pub mod event;

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;
use crate::errors::Result;

//========//
// Strand //
//========//

/// The strand of a genomic feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strand {
    /// The `+` strand.
    Forward,

    /// The `-` strand.
    Reverse,
}

impl Strand {
    /// Parses a strand column value. Anything other than `+` or `-` (such as
    /// `.`) is treated as an unknown strand.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

//==================//
// Genomic interval //
//==================//

/// A 0-based, half-open interval on a chromosome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenomicInterval {
    chrom: String,
    start: u64,
    end: u64,
    strand: Option<Strand>,
}

impl GenomicInterval {
    /// Creates a new interval. Fails if `end <= start`.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        let chrom = chrom.into();

        if chrom.is_empty() || end <= start {
            return Err(Error::MalformedCoordinate(format!(
                "{}:{}-{}",
                chrom, start, end
            )));
        }

        Ok(Self {
            chrom,
            start,
            end,
            strand: None,
        })
    }

    /// Attaches a strand to the interval.
    pub fn with_strand(mut self, strand: Option<Strand>) -> Self {
        self.strand = strand;
        self
    }

    /// The chromosome name, exactly as it was resolved.
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// The 0-based, inclusive start.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The exclusive end.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// The strand, if known.
    pub fn strand(&self) -> Option<Strand> {
        self.strand
    }

    /// The number of bases covered by the interval.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always `false`: an interval covers at least one base.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `position` falls strictly inside `(start, end)`.
    pub fn strictly_contains(&self, position: u64) -> bool {
        self.start < position && position < self.end
    }

    /// Whether `chrom` names the same chromosome as this interval, accepting
    /// both the `chr`-prefixed and the bare form.
    pub fn is_on_chromosome(&self, chrom: &str) -> bool {
        same_chromosome(&self.chrom, chrom)
    }

    /// The chromosome as it should be displayed: bare numeric, sex, and
    /// mitochondrial chromosome names gain a `chr` prefix.
    pub fn display_chrom(&self) -> String {
        let bare = self.chrom.as_str();
        let needs_prefix = !bare.starts_with("chr")
            && (bare.chars().all(|c| c.is_ascii_digit()) || matches!(bare, "X" | "Y" | "M" | "MT"));

        if needs_prefix {
            format!("chr{}", bare)
        } else {
            bare.to_string()
        }
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.display_chrom(), self.start, self.end)
    }
}

/// Removes a leading `chr` from a chromosome name, if present.
pub fn strip_chr(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

/// Whether two chromosome names refer to the same chromosome, ignoring a
/// leading `chr` on either side.
pub fn same_chromosome(a: &str, b: &str) -> bool {
    strip_chr(a) == strip_chr(b)
}

//================//
// Junction names //
//================//

/// The identifier of a splice junction, of the form `chrom:start-end`.
///
/// The left boundary is 1-based (the convention of the upstream pipeline),
/// so the base preceding the junction sits at 0-based position `start - 1`.
/// The identifier is otherwise opaque: it is compared and hashed as a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionId(String);

impl JunctionId {
    /// Creates a new junction identifier. No validation is performed.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the identifier into `(chrom, start, end)` as written.
    pub fn coordinates(&self) -> Result<(&str, u64, u64)> {
        parse_coordinate(&self.0)
    }
}

impl fmt::Display for JunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JunctionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for JunctionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_coordinate(s)?;
        Ok(Self::new(s))
    }
}

//=====================//
// Explicit coordinate //
//=====================//

/// Splits a `chrom:start-end` literal into its parts without checking that
/// `end > start`.
///
/// The literal must contain exactly one `:` and exactly one `-`, and both
/// bounds must be unsigned integers.
pub fn parse_coordinate(coordinate: &str) -> Result<(&str, u64, u64)> {
    let malformed = || Error::MalformedCoordinate(coordinate.to_string());

    if coordinate.matches(':').count() != 1 || coordinate.matches('-').count() != 1 {
        return Err(malformed());
    }

    let (chrom, range) = coordinate.split_once(':').ok_or_else(malformed)?;
    let (start, end) = range.split_once('-').ok_or_else(malformed)?;

    if chrom.is_empty() {
        return Err(malformed());
    }

    let start = start.trim().parse::<u64>().map_err(|_| malformed())?;
    let end = end.trim().parse::<u64>().map_err(|_| malformed())?;

    Ok((chrom, start, end))
}

/// Resolves an explicit `chrom:start-end` coordinate into an interval. The
/// chromosome is kept exactly as written and no strand is attached.
pub fn resolve_explicit(coordinate: &str) -> Result<GenomicInterval> {
    let (chrom, start, end) = parse_coordinate(coordinate)?;
    GenomicInterval::new(chrom, start, end)
        .map_err(|_| Error::MalformedCoordinate(coordinate.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit_round_trips() {
        for (literal, chrom, start, end) in [
            ("chr1:100-200", "chr1", 100, 200),
            ("10:0-1", "10", 0, 1),
            ("chrX:20326000-20329000", "chrX", 20326000, 20329000),
        ] {
            let interval = resolve_explicit(literal).unwrap();
            assert_eq!(
                (interval.chrom(), interval.start(), interval.end()),
                (chrom, start, end)
            );
            assert_eq!(interval.strand(), None);
        }
    }

    #[test]
    fn test_resolve_explicit_rejects_malformed() {
        for literal in [
            "chr1",
            "chr1:100",
            "chr1-100-200",
            "chr1:100:200",
            "chr1:100-200-300",
            "chr1:abc-200",
            "chr1:100-2x0",
            ":100-200",
            "chr1:-5-10",
            "chr1:200-100",
            "chr1:100-100",
        ] {
            match resolve_explicit(literal) {
                Err(Error::MalformedCoordinate(value)) => assert_eq!(value, literal),
                other => panic!("expected MalformedCoordinate for {}, got {:?}", literal, other),
            }
        }
    }

    #[test]
    fn test_display_chrom() {
        let interval = GenomicInterval::new("1", 0, 10).unwrap();
        assert_eq!(interval.display_chrom(), "chr1");
        assert_eq!(interval.to_string(), "chr1:0-10");

        let interval = GenomicInterval::new("MT", 0, 10).unwrap();
        assert_eq!(interval.display_chrom(), "chrMT");

        let interval = GenomicInterval::new("chr2", 0, 10).unwrap();
        assert_eq!(interval.display_chrom(), "chr2");

        let interval = GenomicInterval::new("GL000220.1", 0, 10).unwrap();
        assert_eq!(interval.display_chrom(), "GL000220.1");
    }

    #[test]
    fn test_chromosome_matching() {
        let interval = GenomicInterval::new("1", 100, 200).unwrap();
        assert!(interval.is_on_chromosome("chr1"));
        assert!(interval.is_on_chromosome("1"));
        assert!(!interval.is_on_chromosome("chr10"));
        assert!(!interval.is_on_chromosome("2"));
    }

    #[test]
    fn test_strictly_contains_excludes_boundaries() {
        let interval = GenomicInterval::new("1", 100, 200).unwrap();
        assert!(!interval.strictly_contains(100));
        assert!(interval.strictly_contains(101));
        assert!(interval.strictly_contains(199));
        assert!(!interval.strictly_contains(200));
    }

    #[test]
    fn test_junction_id_coordinates() {
        let id: JunctionId = "chr1:1001-2000".parse().unwrap();
        assert_eq!(id.coordinates().unwrap(), ("chr1", 1001, 2000));
        assert!("chr1:1001".parse::<JunctionId>().is_err());
    }

    #[test]
    fn test_strand_parsing() {
        assert_eq!(Strand::parse("+"), Some(Strand::Forward));
        assert_eq!(Strand::parse("-"), Some(Strand::Reverse));
        assert_eq!(Strand::parse("."), None);
        assert_eq!(Strand::Reverse.to_string(), "-");
    }
}
