//! Per-base read depth for a region, smoothed for plotting.
//!
//! # Overview
//!
//! Depth is counted the same way as a per-nucleotide coverage query: every
//! read base aligned (`M`, `=`, or `X`) to a reference position in the region
//! counts towards that position if it is one of `A`, `C`, `G`, or `T` and its
//! base quality is at least [`MIN_BASE_QUALITY`]. The four nucleotide channels
//! are summed. Unmapped, secondary, QC-failed, and duplicate records are
//! skipped; deletions and reference skips contribute nothing.
//!
//! The raw depth is then passed through a [`median_filter`] of width
//! [`MEDIAN_FILTER_WINDOW`] so that single-base noise does not obscure the
//! step edges at splice sites.

use std::path::Path;

use noodles::core::Position;
use noodles::core::Region;
use noodles::sam::record::cigar::op::Kind;
use noodles::sam::record::Flags;
use num_format::Locale;
use num_format::ToFormattedString;
use tracing::debug;
use tracing::info;

use crate::errors::Error;
use crate::errors::Result;
use crate::region::GenomicInterval;
use crate::utils::cigar::aligns_read_base;
use crate::utils::cigar::consumes_read;
use crate::utils::cigar::consumes_reference;
use crate::utils::formats::bam::open_indexed;
use crate::utils::formats::bam::resolve_reference_name;
use crate::utils::formats::bam::IndexedBamFile;

/// Width, in bases, of the smoothing window.
pub const MEDIAN_FILTER_WINDOW: usize = 21;

/// Minimum base quality for a read base to count towards depth.
pub const MIN_BASE_QUALITY: u8 = 15;

/// Smoothed read depth, one value per base of a region.
pub type CoverageArray = Vec<u64>;

/// Computes the smoothed per-base depth of `interval` in the BAM file `bam`.
/// The result has exactly `interval.len()` values.
pub fn extract(bam: &Path, interval: &GenomicInterval) -> Result<CoverageArray> {
    let raw = raw_depth(bam, interval)?;
    Ok(median_filter(&raw, MEDIAN_FILTER_WINDOW))
}

/// Computes the unsmoothed per-base depth of `interval` in the BAM file `bam`.
pub fn raw_depth(bam: &Path, interval: &GenomicInterval) -> Result<Vec<u64>> {
    let IndexedBamFile {
        mut reader,
        header,
        index,
        path,
    } = open_indexed(bam)?;

    let read_error = |reason: String| Error::AlignmentRead {
        path: path.clone(),
        reason,
    };

    // (1) Translate the interval into a 1-based, inclusive query region using
    // whichever chromosome name the file uses.
    let name = resolve_reference_name(&header, interval.chrom()).ok_or_else(|| {
        Error::UnknownReferenceSequence {
            name: interval.chrom().to_string(),
            path: path.clone(),
        }
    })?;

    let start = usize::try_from(interval.start() + 1)
        .ok()
        .and_then(|s| Position::try_from(s).ok())
        .ok_or_else(|| read_error(format!("invalid start for {}", interval)))?;
    let end = usize::try_from(interval.end())
        .ok()
        .and_then(|e| Position::try_from(e).ok())
        .ok_or_else(|| read_error(format!("invalid end for {}", interval)))?;
    let region = Region::new(name, start..=end);

    // (2) Walk every overlapping record and tally its aligned bases.
    let mut depth = vec![0u64; interval.len() as usize];
    let query = reader
        .query(&header, &index, &region)
        .map_err(|e| read_error(format!("querying {}: {}", region, e)))?;

    let mut processed = 0usize;
    for result in query {
        let record = result.map_err(|e| read_error(format!("reading record: {}", e)))?;

        if !counts_towards_depth(record.flags()) {
            continue;
        }

        let alignment_start = match record.alignment_start() {
            Some(position) => usize::from(position) as u64 - 1,
            None => continue,
        };

        let bases = record
            .sequence()
            .as_ref()
            .iter()
            .map(|base| char::from(*base) as u8)
            .collect::<Vec<_>>();
        let qualities = record
            .quality_scores()
            .as_ref()
            .iter()
            .map(|score| u8::from(*score))
            .collect::<Vec<_>>();

        accumulate_depth(
            &mut depth,
            interval.start(),
            alignment_start,
            record.cigar().iter().map(|op| (op.kind(), op.len())),
            &bases,
            &qualities,
        );
        processed += 1;
    }

    info!(
        "Counted depth over {} from {} record(s) in {}.",
        interval,
        processed.to_formatted_string(&Locale::en),
        path.display()
    );

    Ok(depth)
}

/// Whether a record with these flags contributes to depth.
fn counts_towards_depth(flags: Flags) -> bool {
    !(flags.is_unmapped() || flags.is_secondary() || flags.is_qc_fail() || flags.is_duplicate())
}

/// Whether a single read base counts towards depth.
fn counts_base(base: Option<&u8>, quality: Option<&u8>) -> bool {
    let is_nucleotide = matches!(
        base.map(u8::to_ascii_uppercase),
        Some(b'A' | b'C' | b'G' | b'T')
    );

    // Records without base qualities are counted.
    let passes_quality = quality.map_or(true, |q| *q >= MIN_BASE_QUALITY);

    is_nucleotide && passes_quality
}

/// Adds the aligned bases of one record to `depth`, which covers the reference
/// positions starting at `region_start` (0-based). `alignment_start` is the
/// 0-based reference position of the record's first aligned base.
pub fn accumulate_depth<I>(
    depth: &mut [u64],
    region_start: u64,
    alignment_start: u64,
    ops: I,
    bases: &[u8],
    qualities: &[u8],
) where
    I: IntoIterator<Item = (Kind, usize)>,
{
    let mut reference_ptr = alignment_start;
    let mut read_ptr = 0usize;

    for (kind, len) in ops {
        if aligns_read_base(kind) {
            for offset in 0..len {
                let position = reference_ptr + offset as u64;
                if position < region_start {
                    continue;
                }

                let i = (position - region_start) as usize;
                if i >= depth.len() {
                    break;
                }

                let read_index = read_ptr + offset;
                if counts_base(bases.get(read_index), qualities.get(read_index)) {
                    depth[i] += 1;
                }
            }
        }

        if consumes_reference(kind) {
            reference_ptr += len as u64;
        }

        if consumes_read(kind) {
            read_ptr += len;
        }
    }
}

/// Maps an out-of-range index back into `[0, len)` by mirroring about the
/// array edges, repeating the edge value (`d c b a | a b c d | d c b a`).
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let folded = index.rem_euclid(period);

    if folded >= len {
        (period - 1 - folded) as usize
    } else {
        folded as usize
    }
}

/// Applies a centred sliding median of width `window` to `values`, mirroring
/// the data at both edges. Output length equals input length.
pub fn median_filter(values: &[u64], window: usize) -> Vec<u64> {
    if values.is_empty() || window <= 1 {
        return values.to_vec();
    }

    let before = (window / 2) as isize;
    let after = window as isize - before - 1;
    let mut buffer = Vec::with_capacity(window);

    let smoothed = (0..values.len() as isize)
        .map(|center| {
            buffer.clear();
            buffer.extend((center - before..=center + after).map(|i| values[reflect(i, values.len())]));
            let middle = buffer.len() / 2;
            *buffer.select_nth_unstable(middle).1
        })
        .collect();

    debug!("smoothed {} position(s) with a window of {}", values.len(), window);
    smoothed
}
