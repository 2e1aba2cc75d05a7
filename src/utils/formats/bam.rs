//! Utilities related to opening indexed Binary Alignment Map (BAM) files.

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use noodles::bam;
use noodles::bam::bai;
use noodles::bgzf;
use noodles::sam;
use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::region::same_chromosome;
use crate::utils::pathbuf::AppendExtension;

/// Extension of a BAM index, appended to the BAM file name.
pub const BAM_INDEX_EXTENSION: &str = "bai";

/// An opened BAM file, its parsed header, and its loaded index.
pub struct IndexedBamFile {
    /// A reader for the BAM file, positioned after the header.
    pub reader: bam::Reader<bgzf::Reader<File>>,

    /// The parsed header.
    pub header: sam::Header,

    /// The BAI index.
    pub index: bai::Index,

    /// The path of the BAM file.
    pub path: PathBuf,
}

/// The location of the BAI index for `src`.
pub fn index_path(src: &Path) -> PathBuf {
    src.to_path_buf().append_extension(BAM_INDEX_EXTENSION)
}

/// Opens a BAM file along with its index. Both must exist.
pub fn open_indexed(src: &Path) -> Result<IndexedBamFile> {
    let read_error = |reason: String| Error::AlignmentRead {
        path: src.to_path_buf(),
        reason,
    };

    // (1) Both the alignment file and its index are hard preconditions.
    if !src.exists() {
        return Err(Error::AlignmentFileMissing(src.to_path_buf()));
    }

    let bai_path = index_path(src);
    if !bai_path.exists() {
        return Err(Error::AlignmentIndexMissing(bai_path));
    }

    // (2) Construct the reader and parse the header.
    debug!("reading BAM file from disk: {}", src.display());
    let mut reader = File::open(src)
        .map(bam::Reader::new)
        .map_err(|e| Error::io(e, src))?;

    let raw_header = reader
        .read_header()
        .map_err(|e| read_error(format!("reading header: {}", e)))?;
    let header = raw_header
        .parse::<sam::Header>()
        .map_err(|e| read_error(format!("parsing header: {}", e)))?;
    reader
        .read_reference_sequences()
        .map_err(|e| read_error(format!("reading reference sequences: {}", e)))?;

    // (3) Load the index.
    debug!("reading BAM index: {}", bai_path.display());
    let index = bai::read(&bai_path).map_err(|e| Error::io(e, &bai_path))?;

    Ok(IndexedBamFile {
        reader,
        header,
        index,
        path: src.to_path_buf(),
    })
}

/// Finds the name the header uses for `chrom`. An exact match is preferred;
/// otherwise the `chr`-prefixed or bare form is accepted.
pub fn resolve_reference_name(header: &sam::Header, chrom: &str) -> Option<String> {
    let names = header
        .reference_sequences()
        .keys()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();

    find_reference_name(&names, chrom)
}

fn find_reference_name(names: &[String], chrom: &str) -> Option<String> {
    names
        .iter()
        .find(|name| name.as_str() == chrom)
        .or_else(|| names.iter().find(|name| same_chromosome(name, chrom)))
        .cloned()
}

/// Builders for small coordinate-sorted BAM files used across the test suite.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs::File;
    use std::num::NonZeroUsize;
    use std::path::Path;
    use std::path::PathBuf;

    use noodles::bam;
    use noodles::bam::bai;
    use noodles::core::Position;
    use noodles::csi::index::reference_sequence::bin::Chunk;
    use noodles::sam;
    use noodles::sam::alignment::Record;
    use noodles::sam::header::record::value::map::ReferenceSequence;
    use noodles::sam::header::record::value::Map;
    use noodles::sam::record::Flags;

    use super::index_path;

    /// One aligned read on the first reference sequence.
    pub struct TestRead {
        pub name: &'static str,
        pub flags: Flags,
        /// 1-based alignment start.
        pub start: usize,
        pub cigar: &'static str,
        pub sequence: &'static str,
        pub qualities: &'static str,
    }

    impl TestRead {
        /// A read with high base qualities throughout.
        pub fn new(name: &'static str, start: usize, cigar: &'static str, sequence: &'static str) -> Self {
            Self {
                name,
                flags: Flags::empty(),
                start,
                cigar,
                sequence,
                qualities: &"IIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIII"[..sequence.len()],
            }
        }
    }

    /// Writes `reads` (already sorted by start) to `dst` against a single
    /// reference sequence, then indexes the result next to it.
    pub fn write_indexed_bam(dst: &Path, reference_name: &str, reference_length: usize, reads: &[TestRead]) -> PathBuf {
        let header = sam::Header::builder()
            .add_reference_sequence(
                reference_name.parse().unwrap(),
                Map::<ReferenceSequence>::new(NonZeroUsize::try_from(reference_length).unwrap()),
            )
            .build();

        // (1) Write the alignments.
        let mut writer = File::create(dst).map(bam::Writer::new).unwrap();
        writer.write_header(&header).unwrap();
        writer
            .write_reference_sequences(header.reference_sequences())
            .unwrap();

        for read in reads {
            let record = Record::builder()
                .set_read_name(read.name.parse().unwrap())
                .set_flags(read.flags)
                .set_reference_sequence_id(0)
                .set_alignment_start(Position::try_from(read.start).unwrap())
                .set_cigar(read.cigar.parse().unwrap())
                .set_sequence(read.sequence.parse().unwrap())
                .set_quality_scores(read.qualities.parse().unwrap())
                .build();
            writer.write_record(&header, &record).unwrap();
        }
        writer.into_inner().finish().unwrap();

        // (2) Read them back to build the index.
        let mut reader = File::open(dst).map(bam::Reader::new).unwrap();
        let header: sam::Header = reader.read_header().unwrap().parse().unwrap();
        reader.read_reference_sequences().unwrap();

        let mut builder = bai::Index::builder();
        let mut record = Record::default();
        let mut start_position = reader.virtual_position();
        while reader.read_record(&header, &mut record).unwrap() != 0 {
            let end_position = reader.virtual_position();
            builder
                .add_record(&record, Chunk::new(start_position, end_position))
                .unwrap();
            start_position = end_position;
        }

        let index = builder.build(header.reference_sequences().len());
        let bai_path = index_path(dst);
        bai::write(&bai_path, &index).unwrap();
        bai_path
    }
}
