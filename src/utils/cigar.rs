//! Utilities related to walking CIGAR operations.

use noodles::sam::record::cigar::op::Kind;

/// Reports whether a CIGAR operation places read bases against reference bases.
/// Only these operations contribute to per-base coverage.
pub fn aligns_read_base(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch
    )
}

/// Reports whether a CIGAR operation advances along the reference.
pub fn consumes_reference(kind: Kind) -> bool {
    aligns_read_base(kind) || matches!(kind, Kind::Deletion | Kind::Skip)
}

/// Reports whether a CIGAR operation advances along the read.
pub fn consumes_read(kind: Kind) -> bool {
    aligns_read_base(kind) || matches!(kind, Kind::Insertion | Kind::SoftClip)
}
