//! Projection of alignment records into the intervals the index is built
//! over.
//!
//! A projected [`Record`] keeps only the reference-coordinate footprint of an
//! alignment and the stream position it was read from; everything else stays
//! in the file and is re-read on demand through the bookmark.

use noodles::bam;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::Cigar;
use std::io;

/// A file-wide coordinate: reference index in header order plus a 0-based
/// offset within that reference. Ordering is lexicographic, so comparisons
/// across references follow header order. `ref_id == -1` marks an unset
/// position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub ref_id: i32,
    pub offset: i32,
}

impl Position {
    pub fn new(ref_id: i32, offset: i32) -> Self {
        Position { ref_id, offset }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.ref_id, self.offset)
    }
}

/// The interval an alignment covers on its reference, plus the stream
/// position (BGZF virtual position, `-1` if unset) the parser can be
/// re-seeked to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub start: u32,
    pub end: u32,
    pub bookmark: i64,
}

impl Record {
    pub fn new(start: u32, end: u32, bookmark: i64) -> Self {
        Record { start, end, bookmark }
    }
}

/// Number of reference positions covered by a CIGAR, summing the lengths of
/// `M`, `I`, `D`, `=` and `X` operations.
pub fn cigar_footprint(cigar: &dyn Cigar) -> io::Result<u32> {
    let mut length = 0;

    for op in cigar.iter() {
        let op = op?;

        match op.kind() {
            Kind::Match
            | Kind::Insertion
            | Kind::Deletion
            | Kind::SequenceMatch
            | Kind::SequenceMismatch => length += op.len() as u32,
            _ => {}
        }
    }

    Ok(length)
}

/// Project a BAM record onto its reference footprint.
///
/// Returns `None` for unmapped alignments: a missing reference id, a missing
/// alignment start, or a set unmapped flag. `bookmark` is the stream
/// position the record was read from.
pub fn project(record: &bam::Record, bookmark: i64) -> io::Result<Option<(usize, Record)>> {
    if record.flags().is_unmapped() {
        return Ok(None);
    }

    let Some(ref_id) = record.reference_sequence_id().transpose()? else {
        return Ok(None);
    };

    let Some(alignment_start) = record.alignment_start().transpose()? else {
        return Ok(None);
    };

    let start = (usize::from(alignment_start) - 1) as u32;
    let end = start + cigar_footprint(&record.cigar())?;

    Ok(Some((ref_id, Record { start, end, bookmark })))
}
