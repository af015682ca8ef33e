//! Two-phase overlap queries.
//!
//! The tree descent produces a stream position at or before the first
//! overlapping record; the stream is then re-seeked there and walked
//! forward, first to the true starting record and then through every
//! overlap until the query end is passed. Results come out in the stream's
//! natural coordinate order.

use crate::bam::BamQueryReader;
use crate::error::{IndexError, Result};
use crate::forest::Forest;
use crate::record::{project, Position};
use crate::tree;
use log::debug;
use noodles::bam;

/// Candidate stream position for `[qs, qe]` from the forest, or `-1` when
/// no tree could contain an overlap.
fn tree_candidate(forest: &Forest, qs: Position, qe: Position) -> i64 {
    let mut candidate = -1i64;

    if qs.ref_id == qe.ref_id {
        if let Some(root) = forest.tree(qs.ref_id as usize) {
            tree::descend(root, qs.offset as u32, qe.offset as u32, &mut candidate);
        }
        return candidate;
    }

    // The query spans references: descend each tree over its sub-window and
    // accept the first one that yields a candidate. Later references are
    // covered by the scanner's forward iteration.
    for ref_id in qs.ref_id..=qe.ref_id {
        let window_start = if ref_id == qs.ref_id {
            qs.offset as u32
        } else {
            0
        };
        let window_end = if ref_id == qe.ref_id {
            qe.offset as u32
        } else {
            u32::MAX
        };

        if let Some(root) = forest.tree(ref_id as usize) {
            tree::descend(root, window_start, window_end, &mut candidate);
            if candidate >= 0 {
                break;
            }
        }
    }

    candidate
}

/// From `candidate`, walks forward to the first record whose end reaches the
/// query start, returning that record's stream position.
///
/// The candidate came from a tree over the same file, so a record fulfilling
/// the condition must exist; running off the end of the stream means the
/// index and the file disagree.
fn advance_to_start(reader: &mut BamQueryReader, candidate: i64, qs: Position) -> Result<i64> {
    reader.seek(candidate)?;

    let mut record = bam::Record::default();

    loop {
        let position = reader.virtual_position();
        if reader.read_record(&mut record)? == 0 {
            return Err(IndexError::InternalInvariantViolation(format!(
                "stream exhausted before any record reached query start {qs}"
            )));
        }

        let Some((ref_id, projected)) = project(&record, u64::from(position) as i64)? else {
            continue;
        };

        if Position::new(ref_id as i32, projected.end as i32) >= qs {
            return Ok(u64::from(position) as i64);
        }
    }
}

/// Resolves the definitive starting stream position for `[qs, qe]`, or
/// `None` when the forest rules out any overlap.
pub fn find_start(
    reader: &mut BamQueryReader,
    forest: &Forest,
    qs: Position,
    qe: Position,
) -> Result<Option<i64>> {
    let candidate = tree_candidate(forest, qs, qe);
    debug!("query {qs}..{qe}: tree candidate {candidate}");

    if candidate < 0 {
        return Ok(None);
    }

    advance_to_start(reader, candidate, qs).map(Some)
}

/// Emits every mapped record overlapping `[qs, qe]`, in stream order,
/// starting from the definitive stream position. Returns the emitted count.
pub fn scan_overlaps<F>(
    reader: &mut BamQueryReader,
    start: i64,
    qs: Position,
    qe: Position,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(&bam::Record) -> Result<()>,
{
    reader.seek(start)?;

    let mut record = bam::Record::default();
    let mut emitted = 0;

    loop {
        let position = reader.virtual_position();
        if reader.read_record(&mut record)? == 0 {
            break;
        }

        let Some((ref_id, projected)) = project(&record, u64::from(position) as i64)? else {
            continue;
        };

        if Position::new(ref_id as i32, projected.start as i32) > qe {
            break;
        }

        // Short records between the starting position and the query can end
        // before the query starts; they are not overlaps.
        if Position::new(ref_id as i32, projected.end as i32) >= qs {
            emit(&record)?;
            emitted += 1;
        }
    }

    Ok(emitted)
}

/// Runs the full query path for `[qs, qe]`: tree descent, stream
/// refinement, forward scan. Returns the number of emitted records.
pub fn query_overlaps<F>(
    reader: &mut BamQueryReader,
    forest: &Forest,
    qs: Position,
    qe: Position,
    emit: F,
) -> Result<usize>
where
    F: FnMut(&bam::Record) -> Result<()>,
{
    if qs > qe {
        return Err(IndexError::InvalidArgument(format!(
            "query start {qs} lies after query end {qe}"
        )));
    }

    match find_start(reader, forest, qs, qe)? {
        Some(start) => scan_overlaps(reader, start, qs, qe, emit),
        None => Ok(0),
    }
}
