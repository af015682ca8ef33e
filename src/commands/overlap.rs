//! The `overlap` subcommand: report alignments intersecting a query
//! interval.

use crate::bam::{self, BamQueryReader};
use crate::commands::index;
use crate::error::{IndexError, Result};
use crate::output::RecordSink;
use crate::query;
use crate::record::Position;
use crate::seqidx::SequenceIndex;
use log::info;
use std::num::NonZeroUsize;
use std::path::Path;

/// Parses a `NAME,POSITION` region endpoint against the reference table.
pub fn parse_region(region: &str, seq_index: &SequenceIndex) -> Result<Position> {
    let (name, digits) = region.rsplit_once(',').ok_or_else(|| {
        IndexError::InvalidArgument(format!("'{region}' is not of the form NAME,POSITION"))
    })?;

    if name.is_empty() {
        return Err(IndexError::InvalidArgument(format!(
            "'{region}' is missing a reference name"
        )));
    }

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IndexError::InvalidArgument(format!(
            "'{digits}' is not a valid position"
        )));
    }

    let offset: u32 = digits
        .parse()
        .map_err(|_| IndexError::InvalidArgument(format!("'{digits}' is out of range")))?;

    let ref_id = seq_index.get_id(name).ok_or_else(|| {
        IndexError::InvalidArgument(format!("unknown reference '{name}'"))
    })?;

    Ok(Position::new(ref_id as i32, offset as i32))
}

pub fn run_overlap(
    input: &Path,
    start: &str,
    end: &str,
    output: Option<&Path>,
    threads: NonZeroUsize,
) -> Result<()> {
    let mut reader = BamQueryReader::open(input)?;
    bam::ensure_coordinate_sorted(reader.header())?;

    let seq_index = SequenceIndex::from_header(reader.header());
    let qs = parse_region(start, &seq_index)?;
    let qe = parse_region(end, &seq_index)?;

    if qs > qe {
        return Err(IndexError::InvalidArgument(format!(
            "query start {qs} lies after query end {qe}"
        )));
    }

    let loaded = index::load_or_build(input, reader.header(), threads)?;

    let mut sink = RecordSink::create(output, &seq_index)?;
    let emitted = query::query_overlaps(&mut reader, &loaded, qs, qe, |record| {
        sink.write_record(record)
    })?;
    sink.finish()?;

    info!("{emitted} records overlap {qs}..{qe}");

    Ok(())
}
