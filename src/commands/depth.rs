//! The `depth` subcommand: estimate read depth from uniform random
//! positions.

use crate::bam::{self, BamQueryReader};
use crate::commands::index;
use crate::depth::sample_read_depth;
use crate::error::Result;
use crate::seqidx::SequenceIndex;
use std::num::NonZeroUsize;
use std::path::Path;

pub fn run_depth(
    input: &Path,
    samples: u64,
    seed: u64,
    threads: NonZeroUsize,
) -> Result<()> {
    let mut reader = BamQueryReader::open(input)?;
    bam::ensure_coordinate_sorted(reader.header())?;

    let seq_index = SequenceIndex::from_header(reader.header());
    let loaded = index::load_or_build(input, reader.header(), threads)?;

    let summary = sample_read_depth(&mut reader, &loaded, &seq_index, samples, seed)?;

    println!("mean\t{:.4}", summary.mean);
    println!("median\t{:.4}", summary.median);
    println!("mode\t{:.4}", summary.mode);
    println!("variance\t{:.4}", summary.variance);
    println!("sd\t{:.4}", summary.sd);

    Ok(())
}
