//! Random read-depth estimation over the query path.
//!
//! Each sample is a uniform random point query answered through the index;
//! the per-point depths are reduced to summary statistics. A fixed RNG seed
//! makes the whole estimate reproducible.

use crate::bam::BamQueryReader;
use crate::error::{IndexError, Result};
use crate::forest::Forest;
use crate::query;
use crate::record::{project, Position};
use crate::seqidx::SequenceIndex;
use log::debug;
use noodles::bam;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Summary statistics over sampled per-position read depths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthSummary {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub variance: f64,
    pub sd: f64,
}

/// Samples `samples` uniform random positions across the references and
/// reports depth statistics. `samples` must be at least 2 so the sample
/// variance is defined.
pub fn sample_read_depth(
    reader: &mut BamQueryReader,
    forest: &Forest,
    seq_index: &SequenceIndex,
    samples: u64,
    seed: u64,
) -> Result<DepthSummary> {
    if samples < 2 {
        return Err(IndexError::InvalidArgument(
            "sample count must be at least 2".to_string(),
        ));
    }

    if seq_index.is_empty() {
        return Err(IndexError::InvalidArgument(
            "input has no reference sequences to sample".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut depths = Vec::with_capacity(samples as usize);

    for _ in 0..samples {
        let ref_id = rng.gen_range(0..seq_index.len() as u32);
        let length = seq_index.get_len(ref_id).unwrap_or(1).max(1);
        let offset = rng.gen_range(0..length) as i32;

        let point = Position::new(ref_id as i32, offset);
        let depth = depth_at(reader, forest, point)?;
        debug!("sampled {point}: depth {depth}");
        depths.push(depth);
    }

    Ok(summarize(&mut depths))
}

/// Number of mapped records whose interval contains `point`.
fn depth_at(reader: &mut BamQueryReader, forest: &Forest, point: Position) -> Result<u64> {
    let Some(start) = query::find_start(reader, forest, point, point)? else {
        return Ok(0);
    };

    reader.seek(start)?;

    let mut record = bam::Record::default();
    let mut depth = 0u64;

    loop {
        if reader.read_record(&mut record)? == 0 {
            break;
        }

        let Some((ref_id, projected)) = project(&record, -1)? else {
            continue;
        };

        if Position::new(ref_id as i32, projected.start as i32) > point {
            break;
        }

        if Position::new(ref_id as i32, projected.end as i32) >= point {
            depth += 1;
        }
    }

    Ok(depth)
}

fn summarize(depths: &mut [u64]) -> DepthSummary {
    depths.sort_unstable();

    let n = depths.len();
    let mean = depths.iter().sum::<u64>() as f64 / n as f64;

    let median = if n % 2 == 0 {
        (depths[n / 2 - 1] + depths[n / 2]) as f64 / 2.0
    } else {
        depths[n / 2] as f64
    };

    // Highest occurrence count; ties resolve to the smallest depth, which
    // the ascending scan visits first.
    let mut mode = depths[0];
    let mut best_run = 0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && depths[j] == depths[i] {
            j += 1;
        }
        if j - i > best_run {
            best_run = j - i;
            mode = depths[i];
        }
        i = j;
    }

    let variance = depths
        .iter()
        .map(|&depth| (depth as f64 - mean).powi(2))
        .sum::<f64>()
        / (n as f64 - 1.0);

    DepthSummary {
        mean,
        median,
        mode: mode as f64,
        variance,
        sd: variance.sqrt(),
    }
}
