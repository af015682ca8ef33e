//! Forest construction: one interval tree per reference sequence.
//!
//! The sorted input is consumed exactly once. Records are collected into a
//! per-reference bag; whenever the reference id advances, the bag is cut
//! into a tree and references skipped over get empty slots.

use crate::bam::{ensure_coordinate_sorted, BamScanner};
use crate::error::{IndexError, Result};
use crate::record::{project, Record};
use crate::tree::{construct_tree, IntervalNode};
use log::debug;
use noodles::bam;

/// The per-reference trees of one index, in header order. A reference with
/// no mapped records holds an empty slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Forest {
    pub trees: Vec<Option<Box<IntervalNode>>>,
}

impl Forest {
    pub fn new(trees: Vec<Option<Box<IntervalNode>>>) -> Self {
        Forest { trees }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn tree(&self, ref_id: usize) -> Option<&IntervalNode> {
        self.trees.get(ref_id).and_then(|tree| tree.as_deref())
    }

    pub fn populated_count(&self) -> usize {
        self.trees.iter().filter(|tree| tree.is_some()).count()
    }
}

/// Builds the forest by streaming the sorted input once.
///
/// Fails with `UnsortedInput` before consuming any record when the header
/// does not declare coordinate sorting, and with `OutOfOrderInput` when a
/// record steps backwards mid-stream.
pub fn build_forest(scanner: &mut BamScanner) -> Result<Forest> {
    ensure_coordinate_sorted(scanner.header())?;

    let ref_count = scanner.header().reference_sequences().len();
    let mut trees: Vec<Option<Box<IntervalNode>>> = Vec::with_capacity(ref_count);
    let mut bag: Vec<Record> = Vec::new();
    let mut current_ref = 0usize;
    let mut last_seen: Option<(usize, u32)> = None;

    let mut record = bam::Record::default();

    loop {
        let position = scanner.virtual_position();
        if scanner.read_record(&mut record)? == 0 {
            break;
        }

        let Some((ref_id, projected)) = project(&record, u64::from(position) as i64)? else {
            continue;
        };

        if ref_id >= ref_count {
            return Err(IndexError::InvalidArgument(format!(
                "record references sequence {ref_id} but the header lists {ref_count}"
            )));
        }

        if let Some(last) = last_seen {
            if (ref_id, projected.start) < last {
                return Err(IndexError::OutOfOrderInput {
                    ref_id: ref_id as i32,
                    offset: projected.start as i32,
                });
            }
        }
        last_seen = Some((ref_id, projected.start));

        // Reference advanced: cut the finished bag, leaving empty slots for
        // references without mapped records.
        while current_ref < ref_id {
            trees.push(construct_tree(std::mem::take(&mut bag)));
            current_ref += 1;
        }

        bag.push(projected);
    }

    while trees.len() < ref_count {
        trees.push(construct_tree(std::mem::take(&mut bag)));
    }

    let forest = Forest::new(trees);
    debug!(
        "built {} trees, {} populated",
        forest.len(),
        forest.populated_count()
    );

    Ok(forest)
}
