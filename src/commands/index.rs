//! The `index` subcommand: build the interval forest and persist it.

use crate::bam::{self, BamScanner};
use crate::codec;
use crate::error::{IndexError, Result};
use crate::forest::{self, Forest};
use log::{info, warn};
use noodles::sam;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Index file convention: the index for `foo.bam` lives beside it as
/// `foo.bam.bit`.
pub fn default_index_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".bit");
    PathBuf::from(name)
}

/// Builds the forest for `input` and persists it atomically beside the
/// file, returning the in-memory forest.
pub fn build_and_persist(input: &Path, threads: NonZeroUsize) -> Result<Forest> {
    let mut scanner = BamScanner::open(input, threads)?;
    let fingerprint = bam::fingerprint(input, scanner.header())?;

    let built = forest::build_forest(&mut scanner)?;

    let index_path = default_index_path(input);
    codec::write_index_file(&index_path, &built, &fingerprint)?;
    info!(
        "indexed {}: {} references, {} populated trees -> {}",
        input.display(),
        built.len(),
        built.populated_count(),
        index_path.display()
    );

    Ok(built)
}

/// Loads the persisted index for `input`, rebuilding it when it is absent
/// or was built over a different version of the file.
pub fn load_or_build(input: &Path, header: &sam::Header, threads: NonZeroUsize) -> Result<Forest> {
    let index_path = default_index_path(input);
    let fingerprint = bam::fingerprint(input, header)?;

    if index_path.exists() {
        match codec::load_index_checked(&index_path, &fingerprint) {
            Ok(loaded) => return Ok(loaded),
            Err(IndexError::StaleIndex(msg)) => warn!("{msg}; rebuilding"),
            Err(e) => return Err(e),
        }
    }

    build_and_persist(input, threads)
}

pub fn run_index(input: &Path, threads: NonZeroUsize) -> Result<()> {
    build_and_persist(input, threads).map(|_| ())
}
