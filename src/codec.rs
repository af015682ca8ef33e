//! Binary index codec.
//!
//! Nodes serialize to a fixed little-endian layout: `start` (u32), `end`
//! (u32), a one-byte `has_left` tag followed by the left subtree, the same
//! for the right subtree, then `bookmark` (i64). A forest is a `count` (u64)
//! followed by that many tagged-optional trees. The layout is
//! language-neutral and re-encoding a decoded forest reproduces the input
//! bytes exactly.
//!
//! On disk the forest is wrapped with a magic tag and the fingerprint of the
//! alignment file it was built over; bookmarks are only valid against that
//! exact file.

use crate::bam::Fingerprint;
use crate::error::{IndexError, Result};
use crate::forest::Forest;
use crate::tree::IntervalNode;
use log::debug;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

const INDEX_MAGIC: [u8; 4] = *b"BIT\x01";

fn write_node<W: Write>(writer: &mut W, node: &IntervalNode) -> Result<()> {
    writer.write_all(&node.start.to_le_bytes())?;
    writer.write_all(&node.end.to_le_bytes())?;

    match &node.left {
        Some(left) => {
            writer.write_all(&[1])?;
            write_node(writer, left)?;
        }
        None => writer.write_all(&[0])?,
    }

    match &node.right {
        Some(right) => {
            writer.write_all(&[1])?;
            write_node(writer, right)?;
        }
        None => writer.write_all(&[0])?,
    }

    writer.write_all(&node.bookmark.to_le_bytes())?;

    Ok(())
}

/// Serializes a forest: tree count, then each tree behind a presence tag.
pub fn encode_forest<W: Write>(writer: &mut W, forest: &Forest) -> Result<()> {
    writer.write_all(&(forest.trees.len() as u64).to_le_bytes())?;

    for tree in &forest.trees {
        match tree {
            Some(root) => {
                writer.write_all(&[1])?;
                write_node(writer, root)?;
            }
            None => writer.write_all(&[0])?,
        }
    }

    Ok(())
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            IndexError::CorruptIndex("stream ends mid-node".to_string())
        }
        _ => IndexError::Io(e),
    })
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    fill(reader, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    fill(reader, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i64<R: Read>(reader: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    fill(reader, &mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_tag<R: Read>(reader: &mut R) -> Result<bool> {
    let mut buf = [0u8; 1];
    fill(reader, &mut buf)?;
    match buf[0] {
        0 => Ok(false),
        1 => Ok(true),
        tag => Err(IndexError::CorruptIndex(format!(
            "invalid presence tag {tag}"
        ))),
    }
}

fn read_node<R: Read>(reader: &mut R) -> Result<Box<IntervalNode>> {
    let start = read_u32(reader)?;
    let end = read_u32(reader)?;

    let left = if read_tag(reader)? {
        Some(read_node(reader)?)
    } else {
        None
    };

    let right = if read_tag(reader)? {
        Some(read_node(reader)?)
    } else {
        None
    };

    let bookmark = read_i64(reader)?;

    Ok(Box::new(IntervalNode {
        start,
        end,
        bookmark,
        left,
        right,
    }))
}

/// Deserializes a forest written by [`encode_forest`].
pub fn decode_forest<R: Read>(reader: &mut R) -> Result<Forest> {
    let count = read_u64(reader)?;
    let mut trees = Vec::with_capacity(count.min(u16::MAX as u64) as usize);

    for _ in 0..count {
        let tree = if read_tag(reader)? {
            Some(read_node(reader)?)
        } else {
            None
        };
        trees.push(tree);
    }

    Ok(Forest::new(trees))
}

/// Persists an index file all-or-nothing: the encoded bytes go to a
/// temporary file in the destination directory and are renamed into place.
pub fn write_index_file<P: AsRef<Path>>(
    path: P,
    forest: &Forest,
    fingerprint: &Fingerprint,
) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut staged = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };

    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        writer.write_all(&INDEX_MAGIC)?;
        writer.write_all(&fingerprint.header_md5)?;
        writer.write_all(&fingerprint.file_len.to_le_bytes())?;
        encode_forest(&mut writer, forest)?;
        writer.flush()?;
    }

    staged.persist(path).map_err(|e| IndexError::Io(e.error))?;
    debug!("persisted index to {}", path.display());

    Ok(())
}

/// Reads an index file back, returning the recorded fingerprint and forest.
pub fn read_index_file<P: AsRef<Path>>(path: P) -> Result<(Fingerprint, Forest)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    fill(&mut reader, &mut magic)?;
    if magic != INDEX_MAGIC {
        return Err(IndexError::CorruptIndex(
            "not an interval-tree index file".to_string(),
        ));
    }

    let mut header_md5 = [0u8; 16];
    fill(&mut reader, &mut header_md5)?;
    let file_len = read_u64(&mut reader)?;

    let forest = decode_forest(&mut reader)?;

    Ok((
        Fingerprint {
            header_md5,
            file_len,
        },
        forest,
    ))
}

/// Loads an index, refusing it if it was not built over the alignment file
/// identified by `expected`.
pub fn load_index_checked<P: AsRef<Path>>(path: P, expected: &Fingerprint) -> Result<Forest> {
    let path = path.as_ref();
    let (recorded, forest) = read_index_file(path)?;

    if recorded != *expected {
        return Err(IndexError::StaleIndex(format!(
            "{} was built over a different alignment file",
            path.display()
        )));
    }

    Ok(forest)
}
