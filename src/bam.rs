//! BAM access for index construction and tree-guided queries.
//!
//! Construction scans the file forward once and captures the BGZF virtual
//! position in front of every record so that it can serve as a seekable
//! bookmark later. Queries additionally reposition the stream, so they stay
//! on the single-threaded BGZF reader; the scan path can spread block
//! decompression over worker threads.

use crate::error::{IndexError, Result};
use log::debug;
use noodles::bam;
use noodles::bgzf;
use noodles::sam::{self, header::record::value::map::header::tag};
use std::fs::File;
use std::io::{self, BufRead, Read};
use std::num::NonZeroUsize;
use std::path::Path;

/// BGZF source for the forward scan: single-threaded or with a worker pool
/// for block decompression.
pub enum BgzfSource {
    Single(bgzf::Reader<File>),
    Multi(bgzf::MultithreadedReader<File>),
}

impl BgzfSource {
    fn virtual_position(&self) -> bgzf::VirtualPosition {
        match self {
            BgzfSource::Single(reader) => reader.virtual_position(),
            BgzfSource::Multi(reader) => reader.virtual_position(),
        }
    }
}

impl Read for BgzfSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BgzfSource::Single(reader) => reader.read(buf),
            BgzfSource::Multi(reader) => reader.read(buf),
        }
    }
}

impl BufRead for BgzfSource {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            BgzfSource::Single(reader) => reader.fill_buf(),
            BgzfSource::Multi(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            BgzfSource::Single(reader) => reader.consume(amt),
            BgzfSource::Multi(reader) => reader.consume(amt),
        }
    }
}

/// Forward-only BAM scanner used by the forest builder.
pub struct BamScanner {
    reader: bam::io::Reader<BgzfSource>,
    header: sam::Header,
}

impl BamScanner {
    pub fn open<P: AsRef<Path>>(path: P, threads: NonZeroUsize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let source = if threads.get() > 1 {
            debug!(
                "scanning {} with {} decompression workers",
                path.display(),
                threads
            );
            BgzfSource::Multi(bgzf::MultithreadedReader::with_worker_count(
                threads, file,
            ))
        } else {
            BgzfSource::Single(bgzf::Reader::new(file))
        };

        let mut reader = bam::io::Reader::from(source);
        let header = reader.read_header()?;

        Ok(BamScanner { reader, header })
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    /// Virtual position of the next record to be read.
    pub fn virtual_position(&self) -> bgzf::VirtualPosition {
        self.reader.get_ref().virtual_position()
    }

    /// Reads the next record into `record`, returning 0 at end of stream.
    pub fn read_record(&mut self, record: &mut bam::Record) -> Result<usize> {
        Ok(self.reader.read_record(record)?)
    }
}

/// Seekable BAM handle for the query path. Seek state is mutable, so each
/// concurrent query needs its own handle.
pub struct BamQueryReader {
    reader: bam::io::Reader<bgzf::Reader<File>>,
    header: sam::Header,
}

impl BamQueryReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = bam::io::Reader::new(file);
        let header = reader.read_header()?;

        Ok(BamQueryReader { reader, header })
    }

    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    /// Repositions the stream so the next record read is the one whose
    /// bookmark was taken.
    pub fn seek(&mut self, bookmark: i64) -> Result<()> {
        let position = bgzf::VirtualPosition::from(bookmark as u64);
        self.reader.get_mut().seek(position)?;
        Ok(())
    }

    /// Virtual position of the next record to be read.
    pub fn virtual_position(&self) -> bgzf::VirtualPosition {
        self.reader.get_ref().virtual_position()
    }

    pub fn read_record(&mut self, record: &mut bam::Record) -> Result<usize> {
        Ok(self.reader.read_record(record)?)
    }
}

/// Requires the header's `@HD SO:` tag to be `coordinate`.
pub fn ensure_coordinate_sorted(header: &sam::Header) -> Result<()> {
    let sorted = header
        .header()
        .and_then(|hd| hd.other_fields().get(&tag::SORT_ORDER))
        .is_some_and(|value| AsRef::<[u8]>::as_ref(value) == b"coordinate");

    if sorted {
        Ok(())
    } else {
        Err(IndexError::UnsortedInput)
    }
}

/// Identity of the alignment file an index was built over. Bookmarks are
/// only meaningful against the exact file they were captured from, so the
/// index stores this and refuses a mismatched pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    pub header_md5: [u8; 16],
    pub file_len: u64,
}

pub fn fingerprint<P: AsRef<Path>>(path: P, header: &sam::Header) -> Result<Fingerprint> {
    let mut writer = sam::io::Writer::new(Vec::new());
    writer.write_header(header)?;
    let header_bytes = writer.into_inner();
    let digest = md5::compute(&header_bytes);

    let file_len = std::fs::metadata(path)?.len();

    Ok(Fingerprint {
        header_md5: digest.0,
        file_len,
    })
}
