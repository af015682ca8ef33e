//! Record sinks for query results.
//!
//! Results stream to stdout as SAM text by default; a path ending in `.bam`
//! switches to BAM output. The sink builds its own header from the
//! reference names and lengths of the queried file, so an empty result
//! still produces a well-formed file.

use crate::error::{IndexError, Result};
use crate::seqidx::SequenceIndex;
use noodles::bam;
use noodles::bgzf;
use noodles::sam::{self, alignment::io::Write as _};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

enum SinkWriter {
    Sam(sam::io::Writer<Box<dyn Write>>),
    Bam(bam::io::Writer<bgzf::Writer<File>>),
}

/// Destination for overlap results, accepting records in stream order.
pub struct RecordSink {
    header: sam::Header,
    writer: SinkWriter,
}

impl RecordSink {
    /// Opens a sink for `output`; `None` writes SAM to stdout.
    pub fn create(output: Option<&Path>, seq_index: &SequenceIndex) -> Result<Self> {
        let header = result_header(seq_index)?;

        let mut writer = match output {
            Some(path) if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bam")) => {
                SinkWriter::Bam(bam::io::Writer::new(File::create(path)?))
            }
            Some(path) => {
                let file: Box<dyn Write> = Box::new(File::create(path)?);
                SinkWriter::Sam(sam::io::Writer::new(file))
            }
            None => {
                let stdout: Box<dyn Write> = Box::new(io::stdout().lock());
                SinkWriter::Sam(sam::io::Writer::new(stdout))
            }
        };

        match &mut writer {
            SinkWriter::Sam(w) => w.write_header(&header)?,
            SinkWriter::Bam(w) => w.write_header(&header)?,
        }

        Ok(RecordSink { header, writer })
    }

    pub fn write_record(&mut self, record: &bam::Record) -> Result<()> {
        match &mut self.writer {
            SinkWriter::Sam(w) => w.write_alignment_record(&self.header, record)?,
            SinkWriter::Bam(w) => w.write_alignment_record(&self.header, record)?,
        }
        Ok(())
    }

    /// Flushes the sink; BAM output additionally gets its end-of-file
    /// marker.
    pub fn finish(self) -> Result<()> {
        match self.writer {
            SinkWriter::Sam(w) => w.into_inner().flush()?,
            SinkWriter::Bam(mut w) => w.try_finish()?,
        }
        Ok(())
    }
}

fn result_header(seq_index: &SequenceIndex) -> Result<sam::Header> {
    let mut text = String::from("@HD\tVN:1.6\tSO:coordinate\n");
    for (name, length) in seq_index.names().iter().zip(seq_index.lengths()) {
        text.push_str(&format!("@SQ\tSN:{name}\tLN:{length}\n"));
    }

    text.parse().map_err(|e| {
        IndexError::InvalidArgument(format!("cannot build output header: {e}"))
    })
}
