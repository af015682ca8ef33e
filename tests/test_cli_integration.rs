//! Tests that drive the compiled binary end to end.

use noodles::bam as noodles_bam;
use noodles::sam::{self, alignment::io::Write as _};
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::{
    Cigar as CigarBuf, QualityScores, RecordBuf, Sequence,
};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bamtree() -> &'static str {
    env!("CARGO_BIN_EXE_bamtree")
}

fn run(args: &[&str]) -> Output {
    Command::new(bamtree())
        .args(args)
        .output()
        .expect("binary runs")
}

fn mapped_record(name: &str, ref_id: usize, start: u32, span: u32) -> RecordBuf {
    let span = span as usize;
    RecordBuf::builder()
        .set_name(name)
        .set_flags(Flags::from(0u16))
        .set_reference_sequence_id(ref_id)
        .set_alignment_start(noodles::core::Position::try_from(start as usize + 1).unwrap())
        .set_mapping_quality(MappingQuality::new(60).unwrap())
        .set_cigar(CigarBuf::from(vec![Op::new(Kind::Match, span)]))
        .set_sequence(Sequence::from(vec![b'A'; span]))
        .set_quality_scores(QualityScores::from(vec![30u8; span]))
        .build()
}

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let header: sam::Header = "@HD\tVN:1.6\tSO:coordinate\n\
         @SQ\tSN:chr1\tLN:2000\n\
         @SQ\tSN:chr2\tLN:1000\n"
        .parse()
        .unwrap();

    let records = vec![
        mapped_record("r0", 0, 18, 119),
        mapped_record("r1", 0, 43, 188),
        mapped_record("r2", 0, 146, 102),
        mapped_record("r3", 0, 400, 50),
        mapped_record("s0", 1, 10, 80),
    ];

    let mut buf = Vec::new();
    {
        let mut writer = noodles_bam::io::Writer::new(&mut buf);
        writer.write_header(&header).unwrap();
        for record in &records {
            writer.write_alignment_record(&header, record).unwrap();
        }
        writer.try_finish().unwrap();
    }

    let path = dir.join("fixture.bam");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&buf).unwrap();
    file.flush().unwrap();
    path
}

fn sam_record_names(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.starts_with('@'))
        .map(|line| line.split('\t').next().unwrap().to_string())
        .collect()
}

#[test]
fn test_index_then_overlap() {
    let dir = TempDir::new().unwrap();
    let bam_path = write_fixture(dir.path());
    let bam = bam_path.to_str().unwrap();

    let output = run(&["index", "-i", bam]);
    assert!(
        output.status.success(),
        "index failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(dir.path().join("fixture.bam.bit").exists());

    let out_path = dir.path().join("result.sam");
    let output = run(&[
        "overlap",
        "-i",
        bam,
        "-s",
        "chr1,100",
        "-e",
        "chr1,110",
        "-o",
        out_path.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "overlap failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(sam_record_names(&out_path), ["r0", "r1"]);
}

#[test]
fn test_overlap_builds_missing_index() {
    let dir = TempDir::new().unwrap();
    let bam_path = write_fixture(dir.path());
    let bam = bam_path.to_str().unwrap();

    let out_path = dir.path().join("result.sam");
    let output = run(&[
        "overlap",
        "-i",
        bam,
        "-s",
        "chr1,410",
        "-e",
        "chr2,15",
        "-o",
        out_path.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "overlap failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // The index is created on demand beside the input.
    assert!(dir.path().join("fixture.bam.bit").exists());
    assert_eq!(sam_record_names(&out_path), ["r3", "s0"]);
}

#[test]
fn test_overlap_empty_result_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let bam_path = write_fixture(dir.path());
    let bam = bam_path.to_str().unwrap();

    let out_path = dir.path().join("empty.sam");
    let output = run(&[
        "overlap",
        "-i",
        bam,
        "-s",
        "chr1,1500",
        "-e",
        "chr1,1999",
        "-o",
        out_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(sam_record_names(&out_path).is_empty());

    let text = std::fs::read_to_string(&out_path).unwrap();
    assert!(text.contains("@SQ\tSN:chr1\tLN:2000"));
}

#[test]
fn test_unknown_reference_fails() {
    let dir = TempDir::new().unwrap();
    let bam_path = write_fixture(dir.path());
    let bam = bam_path.to_str().unwrap();

    let output = run(&["overlap", "-i", bam, "-s", "chrX,1", "-e", "chrX,2"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(255));
}

#[test]
fn test_malformed_region_fails() {
    let dir = TempDir::new().unwrap();
    let bam_path = write_fixture(dir.path());
    let bam = bam_path.to_str().unwrap();

    for region in ["chr1", "chr1,abc", ",5", "chr1,"] {
        let output = run(&["overlap", "-i", bam, "-s", region, "-e", "chr1,10"]);
        assert!(!output.status.success(), "region '{region}' was accepted");
    }
}

#[test]
fn test_missing_input_fails() {
    let output = run(&["index", "-i", "/nonexistent/input.bam"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(255));
}

#[test]
fn test_depth_rejects_single_sample() {
    let dir = TempDir::new().unwrap();
    let bam_path = write_fixture(dir.path());
    let bam = bam_path.to_str().unwrap();

    let output = run(&["depth", "-i", bam, "-n", "1"]);
    assert!(!output.status.success());
}

#[test]
fn test_depth_is_reproducible_for_a_seed() {
    let dir = TempDir::new().unwrap();
    let bam_path = write_fixture(dir.path());
    let bam = bam_path.to_str().unwrap();

    let first = run(&["depth", "-i", bam, "-n", "10", "--seed", "0"]);
    assert!(
        first.status.success(),
        "depth failed: {}",
        String::from_utf8_lossy(&first.stderr)
    );
    let second = run(&["depth", "-i", bam, "-n", "10", "--seed", "0"]);
    assert!(second.status.success());

    assert_eq!(first.stdout, second.stdout);
    assert!(String::from_utf8_lossy(&first.stdout).contains("mean"));
}
