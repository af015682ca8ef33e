// lib.rs
pub mod bam;
pub mod codec;
pub mod commands;
pub mod depth;
pub mod error;
pub mod forest;
pub mod output;
pub mod query;
pub mod record;
pub mod seqidx;
pub mod tree;
