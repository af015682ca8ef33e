use bamtree::commands::{depth, index, overlap};
use bamtree::error::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::error;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Interval-tree indexing and overlap queries for coordinate-sorted BAM
/// files.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the interval-tree index and write it beside the input.
    Index {
        /// Path to the coordinate-sorted BAM file.
        #[clap(short = 'i', long, value_parser)]
        input: PathBuf,

        /// Number of BGZF decompression threads.
        #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(1).unwrap())]
        threads: NonZeroUsize,

        /// Verbose logging.
        #[clap(short = 'v', long, action)]
        verbose: bool,
    },

    /// Report alignments overlapping a query interval.
    Overlap {
        /// Path to the coordinate-sorted BAM file.
        #[clap(short = 'i', long, value_parser)]
        input: PathBuf,

        /// Query start as NAME,POSITION.
        #[clap(short = 's', long, value_parser)]
        start: String,

        /// Query end as NAME,POSITION.
        #[clap(short = 'e', long, value_parser)]
        end: String,

        /// Output path (SAM, or BAM for a .bam extension); stdout as SAM
        /// when omitted.
        #[clap(short = 'o', long, value_parser)]
        output: Option<PathBuf>,

        /// Number of BGZF decompression threads.
        #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(1).unwrap())]
        threads: NonZeroUsize,

        /// Verbose logging.
        #[clap(short = 'v', long, action)]
        verbose: bool,
    },

    /// Estimate read depth at uniform random positions.
    Depth {
        /// Path to the coordinate-sorted BAM file.
        #[clap(short = 'i', long, value_parser)]
        input: PathBuf,

        /// Number of positions to sample (at least 2).
        #[clap(short = 'n', long, value_parser)]
        samples: u64,

        /// RNG seed for reproducible estimates.
        #[clap(long, value_parser, default_value_t = 0)]
        seed: u64,

        /// Number of BGZF decompression threads.
        #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(1).unwrap())]
        threads: NonZeroUsize,

        /// Verbose logging.
        #[clap(short = 'v', long, action)]
        verbose: bool,
    },
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Index { verbose, .. }
            | Command::Overlap { verbose, .. }
            | Command::Depth { verbose, .. } => *verbose,
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Index { input, threads, .. } => index::run_index(&input, threads),
        Command::Overlap {
            input,
            start,
            end,
            output,
            threads,
            ..
        } => overlap::run_overlap(&input, &start, &end, output.as_deref(), threads),
        Command::Depth {
            input,
            samples,
            seed,
            threads,
            ..
        } => depth::run_depth(&input, samples, seed, threads),
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.command.verbose() { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(args.command) {
        error!("{e}");
        std::process::exit(-1);
    }
}
