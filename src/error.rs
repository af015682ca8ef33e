use std::fmt;
use std::io;

/// Errors raised while building, persisting, or querying an interval index.
#[derive(Debug)]
pub enum IndexError {
    /// The input header does not declare `SO:coordinate`.
    UnsortedInput,
    /// A record broke the sorted-ascending assumption mid-stream.
    OutOfOrderInput { ref_id: i32, offset: i32 },
    /// The persisted index could not be decoded.
    CorruptIndex(String),
    /// The persisted index was built over a different alignment file.
    StaleIndex(String),
    /// An underlying read, write, or seek failed.
    Io(io::Error),
    /// A caller-supplied argument was rejected.
    InvalidArgument(String),
    /// The stream walk could not honor a candidate produced by the tree.
    InternalInvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::UnsortedInput => {
                write!(f, "input is not coordinate-sorted (header must carry SO:coordinate)")
            }
            IndexError::OutOfOrderInput { ref_id, offset } => write!(
                f,
                "record at reference {ref_id}, offset {offset} is out of order"
            ),
            IndexError::CorruptIndex(msg) => write!(f, "corrupt index: {msg}"),
            IndexError::StaleIndex(msg) => write!(f, "stale index: {msg}"),
            IndexError::Io(e) => write!(f, "IO error: {e}"),
            IndexError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            IndexError::InternalInvariantViolation(msg) => {
                write!(f, "internal invariant violated: {msg}")
            }
        }
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IndexError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for IndexError {
    fn from(e: io::Error) -> Self {
        IndexError::Io(e)
    }
}
