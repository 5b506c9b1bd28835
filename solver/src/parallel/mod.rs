mod comm;
mod partition;
mod reduce;

pub use comm::*;
pub use partition::*;
pub use reduce::*;

use thiserror::Error;

/// Inconsistencies between ranks, threads and buffers. They would silently
/// corrupt the physics, so every one of them aborts the run.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TopologyError {
    #[error("a world needs at least one rank")]
    EmptyWorld,
    #[error("partition was built for {expected} ranks, communicator has {found}")]
    RankMismatch { expected: usize, found: usize },
    #[error("partial force buffer has wrong shape for {natoms} atoms and {threads} threads")]
    PartialSize { natoms: usize, threads: usize },
    #[error("force array has {found} entries, expected {expected}")]
    ForceSize { expected: usize, found: usize },
    #[error("ranks disagree on collective buffer length: {lengths:?}")]
    LengthMismatch { lengths: Vec<usize> },
    #[error("can't start force threads: {0}")]
    ThreadPool(String),
    #[error("rank {rank} failed its layout checks")]
    PeerFailed { rank: usize },
    #[error("another rank stopped before reaching the collective")]
    Aborted,
}
