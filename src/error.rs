use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::abi::{ScalarKind, Status};

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("character {0:?} does not fit in one wide unit on this platform")]
    WideCharOutOfRange(char),
}

/// A call completed but the callee reported a non-zero status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{kind} returned {status}")]
pub struct CallError {
    pub kind: ScalarKind,
    pub status: Status,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("library {library} not found (searched {} directories)", .searched.len())]
    NotFound {
        library: String,
        searched: Vec<PathBuf>,
    },
    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("symbol {symbol} not found in {}: {source}", .path.display())]
    MissingSymbol {
        symbol: String,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("abi fingerprint mismatch: expected {expected:#x}, library has {found:#x}")]
    AbiMismatch { expected: u64, found: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("cannot allocate an empty block")]
    Empty,
    #[error("block of {0} bytes exceeds the allocator's limits")]
    TooLarge(usize),
    #[error("allocation of {0} bytes failed")]
    OutOfMemory(usize),
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Abi(#[from] AbiError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("{kind} sent {sent:#x} but the callee received {received:#x}")]
    Mismatch {
        kind: ScalarKind,
        sent: u64,
        received: u64,
    },
    #[error("callee reported {found} values for {expected} calls")]
    ObservationCount { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("caller program {program} not found: {source}")]
    ProgramNotFound {
        program: String,
        #[source]
        source: which::Error,
    },
    #[error("invalid search path: {0}")]
    SearchPath(#[from] std::env::JoinPathsError),
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} exited with {status}: {stderr}", .program.display())]
    Exited {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
}
