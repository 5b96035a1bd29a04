//! Error types

use thiserror::Error;

/// Errors surfaced to callers of the simulation.
///
/// Nothing here is fatal: a rejected control request leaves the session in
/// the state it was in.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown track: {0}")]
    UnknownTrack(String),

    #[error("no track selected")]
    NoTrackSelected,

    #[error("invalid track {id:?}: {reason}")]
    InvalidTrack { id: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
