//! DSU protocol error types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("truncated header: need 20 bytes, got {actual}")]
    TruncatedHeader { actual: usize },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
