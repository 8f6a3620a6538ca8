use miette::Diagnostic;
use thiserror::Error;

/// Fatal startup failures. Per spec, transient faults (malformed commands,
/// recv errors) are absorbed locally and never surface here; only
/// construction-time invariants are fatal.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to bind firmware socket on {addr}")]
    FirmwareBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to bind operator server on {addr}")]
    OperatorBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
