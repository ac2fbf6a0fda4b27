// Mon Oct 19 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Buffer is empty")]
    EmptyBuffer,
    #[error("Window length must be non-zero")]
    ZeroWindow,
    #[error("Signature has no bytes")]
    EmptySignature,
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Scan range {start:#x}..{end:#x} outside buffer of {len:#x} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },
}
