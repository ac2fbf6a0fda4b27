// Mon Oct 19 2026 - Alex

pub mod error;
pub mod scanner;
pub mod signature;

pub use error::ScanError;
pub use scanner::{ByteScanner, Matches};
pub use signature::{Signature, SignatureBuilder};

/// Every offset where `predicate` accepts the `window` bytes starting there.
pub fn scan<F>(buffer: &[u8], window: usize, predicate: F) -> Result<Matches<'_, F>, ScanError>
where
    F: FnMut(&[u8]) -> bool,
{
    ByteScanner::new().scan(buffer, window, predicate)
}

pub fn find_signature<'a>(buffer: &'a [u8], signature: &'a Signature) -> Result<Vec<usize>, ScanError> {
    ByteScanner::new().find_all(buffer, signature)
}
