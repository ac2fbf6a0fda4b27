// Mon Oct 19 2026 - Alex

use crate::scan::{ScanError, Signature};

#[derive(Debug, Clone, Copy, Default)]
pub struct ByteScanner {
    start: usize,
    end: Option<usize>,
}

impl ByteScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn with_end(mut self, end: usize) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_range(self, start: usize, end: usize) -> Self {
        self.with_start(start).with_end(end)
    }

    fn bounds(&self, len: usize, window: usize) -> Result<(usize, usize), ScanError> {
        if len == 0 {
            return Err(ScanError::EmptyBuffer);
        }
        if window == 0 {
            return Err(ScanError::ZeroWindow);
        }

        let end = self.end.unwrap_or(len);
        if self.start > end || end > len {
            return Err(ScanError::InvalidRange { start: self.start, end, len });
        }

        Ok((self.start, end))
    }

    pub fn scan<'a, F>(&self, buffer: &'a [u8], window: usize, predicate: F) -> Result<Matches<'a, F>, ScanError>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let (start, end) = self.bounds(buffer.len(), window)?;

        Ok(Matches {
            buffer,
            window,
            start,
            end,
            next: start,
            predicate,
        })
    }

    /// First offset at or after `from` whose window satisfies `predicate`.
    ///
    /// Mutating passes drive this directly: the returned offset is plain data,
    /// so the caller may rewrite the buffer before asking for the next match
    /// and the next window sees the rewritten bytes.
    pub fn next_match<F>(&self, buffer: &[u8], from: usize, window: usize, predicate: &mut F) -> Result<Option<usize>, ScanError>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let (start, end) = self.bounds(buffer.len(), window)?;
        Ok(next_in(buffer, from.max(start), end, window, predicate))
    }

    pub fn find_all(&self, buffer: &[u8], signature: &Signature) -> Result<Vec<usize>, ScanError> {
        if signature.is_empty() {
            return Err(ScanError::EmptySignature);
        }

        Ok(self.scan(buffer, signature.len(), |w| signature.matches(w))?.collect())
    }

    pub fn find_first(&self, buffer: &[u8], signature: &Signature) -> Result<Option<usize>, ScanError> {
        if signature.is_empty() {
            return Err(ScanError::EmptySignature);
        }

        Ok(self.scan(buffer, signature.len(), |w| signature.matches(w))?.next())
    }

    pub fn count(&self, buffer: &[u8], signature: &Signature) -> Result<usize, ScanError> {
        Ok(self.find_all(buffer, signature)?.len())
    }
}

fn next_in<F>(buffer: &[u8], mut offset: usize, end: usize, window: usize, predicate: &mut F) -> Option<usize>
where
    F: FnMut(&[u8]) -> bool,
{
    while let Some(stop) = offset.checked_add(window) {
        if stop > end {
            break;
        }
        if predicate(&buffer[offset..stop]) {
            return Some(offset);
        }
        offset += 1;
    }

    None
}

/// Lazy offsets of matching windows. Finite, and `rewind` restarts it.
#[derive(Clone)]
pub struct Matches<'a, F> {
    buffer: &'a [u8],
    window: usize,
    start: usize,
    end: usize,
    next: usize,
    predicate: F,
}

impl<'a, F> Matches<'a, F> {
    pub fn rewind(&mut self) {
        self.next = self.start;
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl<'a, F> Iterator for Matches<'a, F>
where
    F: FnMut(&[u8]) -> bool,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let found = next_in(self.buffer, self.next, self.end, self.window, &mut self.predicate);
        self.next = match found {
            Some(offset) => offset + 1,
            None => self.end,
        };
        found
    }
}
