// Mon Oct 19 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPatch {
    pub offset: usize,
    pub expected: u8,
    pub replacement: u8,
    pub description: String,
}

impl PendingPatch {
    pub fn new(offset: usize, expected: u8, replacement: u8, description: impl Into<String>) -> Self {
        Self {
            offset,
            expected,
            replacement,
            description: description.into(),
        }
    }

    pub fn is_applicable(&self, data: &[u8]) -> bool {
        data.get(self.offset) == Some(&self.expected)
    }

    pub fn is_noop(&self) -> bool {
        self.expected == self.replacement
    }
}

impl fmt::Display for PendingPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08x}: {:02X} -> {:02X} ({})",
            self.offset, self.expected, self.replacement, self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_applicable_checks_bounds_and_byte() {
        let patch = PendingPatch::new(2, 0x46, 0x47, "SuppressIf: True -> False");
        assert!(patch.is_applicable(&[0x0A, 0x82, 0x46]));
        assert!(!patch.is_applicable(&[0x0A, 0x82, 0x47]));
        assert!(!patch.is_applicable(&[0x0A, 0x82]));
    }

    #[test]
    fn test_display() {
        let patch = PendingPatch::new(0x10, 0x74, 0xEB, "gate");
        assert_eq!(patch.to_string(), "0x00000010: 74 -> EB (gate)");
        assert!(!patch.is_noop());
    }
}
