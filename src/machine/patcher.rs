// Mon Oct 19 2026 - Alex

use crate::machine::x86::{self, CMP_EAX_ZERO_IMM32, CMP_EAX_ZERO_IMM8, JMP_SHORT, JNZ_SHORT, ZERO_EAX_NOP};
use crate::scan::{ByteScanner, ScanError};
use crate::utils::PatchLog;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineOutcome {
    pub protection_skips: usize,
    pub return_checks: usize,
    /// imm32 compare-to-zero sites seen but left alone.
    pub wide_compares: usize,
}

impl MachineOutcome {
    pub fn total_rewrites(&self) -> usize {
        self.protection_skips + self.return_checks
    }
}

/// Rewrites protection checks in place as soon as they are found. There is no
/// compare-before-write here: a matched pattern is its own precondition.
pub struct MachineCodePatcher<'s> {
    sink: &'s dyn PatchLog,
    scanner: ByteScanner,
    lookahead: usize,
}

impl<'s> MachineCodePatcher<'s> {
    pub fn new(sink: &'s dyn PatchLog) -> Self {
        Self {
            sink,
            scanner: ByteScanner::new(),
            lookahead: x86::DEFAULT_LOOKAHEAD,
        }
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    pub fn patch_all(&self, buffer: &mut [u8]) -> Result<MachineOutcome, ScanError> {
        let protection_skips = self.patch_protection_skips(buffer)?;
        let return_checks = self.patch_return_checks(buffer)?;
        let wide_compares = self.count_wide_compares(buffer)?;

        Ok(MachineOutcome {
            protection_skips,
            return_checks,
            wide_compares,
        })
    }

    /// `test al,al` / `test eax,eax` followed within the lookahead by a short
    /// conditional branch. Only `jnz` becomes `jmp`; the displacement stays.
    pub fn patch_protection_skips(&self, buffer: &mut [u8]) -> Result<usize, ScanError> {
        let mut is_test = |w: &[u8]| x86::is_boolean_test(w);
        let mut rewritten = 0;
        let mut from = 0;

        while let Some(offset) = self.scanner.next_match(buffer, from, 2, &mut is_test)? {
            from = offset + 1;

            let window_start = offset + 2;
            let window_end = (window_start + self.lookahead).min(buffer.len());

            let Some(rel) = buffer[window_start..window_end]
                .iter()
                .position(|&b| x86::is_short_conditional(b))
            else {
                continue;
            };

            let branch = window_start + rel;
            if branch + 1 >= buffer.len() {
                continue;
            }

            if buffer[branch] == JNZ_SHORT {
                trace!("test at {:#x}, jnz at {:#x} -> jmp", offset, branch);
                buffer[branch] = JMP_SHORT;
                rewritten += 1;
            }
        }

        if rewritten > 0 {
            self.sink.emit(&format!("Protection-skip: rewrote {} jnz -> jmp", rewritten));
        }

        Ok(rewritten)
    }

    /// `cmp eax,0` directly followed by `jnz` becomes `xor eax,eax; nop`.
    pub fn patch_return_checks(&self, buffer: &mut [u8]) -> Result<usize, ScanError> {
        let mut is_check = |w: &[u8]| w[..3] == CMP_EAX_ZERO_IMM8 && w[3] == JNZ_SHORT;
        let mut rewritten = 0;
        let mut from = 0;

        while let Some(offset) = self.scanner.next_match(buffer, from, 4, &mut is_check)? {
            trace!("cmp eax,0 / jnz at {:#x}", offset);
            buffer[offset..offset + 3].copy_from_slice(&ZERO_EAX_NOP);
            rewritten += 1;
            from = offset + 3;
        }

        if rewritten > 0 {
            self.sink.emit(&format!("Return-check: rewrote {} cmp eax,0 -> xor eax,eax", rewritten));
        }

        Ok(rewritten)
    }

    /// `cmp eax, imm32 0` + `jnz`. Counted only: there is no length-preserving
    /// replacement for the 5-byte form yet.
    pub fn count_wide_compares(&self, buffer: &[u8]) -> Result<usize, ScanError> {
        let count = self.scanner
            .scan(buffer, 6, |w| w[..5] == CMP_EAX_ZERO_IMM32 && w[5] == JNZ_SHORT)?
            .count();

        if count > 0 {
            debug!("{} imm32 compare-to-zero site(s) left unpatched", count);
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemorySink;

    #[test]
    fn test_jnz_after_test_becomes_jmp() {
        let sink = MemorySink::new();
        let patcher = MachineCodePatcher::new(&sink);
        let mut code = [0x84, 0xC0, 0x75, 0x05];

        assert_eq!(patcher.patch_protection_skips(&mut code).unwrap(), 1);
        assert_eq!(code, [0x84, 0xC0, 0xEB, 0x05]);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_jz_after_test_is_left_alone() {
        let sink = MemorySink::new();
        let patcher = MachineCodePatcher::new(&sink);
        let mut code = [0x84, 0xC0, 0x74, 0x05];

        assert_eq!(patcher.patch_protection_skips(&mut code).unwrap(), 0);
        assert_eq!(code, [0x84, 0xC0, 0x74, 0x05]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_branch_found_within_lookahead() {
        let sink = MemorySink::new();
        let mut code = vec![0x85, 0xC0];
        code.extend_from_slice(&[0x90; 10]);
        code.extend_from_slice(&[0x75, 0x20]);

        let patcher = MachineCodePatcher::new(&sink);
        assert_eq!(patcher.patch_protection_skips(&mut code).unwrap(), 1);
        assert_eq!(code[12], 0xEB);
        assert_eq!(code[13], 0x20);
    }

    #[test]
    fn test_branch_beyond_lookahead_is_ignored() {
        let sink = MemorySink::new();
        let mut code = vec![0x84, 0xC0];
        code.extend_from_slice(&[0x90; 8]);
        code.extend_from_slice(&[0x75, 0x02]);

        let patcher = MachineCodePatcher::new(&sink).with_lookahead(4);
        assert_eq!(patcher.patch_protection_skips(&mut code).unwrap(), 0);
        assert_eq!(code[10], 0x75);
    }

    #[test]
    fn test_first_conditional_stops_lookahead() {
        let sink = MemorySink::new();
        let mut code = [0x84, 0xC0, 0x74, 0x02, 0x75, 0x02];

        let patcher = MachineCodePatcher::new(&sink);
        assert_eq!(patcher.patch_protection_skips(&mut code).unwrap(), 0);
        assert_eq!(code, [0x84, 0xC0, 0x74, 0x02, 0x75, 0x02]);
    }

    #[test]
    fn test_branch_without_displacement_is_skipped() {
        let sink = MemorySink::new();
        let mut code = [0x84, 0xC0, 0x75];

        let patcher = MachineCodePatcher::new(&sink);
        assert_eq!(patcher.patch_protection_skips(&mut code).unwrap(), 0);
        assert_eq!(code[2], 0x75);
    }

    #[test]
    fn test_return_check_zeroes_result() {
        let sink = MemorySink::new();
        let patcher = MachineCodePatcher::new(&sink);
        let mut code = [0x83, 0xF8, 0x00, 0x75, 0x02];

        assert_eq!(patcher.patch_return_checks(&mut code).unwrap(), 1);
        assert_eq!(code, [0x31, 0xC0, 0x90, 0x75, 0x02]);
        assert!(sink.contains("Return-check"));
    }

    #[test]
    fn test_wide_compare_is_detected_not_patched() {
        let sink = MemorySink::new();
        let patcher = MachineCodePatcher::new(&sink);
        let original = [0x3D, 0x00, 0x00, 0x00, 0x00, 0x75, 0x04];
        let mut code = original;

        let outcome = patcher.patch_all(&mut code).unwrap();
        assert_eq!(outcome.wide_compares, 1);
        assert_eq!(outcome.total_rewrites(), 0);
        assert_eq!(code, original);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let sink = MemorySink::new();
        let patcher = MachineCodePatcher::new(&sink);
        let mut empty: [u8; 0] = [];

        assert_eq!(patcher.patch_protection_skips(&mut empty), Err(ScanError::EmptyBuffer));
        assert_eq!(patcher.patch_return_checks(&mut empty), Err(ScanError::EmptyBuffer));
    }
}
