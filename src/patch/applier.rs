// Mon Oct 19 2026 - Alex

use crate::patch::PendingPatch;
use crate::scan::ScanError;
use crate::utils::PatchLog;
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutcome {
    pub scanned: usize,
    pub planned: usize,
    pub applied: usize,
    pub rejected: usize,
}

impl PatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.rejected == 0
    }
}

impl AddAssign for PatchOutcome {
    fn add_assign(&mut self, other: Self) {
        self.scanned += other.scanned;
        self.planned += other.planned;
        self.applied += other.applied;
        self.rejected += other.rejected;
    }
}

/// Commits planned patches with compare-and-write. A record whose byte has
/// changed since planning is rejected and the byte is left as found.
///
/// Not atomic against anything else touching the same buffer; callers own
/// exclusive access for the duration of one `apply`.
pub struct PatchApplier<'s> {
    sink: &'s dyn PatchLog,
}

impl<'s> PatchApplier<'s> {
    pub fn new(sink: &'s dyn PatchLog) -> Self {
        Self { sink }
    }

    pub fn apply(&self, buffer: &mut [u8], patches: &[PendingPatch]) -> Result<PatchOutcome, ScanError> {
        if buffer.is_empty() {
            return Err(ScanError::EmptyBuffer);
        }

        let mut outcome = PatchOutcome {
            scanned: buffer.len(),
            planned: patches.len(),
            ..Default::default()
        };

        for patch in patches {
            if patch.is_applicable(buffer) {
                buffer[patch.offset] = patch.replacement;
                outcome.applied += 1;
            } else {
                debug!(
                    "rejected {} (found {})",
                    patch,
                    buffer.get(patch.offset).map_or("out of range".to_string(), |b| format!("{:02X}", b))
                );
                outcome.rejected += 1;
            }
        }

        if outcome.planned > 0 {
            self.sink.emit(&format!(
                "Applied {} of {} planned patch(es), {} rejected",
                outcome.applied, outcome.planned, outcome.rejected
            ));
        }

        Ok(outcome)
    }

    /// What `apply` would report, without writing. Later records targeting
    /// an offset an earlier record already rewrote are counted as rejected,
    /// exactly as `apply` would see them.
    pub fn preview(&self, buffer: &[u8], patches: &[PendingPatch]) -> Result<PatchOutcome, ScanError> {
        if buffer.is_empty() {
            return Err(ScanError::EmptyBuffer);
        }

        let mut shadow = buffer.to_vec();
        let mut outcome = PatchOutcome {
            scanned: buffer.len(),
            planned: patches.len(),
            ..Default::default()
        };

        for patch in patches {
            if patch.is_applicable(&shadow) {
                shadow[patch.offset] = patch.replacement;
                outcome.applied += 1;
            } else {
                outcome.rejected += 1;
            }
        }

        Ok(outcome)
    }
}
