// Mon Oct 19 2026 - Alex

use crate::ifr::PlanSummary;
use crate::machine::MachineOutcome;
use crate::patch::{PatchOutcome, PendingPatch};
use crate::vendor::VendorProfile;
use serde::{Deserialize, Serialize};

/// Everything planning produced for one module, before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub patches: Vec<PendingPatch>,
    pub ifr: PlanSummary,
    pub form_sets: usize,
    pub vendor_rule_hits: usize,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleReport {
    pub name: String,
    pub base: u64,
    pub size: usize,
    pub dry_run: bool,
    pub machine: MachineOutcome,
    pub flags_unlocked: usize,
    pub ifr: PlanSummary,
    pub form_sets: usize,
    pub vendor_rule_hits: usize,
    pub outcome: PatchOutcome,
    pub patches: Vec<PendingPatch>,
    pub error: Option<String>,
}

impl ModuleReport {
    pub fn new(name: &str, base: u64, size: usize) -> Self {
        Self {
            name: name.to_string(),
            base,
            size,
            dry_run: false,
            machine: MachineOutcome::default(),
            flags_unlocked: 0,
            ifr: PlanSummary::default(),
            form_sets: 0,
            vendor_rule_hits: 0,
            outcome: PatchOutcome::default(),
            patches: Vec::new(),
            error: None,
        }
    }

    pub fn failed(name: &str, base: u64, size: usize, error: &str) -> Self {
        let mut report = Self::new(name, base, size);
        report.error = Some(error.to_string());
        report
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn total_changes(&self) -> usize {
        self.machine.total_rewrites() + self.flags_unlocked + self.outcome.applied
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub profile: VendorProfile,
    pub modules: Vec<ModuleReport>,
    pub totals: PatchOutcome,
}

impl BatchReport {
    pub fn new(profile: VendorProfile) -> Self {
        Self {
            profile,
            modules: Vec::new(),
            totals: PatchOutcome::default(),
        }
    }

    pub fn push(&mut self, report: ModuleReport) {
        self.totals += report.outcome;
        self.modules.push(report);
    }

    pub fn failed_count(&self) -> usize {
        self.modules.iter().filter(|m| m.is_failed()).count()
    }

    pub fn patched_count(&self) -> usize {
        self.modules.iter().filter(|m| m.total_changes() > 0).count()
    }

    pub fn total_changes(&self) -> usize {
        self.modules.iter().map(|m| m.total_changes()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_totals() {
        let mut batch = BatchReport::new(VendorProfile::Generic);

        let mut ok = ModuleReport::new("Setup", 0x1000, 64);
        ok.outcome = PatchOutcome { scanned: 64, planned: 3, applied: 2, rejected: 1 };
        ok.machine.protection_skips = 1;
        batch.push(ok);
        batch.push(ModuleReport::failed("Broken", 0x2000, 0, "Module image 'Broken' is empty"));

        assert_eq!(batch.totals.applied, 2);
        assert_eq!(batch.failed_count(), 1);
        assert_eq!(batch.patched_count(), 1);
        assert_eq!(batch.total_changes(), 3);
    }
}
