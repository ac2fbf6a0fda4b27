// Mon Oct 19 2026 - Alex

use crate::engine::BatchReport;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchReport {
    pub version: String,
    pub generated_at: String,
    pub batch: BatchReport,
}

impl PatchReport {
    pub fn new(batch: BatchReport) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: unix_timestamp(),
            batch,
        }
    }
}

fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    secs.to_string()
}

/// Plain-text summary, one block per module.
pub fn text_report(batch: &BatchReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Setup Unlock Report ({})", batch.profile);
    let _ = writeln!(out, "==========================");
    let _ = writeln!(out);

    for module in &batch.modules {
        let _ = writeln!(out, "{} @ 0x{:x} ({} bytes)", module.name, module.base, module.size);

        if let Some(ref error) = module.error {
            let _ = writeln!(out, "  skipped: {}", error);
            let _ = writeln!(out);
            continue;
        }

        let _ = writeln!(out, "  protection-skip rewrites: {}", module.machine.protection_skips);
        let _ = writeln!(out, "  return-check rewrites:    {}", module.machine.return_checks);
        if module.machine.wide_compares > 0 {
            let _ = writeln!(out, "  imm32 compares unpatched: {}", module.machine.wide_compares);
        }
        let _ = writeln!(out, "  flags unlocked:           {}", module.flags_unlocked);
        let _ = writeln!(
            out,
            "  planned {} / applied {} / rejected {}",
            module.outcome.planned, module.outcome.applied, module.outcome.rejected
        );
        for patch in &module.patches {
            let _ = writeln!(out, "    {}", patch);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Total: {} module(s), {} failed, {} change(s)",
        batch.modules.len(),
        batch.failed_count(),
        batch.total_changes()
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ModuleReport;
    use crate::vendor::VendorProfile;

    #[test]
    fn test_text_report_lists_failures() {
        let mut batch = BatchReport::new(VendorProfile::Generic);
        batch.push(ModuleReport::new("Setup", 0x1000, 32));
        batch.push(ModuleReport::failed("Bad", 0x2000, 0, "Module image 'Bad' is empty"));

        let text = text_report(&batch);
        assert!(text.contains("Setup @ 0x1000 (32 bytes)"));
        assert!(text.contains("skipped: Module image 'Bad' is empty"));
        assert!(text.contains("2 module(s), 1 failed"));
    }
}
