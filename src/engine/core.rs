// Mon Oct 19 2026 - Alex

use crate::config::{Config, ConfigError};
use crate::engine::result::{BatchReport, ModuleReport, Plan};
use crate::ifr::{ConditionPlanner, FormReader, PlanSummary, PlannerOptions};
use crate::image::ModuleImage;
use crate::machine::MachineCodePatcher;
use crate::patch::PatchApplier;
use crate::scan::ScanError;
use crate::utils::PatchLog;
use crate::vendor::{plan_rules, FlagUnlocker, HeuristicSet, Passes};
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Module image '{0}' is empty")]
    EmptyImage(String),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Drives one vendor's heuristic set over module images.
///
/// Per module: immediate machine-code rewrites and flag unlock first, then
/// IFR conditions and vendor rules are planned against the resulting bytes
/// and committed with compare-and-write.
pub struct PatchEngine<'s> {
    config: Config,
    heuristics: HeuristicSet,
    sink: &'s dyn PatchLog,
}

impl<'s> PatchEngine<'s> {
    pub fn new(config: Config, sink: &'s dyn PatchLog) -> Result<Self, EngineError> {
        config.validate()?;
        let heuristics = HeuristicSet::for_profile(config.profile).without(config.disabled_mask()?);

        debug!("profile {} runs {:?}", config.profile, heuristics.passes);

        Ok(Self {
            config,
            heuristics,
            sink,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn heuristics(&self) -> &HeuristicSet {
        &self.heuristics
    }

    /// Deferred patches for `bytes`, for callers that inspect before committing.
    pub fn plan(&self, bytes: &[u8]) -> Result<Plan, EngineError> {
        if bytes.is_empty() {
            return Err(ScanError::EmptyBuffer.into());
        }

        let mut plan = Plan::default();

        if self.heuristics.runs(Passes::IFR_CONDITIONS) && self.config.planner.any_enabled() {
            self.plan_ifr(bytes, &mut plan)?;
        }

        if self.heuristics.runs(Passes::VENDOR_RULES) && !self.heuristics.rules.is_empty() {
            let hits = plan_rules(bytes, &self.heuristics.rules)?;
            if !hits.is_empty() {
                self.sink.emit(&format!("Vendor rules: planned {} patch(es)", hits.len()));
            }
            plan.vendor_rule_hits = hits.len();
            plan.patches.extend(hits);
        }

        Ok(plan)
    }

    fn plan_ifr(&self, bytes: &[u8], plan: &mut Plan) -> Result<(), EngineError> {
        let starts = if self.config.locate_form_sets {
            FormReader::new(bytes).locate_form_sets()?
        } else {
            Vec::new()
        };
        plan.form_sets = starts.len();

        let structured = ConditionPlanner::new(self.sink).with_options(PlannerOptions {
            loose_true_scan: false,
            ..self.config.planner
        });
        let loose = ConditionPlanner::new(self.sink).with_options(self.config.planner);
        let scan_loose = self.config.planner.loose_true_scan;

        // Without a located form set the whole module is treated as IFR.
        if starts.is_empty() {
            let (patches, summary) = structured.plan_with_summary(bytes, 0)?;
            merge_summary(&mut plan.ifr, &summary);
            plan.patches.extend(patches);

            if scan_loose {
                let hits = loose.plan_loose(bytes, 0, bytes.len())?;
                plan.ifr.loose += hits.len();
                plan.patches.extend(hits);
            }
            return Ok(());
        }

        for start in starts {
            let (patches, summary) = structured.plan_with_summary(bytes, start)?;
            merge_summary(&mut plan.ifr, &summary);
            plan.patches.extend(patches);

            if scan_loose {
                // a header that did not fit still gets its own window checked
                let end = if summary.truncated {
                    (summary.end + 4).min(bytes.len())
                } else {
                    summary.end
                };
                let hits = loose.plan_loose(bytes, start, end)?;
                plan.ifr.loose += hits.len();
                plan.patches.extend(hits);
            }
        }

        Ok(())
    }

    pub fn run_module(&self, image: &mut ModuleImage<'_>) -> Result<ModuleReport, EngineError> {
        if image.is_empty() {
            return Err(EngineError::EmptyImage(image.name().to_string()));
        }

        if self.config.dry_run {
            let mut scratch = image.bytes().to_vec();
            return self.run_bytes(image.name(), image.base(), &mut scratch);
        }

        let name = image.name().to_string();
        let base = image.base();
        self.run_bytes(&name, base, image.bytes_mut())
    }

    fn run_bytes(&self, name: &str, base: u64, bytes: &mut [u8]) -> Result<ModuleReport, EngineError> {
        let mut report = ModuleReport::new(name, base, bytes.len());
        report.dry_run = self.config.dry_run;

        let machine = MachineCodePatcher::new(self.sink).with_lookahead(self.config.lookahead);
        if self.heuristics.runs(Passes::PROTECTION_SKIP) {
            report.machine.protection_skips = machine.patch_protection_skips(bytes)?;
        }
        if self.heuristics.runs(Passes::RETURN_CHECK) {
            report.machine.return_checks = machine.patch_return_checks(bytes)?;
            report.machine.wide_compares = machine.count_wide_compares(bytes)?;
        }

        if self.heuristics.runs(Passes::FLAG_UNLOCK) {
            report.flags_unlocked = FlagUnlocker::new(self.sink)
                .with_sentinel(self.config.visible_sentinel)
                .unlock(bytes)?;
        }

        let plan = self.plan(bytes)?;
        report.outcome = PatchApplier::new(self.sink).apply(bytes, &plan.patches)?;
        report.ifr = plan.ifr;
        report.form_sets = plan.form_sets;
        report.vendor_rule_hits = plan.vendor_rule_hits;
        report.patches = plan.patches;

        info!(
            "{}: {} immediate, {}/{} planned applied{}",
            name,
            report.machine.total_rewrites() + report.flags_unlocked,
            report.outcome.applied,
            report.outcome.planned,
            if report.dry_run { " (dry run)" } else { "" }
        );

        Ok(report)
    }

    /// Runs every image; a failing module becomes a failed report and the
    /// rest of the batch still runs.
    pub fn run_batch<'a, I>(&self, images: I) -> BatchReport
    where
        I: IntoIterator<Item = ModuleImage<'a>>,
    {
        let mut batch = BatchReport::new(self.config.profile);

        for mut image in images {
            match self.run_module(&mut image) {
                Ok(report) => batch.push(report),
                Err(e) => {
                    warn!("{}: {}", image.name(), e);
                    self.sink.emit(&format!("{}: skipped ({})", image.name(), e));
                    batch.push(ModuleReport::failed(image.name(), image.base(), image.size(), &e.to_string()));
                }
            }
        }

        batch
    }
}

fn merge_summary(total: &mut PlanSummary, summary: &PlanSummary) {
    total.records += summary.records;
    total.guards += summary.guards;
    total.guarded_records += summary.guarded_records;
    total.structured += summary.structured;
    total.truncated |= summary.truncated;
    total.form_set_closed |= summary.form_set_closed;
    total.end = total.end.max(summary.end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemorySink, NullSink};
    use crate::vendor::VendorProfile;

    fn form_set_with_guard() -> Vec<u8> {
        let mut data = vec![0x0E, 0x80 | 23];
        data.extend_from_slice(&[0x5A; 21]);
        // SuppressIf(scope) True End, GrayOutIf(scope) EqIdVal End, End
        data.extend_from_slice(&[0x0A, 0x82, 0x46, 0x02, 0x29, 0x02]);
        data.extend_from_slice(&[0x19, 0x82, 0x12, 0x08, 0x01, 0x00, 0x02, 0x00, 0x01, 0x00, 0x29, 0x02]);
        data.extend_from_slice(&[0x29, 0x02]);
        data
    }

    #[test]
    fn test_generic_profile_unlocks_ifr_only() {
        let sink = MemorySink::new();
        let engine = PatchEngine::new(Config::default(), &sink).unwrap();

        let mut bytes = vec![0x84, 0xC0, 0x75, 0x05];
        bytes.extend(form_set_with_guard());
        let mut image = ModuleImage::new("SetupBrowser", 0x8000_0000, &mut bytes);

        let report = engine.run_module(&mut image).unwrap();

        assert_eq!(report.machine.protection_skips, 0);
        assert_eq!(report.form_sets, 1);
        assert_eq!(report.ifr.structured, 2);
        assert_eq!(report.ifr.loose, 1);
        assert_eq!(report.outcome.applied, 2);
        assert_eq!(report.outcome.rejected, 1);

        // jnz untouched, True and EqIdVal turned into False
        assert_eq!(bytes[2], 0x75);
        assert_eq!(bytes[4 + 25], 0x47);
        assert_eq!(bytes[4 + 31], 0x47);
    }

    #[test]
    fn test_family_a_runs_machine_passes() {
        let config = Config::default().with_profile(VendorProfile::FamilyA);
        let engine = PatchEngine::new(config, &NullSink).unwrap();

        let mut bytes = vec![0x84, 0xC0, 0x75, 0x05, 0x90, 0x83, 0xF8, 0x00, 0x75, 0x02];
        let mut image = ModuleImage::new("Security", 0, &mut bytes);
        let report = engine.run_module(&mut image).unwrap();

        assert_eq!(report.machine.protection_skips, 1);
        assert_eq!(report.machine.return_checks, 1);
        assert_eq!(bytes, vec![0x84, 0xC0, 0xEB, 0x05, 0x90, 0x31, 0xC0, 0x90, 0x75, 0x02]);
    }

    #[test]
    fn test_family_a_keeps_jz_after_call_gate() {
        let config = Config::default().with_profile(VendorProfile::FamilyA);
        let engine = PatchEngine::new(config, &NullSink).unwrap();

        let mut bytes = vec![0xE8, 0x11, 0x22, 0x33, 0x44, 0x84, 0xC0, 0x74, 0x05];
        let original = bytes.clone();
        let mut image = ModuleImage::new("SetupCore", 0, &mut bytes);
        let report = engine.run_module(&mut image).unwrap();

        assert_eq!(report.total_changes(), 0);
        assert_eq!(report.vendor_rule_hits, 0);
        assert_eq!(bytes, original);
    }

    #[test]
    fn test_loose_scan_stays_inside_located_form_sets() {
        let engine = PatchEngine::new(Config::default(), &NullSink).unwrap();

        // code bytes that happen to read as {SuppressIf, *, True, *}
        let mut bytes = vec![0x0A, 0x00, 0x46, 0x00];
        bytes.extend(form_set_with_guard());
        let mut image = ModuleImage::new("SetupBrowser", 0, &mut bytes);
        let report = engine.run_module(&mut image).unwrap();

        assert_eq!(report.form_sets, 1);
        assert_eq!(report.ifr.loose, 1);
        assert_eq!(report.outcome.applied, 2);
        assert_eq!(bytes[2], 0x46);

        // with nothing located the whole module is scanned
        let mut bare = vec![0x0A, 0x04, 0x46, 0x29];
        let mut image = ModuleImage::new("Fragment", 0, &mut bare);
        let report = engine.run_module(&mut image).unwrap();

        assert_eq!(report.form_sets, 0);
        assert_eq!(report.outcome.applied, 1);
        assert_eq!(bare[2], 0x47);
    }

    #[test]
    fn test_family_b_flag_unlock() {
        let config = Config::default().with_profile(VendorProfile::FamilyB);
        let engine = PatchEngine::new(config, &NullSink).unwrap();

        let mut bytes: Vec<u8> = (1..=16).map(|i| i * 13).collect();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        let mut image = ModuleImage::new("OemData", 0, &mut bytes);
        let report = engine.run_module(&mut image).unwrap();

        assert_eq!(report.flags_unlocked, 1);
        assert_eq!(bytes[16], 0x01);
    }

    #[test]
    fn test_dry_run_leaves_image_untouched() {
        let config = Config::default().with_profile(VendorProfile::FamilyA).with_dry_run(true);
        let engine = PatchEngine::new(config, &NullSink).unwrap();

        let mut bytes = vec![0x84, 0xC0, 0x75, 0x05];
        bytes.extend(form_set_with_guard());
        let original = bytes.clone();
        let mut image = ModuleImage::new("Setup", 0, &mut bytes);
        let report = engine.run_module(&mut image).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.machine.protection_skips, 1);
        assert_eq!(report.outcome.applied, 2);
        assert_eq!(bytes, original);
    }

    #[test]
    fn test_disabled_pass_is_skipped() {
        let config = Config::default().with_profile(VendorProfile::FamilyA).disable_pass("protection-skip");
        let engine = PatchEngine::new(config, &NullSink).unwrap();
        assert!(!engine.heuristics().runs(Passes::PROTECTION_SKIP));

        let mut bytes = vec![0x84, 0xC0, 0x75, 0x05];
        let mut image = ModuleImage::new("Setup", 0, &mut bytes);
        engine.run_module(&mut image).unwrap();
        assert_eq!(bytes[2], 0x75);
    }

    #[test]
    fn test_plan_is_inspectable_before_commit() {
        let engine = PatchEngine::new(Config::default(), &NullSink).unwrap();
        let bytes = form_set_with_guard();
        let plan = engine.plan(&bytes).unwrap();

        assert_eq!(plan.len(), 3);
        assert!(plan.patches.iter().all(|p| p.replacement == 0x47));
        assert_eq!(bytes[25], 0x46);
    }

    #[test]
    fn test_batch_survives_failing_module() {
        let sink = MemorySink::new();
        let engine = PatchEngine::new(Config::default(), &sink).unwrap();

        let mut empty: Vec<u8> = Vec::new();
        let mut good = form_set_with_guard();
        let images = vec![
            ModuleImage::new("Empty", 0x1000, &mut empty),
            ModuleImage::new("Setup", 0x2000, &mut good),
        ];

        let batch = engine.run_batch(images);

        assert_eq!(batch.modules.len(), 2);
        assert_eq!(batch.failed_count(), 1);
        assert!(batch.modules[0].is_failed());
        assert_eq!(batch.modules[1].outcome.applied, 2);
        assert_eq!(batch.totals.applied, 2);
        assert!(sink.contains("Empty: skipped"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config::default().disable_pass("nonsense");
        assert!(matches!(PatchEngine::new(config, &NullSink), Err(EngineError::Config(_))));
    }
}
