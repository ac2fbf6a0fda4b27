// Mon Oct 19 2026 - Alex

use crate::ifr::reader::{FormReader, Record};
use crate::ifr::{GuardKind, IfrOpcode};
use crate::patch::PendingPatch;
use crate::scan::{ByteScanner, ScanError};
use crate::utils::PatchLog;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    pub suppress_if: bool,
    pub gray_out_if: bool,
    pub disable_if: bool,
    /// Also match raw `{guard, *, True, *}` windows outside the record walk.
    /// The window knows nothing about record boundaries, so on bytes that are
    /// not IFR (x86 code, data) it can hit a stray `0x46`. `PatchEngine`
    /// confines it to located form sets whenever it finds any.
    pub loose_true_scan: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            suppress_if: true,
            gray_out_if: true,
            disable_if: true,
            loose_true_scan: true,
        }
    }
}

impl PlannerOptions {
    pub fn allows(&self, kind: GuardKind) -> bool {
        match kind {
            GuardKind::SuppressIf => self.suppress_if,
            GuardKind::GrayOutIf => self.gray_out_if,
            GuardKind::DisableIf => self.disable_if,
        }
    }

    pub fn any_enabled(&self) -> bool {
        GuardKind::ALL.iter().any(|&k| self.allows(k))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub records: usize,
    pub guards: usize,
    /// Records seen while inside a scoped guard.
    pub guarded_records: usize,
    pub structured: usize,
    pub loose: usize,
    /// The walk hit a header that did not fit the buffer.
    pub truncated: bool,
    /// The walk ended on the `End` that closes the form set.
    pub form_set_closed: bool,
    /// Offset the walk stopped at: past the closing `End`, at the header
    /// that did not fit, or the end of the buffer.
    pub end: usize,
}

/// Plans `condition -> False` rewrites for every guard it can vouch for.
/// Nothing is written here; the records go to `PatchApplier`.
pub struct ConditionPlanner<'s> {
    sink: &'s dyn PatchLog,
    options: PlannerOptions,
}

impl<'s> ConditionPlanner<'s> {
    pub fn new(sink: &'s dyn PatchLog) -> Self {
        Self {
            sink,
            options: PlannerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PlannerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    pub fn plan(&self, data: &[u8], start: usize) -> Result<Vec<PendingPatch>, ScanError> {
        self.plan_with_summary(data, start).map(|(patches, _)| patches)
    }

    pub fn plan_with_summary(&self, data: &[u8], start: usize) -> Result<(Vec<PendingPatch>, PlanSummary), ScanError> {
        if data.is_empty() {
            return Err(ScanError::EmptyBuffer);
        }
        if start > data.len() {
            return Err(ScanError::InvalidRange { start, end: data.len(), len: data.len() });
        }

        let mut summary = PlanSummary::default();
        let mut patches = Vec::new();

        self.walk_records(data, start, &mut patches, &mut summary);
        summary.structured = patches.len();

        if self.options.loose_true_scan {
            self.scan_loose(data, start, data.len(), &mut patches)?;
            summary.loose = patches.len() - summary.structured;
        }

        if !patches.is_empty() {
            self.sink.emit(&format!(
                "IFR: planned {} condition patch(es) ({} structured, {} loose) over {} record(s)",
                patches.len(),
                summary.structured,
                summary.loose,
                summary.records
            ));
        }

        Ok((patches, summary))
    }

    fn walk_records(&self, data: &[u8], start: usize, patches: &mut Vec<PendingPatch>, summary: &mut PlanSummary) {
        let reader = FormReader::new(data);
        let mut records = reader.records_from(start);

        let mut depth = 0usize;
        let mut form_set_depth: Option<usize> = None;
        let mut region: Option<(GuardKind, usize)> = None;

        for record in records.by_ref() {
            summary.records += 1;
            if region.is_some() {
                summary.guarded_records += 1;
            }

            match record.opcode() {
                IfrOpcode::End => {
                    depth = depth.saturating_sub(1);
                    if region.is_some_and(|(_, d)| depth <= d) {
                        region = None;
                    }
                    if form_set_depth.is_some_and(|d| depth <= d) {
                        summary.form_set_closed = true;
                        break;
                    }
                    continue;
                }
                IfrOpcode::FormSet if form_set_depth.is_none() => {
                    form_set_depth = Some(depth);
                }
                opcode => {
                    if let Some(kind) = opcode.guard_kind() {
                        summary.guards += 1;
                        if region.is_none() && record.header.scope {
                            region = Some((kind, depth));
                        }
                        if self.options.allows(kind) {
                            if let Some(patch) = plan_guard(&reader, &record, kind) {
                                patches.push(patch);
                            }
                        }
                    }
                }
            }

            if record.header.scope {
                depth += 1;
            }
        }

        summary.end = records.position();
        summary.truncated = records.truncated() && !summary.form_set_closed;
        if summary.truncated {
            debug!("IFR walk stopped at 0x{:x}: header does not fit", records.position());
        }
    }

    /// Only the raw `{guard, *, True, *}` windows lying inside `[start, end)`.
    pub fn plan_loose(&self, data: &[u8], start: usize, end: usize) -> Result<Vec<PendingPatch>, ScanError> {
        let mut patches = Vec::new();
        self.scan_loose(data, start, end, &mut patches)?;
        Ok(patches)
    }

    fn scan_loose(&self, data: &[u8], start: usize, end: usize, patches: &mut Vec<PendingPatch>) -> Result<(), ScanError> {
        let guards: Vec<u8> = GuardKind::ALL
            .iter()
            .filter(|&&k| self.options.allows(k))
            .map(|k| k.opcode().to_byte())
            .collect();
        if guards.is_empty() {
            return Ok(());
        }

        let true_op = IfrOpcode::True.to_byte();
        let false_op = IfrOpcode::False.to_byte();

        let hits = ByteScanner::new()
            .with_range(start, end)
            .scan(data, 4, |w| guards.contains(&w[0]) && w[2] == true_op)?;

        for offset in hits {
            let guard = IfrOpcode::from_byte(data[offset]);
            patches.push(PendingPatch::new(
                offset + 2,
                true_op,
                false_op,
                format!("{}: True -> False (loose)", guard),
            ));
        }

        Ok(())
    }
}

/// The record right after the guard is its condition. Only a recognised
/// condition is rewritten; anything else is left untouched.
fn plan_guard(reader: &FormReader<'_>, guard: &Record, kind: GuardKind) -> Option<PendingPatch> {
    let condition = reader.record_at(guard.next_offset())?;
    let opcode = condition.opcode();

    if !opcode.is_patchable_condition() {
        debug!("{} at 0x{:x} guards {}, skipped", kind, guard.offset, opcode);
        return None;
    }

    Some(PendingPatch::new(
        condition.offset,
        condition.header.opcode_id,
        IfrOpcode::False.to_byte(),
        format!("{}: {} -> False", kind, opcode),
    ))
}
