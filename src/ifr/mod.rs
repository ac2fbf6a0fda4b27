// Mon Oct 19 2026 - Alex

pub mod opcode;
pub mod planner;
pub mod reader;

pub use opcode::{GuardKind, IfrOpcode};
pub use planner::{ConditionPlanner, PlanSummary, PlannerOptions};
pub use reader::{FormReader, Record, RecordHeader, Records};
