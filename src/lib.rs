// Mon Oct 19 2026 - Alex

pub mod config;
pub mod engine;
pub mod ifr;
pub mod image;
pub mod machine;
pub mod output;
pub mod patch;
pub mod scan;
pub mod utils;
pub mod vendor;

pub use config::Config;
pub use engine::{BatchReport, EngineError, ModuleReport, PatchEngine, Plan};
pub use ifr::{ConditionPlanner, FormReader, PlannerOptions};
pub use image::ModuleImage;
pub use machine::MachineCodePatcher;
pub use patch::{PatchApplier, PatchOutcome, PendingPatch};
pub use scan::{ByteScanner, ScanError, Signature};
pub use utils::{LogSink, MemorySink, NullSink, PatchLog};
pub use vendor::{FlagUnlocker, HeuristicSet, Passes, VendorProfile};
