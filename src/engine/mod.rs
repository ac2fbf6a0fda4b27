// Mon Oct 19 2026 - Alex

pub mod core;
pub mod result;

pub use self::core::{EngineError, PatchEngine};
pub use result::{BatchReport, ModuleReport, Plan};
