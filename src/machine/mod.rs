// Mon Oct 19 2026 - Alex

pub mod patcher;
pub mod x86;

pub use patcher::{MachineCodePatcher, MachineOutcome};
