// Mon Oct 19 2026 - Alex

pub mod applier;
pub mod pending;

pub use applier::{PatchApplier, PatchOutcome};
pub use pending::PendingPatch;
