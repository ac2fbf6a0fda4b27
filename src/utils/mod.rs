// Mon Oct 19 2026 - Alex

pub mod logging;

pub use logging::{LogSink, LoggingUtils, MemorySink, NullSink, PatchLog};
