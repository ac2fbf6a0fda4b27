// Mon Oct 19 2026 - Alex

use crate::output::PatchReport;
use serde_json::{to_string, to_string_pretty};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

pub struct JsonSerializer {
    pretty_print: bool,
    include_patches: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self {
            pretty_print: true,
            include_patches: true,
        }
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Drop the per-patch listing and keep only counters.
    pub fn with_patches(mut self, include: bool) -> Self {
        self.include_patches = include;
        self
    }

    pub fn serialize(&self, report: &PatchReport) -> Result<String, JsonError> {
        let mut report = report.clone();
        if !self.include_patches {
            for module in &mut report.batch.modules {
                module.patches.clear();
            }
        }

        let text = if self.pretty_print {
            to_string_pretty(&report)
        } else {
            to_string(&report)
        };

        text.map_err(|e| JsonError::SerializationError(e.to_string()))
    }

    pub fn serialize_to_file<P: AsRef<Path>>(&self, report: &PatchReport, path: P) -> Result<(), JsonError> {
        let json_str = self.serialize(report)?;

        let file = File::create(path.as_ref()).map_err(|e| JsonError::IoError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json_str.as_bytes())
            .map_err(|e| JsonError::IoError(e.to_string()))?;
        writer.flush().map_err(|e| JsonError::IoError(e.to_string()))?;

        Ok(())
    }

    pub fn deserialize(&self, json: &str) -> Result<PatchReport, JsonError> {
        serde_json::from_str(json).map_err(|e| JsonError::DeserializationError(e.to_string()))
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}
