// Mon Oct 19 2026 - Alex

use crate::ifr::PlannerOptions;
use crate::machine::x86::DEFAULT_LOOKAHEAD;
use crate::vendor::flags::VISIBLE_SENTINEL;
use crate::vendor::{Passes, VendorProfile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub profile: VendorProfile,
    pub lookahead: usize,
    pub visible_sentinel: u8,
    pub planner: PlannerOptions,
    /// Plan from every located IFR form set instead of from offset 0.
    pub locate_form_sets: bool,
    pub disabled_passes: Vec<String>,
    pub dry_run: bool,
    pub output_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: VendorProfile::Generic,
            lookahead: DEFAULT_LOOKAHEAD,
            visible_sentinel: VISIBLE_SENTINEL,
            planner: PlannerOptions::default(),
            locate_form_sets: true,
            disabled_passes: Vec::new(),
            dry_run: false,
            output_suffix: "unlocked".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn with_profile(mut self, profile: VendorProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_planner(mut self, planner: PlannerOptions) -> Self {
        self.planner = planner;
        self
    }

    pub fn disable_pass(mut self, name: &str) -> Self {
        self.disabled_passes.push(name.to_string());
        self
    }

    pub fn disabled_mask(&self) -> Result<Passes, ConfigError> {
        let mut mask = Passes::empty();
        for name in &self.disabled_passes {
            mask |= pass_from_name(name)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown pass '{}'", name)))?;
        }
        Ok(mask)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookahead == 0 {
            return Err(ConfigError::Invalid("lookahead must be greater than 0".to_string()));
        }
        if self.output_suffix.trim().is_empty() {
            return Err(ConfigError::Invalid("output_suffix must not be empty".to_string()));
        }
        self.disabled_mask()?;
        Ok(())
    }
}

pub fn pass_from_name(name: &str) -> Option<Passes> {
    match name.to_lowercase().replace('_', "-").as_str() {
        "protection-skip" => Some(Passes::PROTECTION_SKIP),
        "return-check" => Some(Passes::RETURN_CHECK),
        "ifr-conditions" | "ifr" => Some(Passes::IFR_CONDITIONS),
        "flag-unlock" => Some(Passes::FLAG_UNLOCK),
        "vendor-rules" => Some(Passes::VENDOR_RULES),
        _ => None,
    }
}
