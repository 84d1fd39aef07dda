//! Engine settings, loadable from TOML.
//!
//! ```toml
//! # cadence.toml
//! sample_rate = 100.0   # fixed target rate in Hz; omit for auto
//! seed = 12345          # RNG seed; omit for the default seed
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use cadence_core::clock::Clock;

use crate::engine::Engine;
use crate::error::SettingsError;

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Fixed target sample rate in Hz; `None` means auto.
    #[serde(default)]
    pub sample_rate: Option<f32>,

    /// RNG seed; `None` keeps the engine's default seed.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl EngineSettings {
    /// Loads and validates settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("failed to read {}: {e}", path.display())))?;
        let settings: Self =
            toml::from_str(&text).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks semantic constraints.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(rate) = self.sample_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(SettingsError::Validation(format!(
                    "sample_rate must be finite and positive, got {rate}"
                )));
            }
        }
        Ok(())
    }

    /// Applies the settings to an engine. Call after `begin()`, which
    /// resets rate configuration.
    pub fn apply_to<C: Clock, const MAX_UNITS: usize>(&self, engine: &mut Engine<C, MAX_UNITS>) {
        match self.sample_rate {
            Some(rate) => engine.set_sample_rate(rate),
            None => engine.enable_auto_sample_rate(),
        }
        if let Some(seed) = self.seed {
            engine.reseed(seed);
        }
    }
}
