//! Centralized configuration management

use crate::scales::classifier::TarePolicy;
use crate::types::*;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether a weight may be accepted before a processing type is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProcessingPolicy {
    /// Placing food right after choosing a group goes straight to weighing.
    #[default]
    Optional,
    /// Raw or cooked must be chosen first; an early weight is a held error.
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub noise_threshold_g: f32,
    pub release_threshold_g: f32,
    pub zero_snap_g: f32,
    pub sample_period_ms: u64,
    pub tare_policy: TarePolicy,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            noise_threshold_g: NOISE_THRESHOLD_G,
            release_threshold_g: RELEASE_THRESHOLD_G,
            zero_snap_g: ZERO_SNAP_G,
            sample_period_ms: SAMPLE_PERIOD_MS,
            tare_policy: TarePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub confirm_timeout_ms: u64,
    pub error_dwell_ms: u64,
    pub cancel_dwell_ms: u64,
    pub warning_dwell_ms: u64,
    pub saved_return_ms: u64,
    pub ledger_reset_confirm_ms: u64,
    pub ledger_reset_done_ms: u64,
    pub processing_policy: ProcessingPolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_ms: CONFIRM_TIMEOUT_MS,
            error_dwell_ms: ERROR_DWELL_MS,
            cancel_dwell_ms: CANCEL_DWELL_MS,
            warning_dwell_ms: WARNING_DWELL_MS,
            saved_return_ms: SAVED_RETURN_MS,
            ledger_reset_confirm_ms: LEDGER_RESET_CONFIRM_MS,
            ledger_reset_done_ms: LEDGER_RESET_DONE_MS,
            processing_policy: ProcessingPolicy::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn error_dwell(&self) -> Duration {
        Duration::from_millis(self.error_dwell_ms)
    }

    pub fn cancel_dwell(&self) -> Duration {
        Duration::from_millis(self.cancel_dwell_ms)
    }

    pub fn warning_dwell(&self) -> Duration {
        Duration::from_millis(self.warning_dwell_ms)
    }

    pub fn saved_return(&self) -> Duration {
        Duration::from_millis(self.saved_return_ms)
    }

    pub fn ledger_reset_confirm(&self) -> Duration {
        Duration::from_millis(self.ledger_reset_confirm_ms)
    }

    pub fn ledger_reset_done(&self) -> Duration {
        Duration::from_millis(self.ledger_reset_done_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scale: ScaleConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub struct ConfigManager {
    config: Arc<Mutex<CriticalSectionRawMutex, AppConfig>>,
}

impl ConfigManager {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }

    /// Loads overrides from a JSON file, falling back to defaults when it is missing.
    pub fn load_or_default(path: &std::path::Path) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(json) => AppConfig::from_json(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                AppConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::new(config))
    }

    pub fn get_handle(&self) -> Arc<Mutex<CriticalSectionRawMutex, AppConfig>> {
        Arc::clone(&self.config)
    }

    pub async fn get_config(&self) -> AppConfig {
        *self.config.lock().await
    }

    pub async fn update_config<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.lock().await;
        update_fn(&mut config);
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = AppConfig::default();
        assert_eq!(config.scale.noise_threshold_g, 2.0);
        assert_eq!(config.scale.release_threshold_g, 5.0);
        assert_eq!(config.workflow.confirm_timeout_ms, 10_000);
        assert_eq!(config.workflow.error_dwell(), Duration::from_millis(3_000));
        assert_eq!(config.workflow.processing_policy, ProcessingPolicy::Optional);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "scale": {
            "noise_threshold_g": 3.0,
            "release_threshold_g": 5.0,
            "zero_snap_g": 1.0,
            "sample_period_ms": 250,
            "tare_policy": "FlagFirst"
        } }"#)
        .unwrap();

        assert_eq!(config.scale.noise_threshold_g, 3.0);
        assert_eq!(config.scale.tare_policy, TarePolicy::FlagFirst);
        assert_eq!(config.workflow, WorkflowConfig::default());
    }

    #[test]
    fn test_json_roundtrip_through_manager() {
        let manager = ConfigManager::default();
        embassy_futures::block_on(manager.update_config(|c| {
            c.workflow.processing_policy = ProcessingPolicy::Required;
        }));
        let config = embassy_futures::block_on(manager.get_config());
        let parsed = AppConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed.workflow.processing_policy, ProcessingPolicy::Required);
    }
}
