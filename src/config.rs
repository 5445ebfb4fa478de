//! # Reader Configuration
//!
//! Configuration is a JSON document; every field is optional.
//!
//! ```json
//! {
//!   "obis_validity_ms": 10000,
//!   "update_interval_ms": 500,
//!   "serial": { "port": "/dev/ttyUSB0", "baudrate": 115200 },
//!   "sensors": [
//!     { "name": "power_delivered", "obis": "1-0:1.7.0" },
//!     { "name": "energy_tariff_1", "obis": "1-0:1.8.1" }
//!   ]
//! }
//! ```

use crate::constants::{DEFAULT_OBIS_VALIDITY_MS, DEFAULT_UPDATE_INTERVAL_MS};
use crate::dsmr::serial::SerialConfig;
use crate::dsmr::telegram::is_obis_char;
use crate::error::DsmrError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A sensor bound to one OBIS key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Display name; falls back to the OBIS key when empty.
    #[serde(default)]
    pub name: String,
    pub obis: String,
}

impl SensorConfig {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.obis
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsmrConfig {
    /// Readings older than this are published as unavailable (0 = never).
    pub obis_validity_ms: u64,
    /// Period of the sweep/publish tick.
    pub update_interval_ms: u64,
    pub serial: SerialConfig,
    pub sensors: Vec<SensorConfig>,
}

impl Default for DsmrConfig {
    fn default() -> Self {
        DsmrConfig {
            obis_validity_ms: DEFAULT_OBIS_VALIDITY_MS,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            serial: SerialConfig::default(),
            sensors: Vec::new(),
        }
    }
}

impl DsmrConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, DsmrError> {
        let config: DsmrConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DsmrError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn validate(&self) -> Result<(), DsmrError> {
        if self.update_interval_ms == 0 {
            return Err(DsmrError::ConfigError(
                "update_interval_ms must be greater than 0".into(),
            ));
        }
        self.serial.tokio_data_bits()?;
        self.serial.tokio_stop_bits()?;
        for sensor in &self.sensors {
            if sensor.obis.is_empty() {
                return Err(DsmrError::ConfigError(format!(
                    "sensor '{}' has an empty OBIS key",
                    sensor.name
                )));
            }
            if !sensor.obis.bytes().all(is_obis_char) {
                return Err(DsmrError::ConfigError(format!(
                    "invalid OBIS key '{}'",
                    sensor.obis
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsmr::serial::SerialParity;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = DsmrConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DsmrConfig::default());
        assert_eq!(config.obis_validity_ms, 10_000);
        assert_eq!(config.update_interval(), Duration::from_millis(500));
        assert_eq!(config.serial.baudrate, 115_200);
    }

    #[test]
    fn test_full_document() {
        let config = DsmrConfig::from_json_str(
            r#"{
                "obis_validity_ms": 0,
                "update_interval_ms": 1000,
                "serial": { "port": "/dev/ttyAMA0", "baudrate": 9600, "data_bits": 7, "parity": "even" },
                "sensors": [
                    { "name": "power", "obis": "1-0:1.7.0" },
                    { "obis": "1-0:1.8.1" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.obis_validity_ms, 0);
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.serial.data_bits, 7);
        assert_eq!(config.serial.parity, SerialParity::Even);
        assert_eq!(config.serial.stop_bits, 1);
        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.sensors[0].display_name(), "power");
        assert_eq!(config.sensors[1].display_name(), "1-0:1.8.1");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DsmrConfig::from_json_str(r#"{"update_interval_ms": 0}"#),
            Err(DsmrError::ConfigError(_))
        ));
        assert!(matches!(
            DsmrConfig::from_json_str(r#"{"serial": {"data_bits": 5}}"#),
            Err(DsmrError::ConfigError(_))
        ));
        assert!(matches!(
            DsmrConfig::from_json_str(r#"{"sensors": [{"name": "x", "obis": ""}]}"#),
            Err(DsmrError::ConfigError(_))
        ));
        assert!(matches!(
            DsmrConfig::from_json_str(r#"{"sensors": [{"obis": "1-0:1.8.1(x)"}]}"#),
            Err(DsmrError::ConfigError(_))
        ));
        assert!(matches!(
            DsmrConfig::from_json_str("not json"),
            Err(DsmrError::Json(_))
        ));
    }
}
