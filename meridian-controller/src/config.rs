//! Configuration for the controller
//!
//! Loads configuration from a TOML file. Every section and field is
//! optional and falls back to the stock controller's defaults.

use crate::error::Result;
use crate::store::FilePositionStore;
use crate::system::SysfsThermometer;
use meridian_core::config::{
    CompensationConfig, FocuserConfig, OpticsConfig, OutputsConfig, PollTiming, PowerConfig,
    SkyQualityConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub focuser: FocuserConfig,
    pub optics: OpticsConfig,
    pub compensation: CompensationConfig,
    pub sky_quality: SkyQualityConfig,
    pub power: PowerConfig,
    pub timing: PollTiming,
    pub outputs: OutputsConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File holding the focuser position
    pub position_file: PathBuf,
    /// CPU thermal zone
    pub thermal_zone: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            position_file: PathBuf::from("/var/lib/meridian/position"),
            thermal_zone: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
        }
    }
}

impl StoreConfig {
    /// Position store backed by `position_file`
    pub fn position_store(&self) -> FilePositionStore {
        FilePositionStore::new(&self.position_file)
    }

    /// CPU thermometer reading `thermal_zone`
    pub fn thermometer(&self) -> SysfsThermometer {
        SysfsThermometer::new(&self.thermal_zone)
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
