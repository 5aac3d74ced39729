//! Layered application settings.
//!
//! Settings are assembled with the `config` crate: an optional TOML file
//! first, then `DAQ_`-prefixed environment variables on top. The interesting
//! content is the per-instrument table mapping an instance name (the one
//! recipes refer to) to its connection and initial-state parameters:
//!
//! ```toml
//! [instruments.pm_1]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! wavelength_nm = 1550.0
//! range = 0   # 0=autorange
//! units = 0   # 0=Watts, 1=dBm, 2=dB, 3=REL
//! ```

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Connection and initial-state settings for one instrument instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Serial port or VISA resource the instrument answers on.
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Wavelength to program at connect time, in nm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wavelength_nm: Option<f64>,
    /// Range code to program at connect time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<i32>,
    /// Units code to program at connect time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<i32>,
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            wavelength_nm: None,
            range: None,
            units: None,
        }
    }
}

/// Application settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Instrument instance name -> connection settings.
    #[serde(default)]
    pub instruments: HashMap<String, InstrumentConfig>,
}

impl Settings {
    /// Loads settings from an optional TOML file plus `DAQ_`-prefixed
    /// environment variables (e.g. `DAQ_INSTRUMENTS__PM_1__PORT`), the
    /// environment taking precedence.
    pub fn new(path: Option<&Path>) -> AppResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("DAQ").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
