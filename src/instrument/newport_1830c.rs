//! Newport 1830-C optical power meter driver.
//!
//! RS-232 command set: `PM:Power?`, `PM:Lambda`, `PM:Range`, `PM:Units`,
//! `PM:DS:Clear`. Wavelength limits depend on the attached photodetector;
//! the 400-1700 nm window covers the common models.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::info;

use crate::adapters::Adapter;
use crate::config::InstrumentConfig;
use crate::instrument::Instrument;

/// Newport 1830-C optical power meter.
pub struct Newport1830C {
    id: String,
    adapter: Box<dyn Adapter>,
    /// Unit label of subsequent readings, tracked for trace annotation.
    current_units: &'static str,
}

impl Newport1830C {
    /// A driver over the given channel; call [`connect`](Self::connect)
    /// before issuing commands.
    pub fn new(id: &str, adapter: Box<dyn Adapter>) -> Self {
        Self {
            id: id.to_string(),
            adapter,
            current_units: "W",
        }
    }

    /// Opens the channel and programs wavelength, range, and units from
    /// `config` when given.
    pub async fn connect(&mut self, config: &InstrumentConfig) -> Result<()> {
        self.adapter.connect().await?;

        if let Some(wavelength) = config.wavelength_nm {
            self.set_wavelength_nm(wavelength).await?;
        }
        if let Some(range) = config.range {
            self.set_range(range).await?;
        }
        if let Some(units) = config.units {
            self.set_units(units).await?;
        }

        info!("Newport 1830-C '{}' connected", self.id);
        Ok(())
    }

    /// Single power reading in the currently configured unit.
    pub async fn read_power(&mut self) -> Result<f64> {
        let response = self.adapter.query("PM:Power?").await?;
        self.parse_power_response(&response)
    }

    /// Unit label of subsequent readings ("W", "dBm", "dB", "REL").
    pub fn units(&self) -> &'static str {
        self.current_units
    }

    /// Programs the calibration wavelength.
    pub async fn set_wavelength_nm(&mut self, wavelength: f64) -> Result<()> {
        Self::validate_wavelength(wavelength)?;
        self.adapter
            .write(&format!("PM:Lambda {}", wavelength))
            .await?;
        info!("[{}] Set wavelength to {} nm", self.id, wavelength);
        Ok(())
    }

    /// Selects a measurement range.
    pub async fn set_range(&mut self, code: i32) -> Result<()> {
        Self::validate_range(code)?;
        self.adapter.write(&format!("PM:Range {}", code)).await?;
        info!("[{}] Set range to {}", self.id, code);
        Ok(())
    }

    /// Selects the readout unit.
    pub async fn set_units(&mut self, code: i32) -> Result<()> {
        Self::validate_units(code)?;
        self.adapter.write(&format!("PM:Units {}", code)).await?;
        self.current_units = Self::units_code_to_string(code);
        info!("[{}] Set units to {}", self.id, self.current_units);
        Ok(())
    }

    /// Clears the stored reference measurement (zeroes the meter).
    pub async fn zero(&mut self) -> Result<()> {
        self.adapter.write("PM:DS:Clear").await?;
        info!("[{}] Zeroed", self.id);
        Ok(())
    }

    /// Parses a power reading.
    /// Handles scientific notation, whitespace, and error responses.
    fn parse_power_response(&self, response: &str) -> Result<f64> {
        let trimmed = response.trim();

        if trimmed.contains("ERR") || trimmed.contains("OVER") || trimmed.contains("UNDER") {
            return Err(anyhow!("[{}] Meter error response: {}", self.id, trimmed));
        }

        trimmed
            .parse::<f64>()
            .with_context(|| format!("Failed to parse power response: '{}'", trimmed))
    }

    /// Range depends on the photodetector model (typically 400-1700 nm).
    fn validate_wavelength(nm: f64) -> Result<()> {
        if !(400.0..=1700.0).contains(&nm) {
            bail!(
                "Wavelength {} nm out of range (400-1700 nm). Range depends on photodetector model",
                nm
            );
        }
        Ok(())
    }

    /// Valid codes: 0 (autorange), 1-8 (manual ranges).
    fn validate_range(code: i32) -> Result<()> {
        if !(0..=8).contains(&code) {
            bail!(
                "Range code {} invalid. Valid codes: 0 (auto), 1-8 (manual ranges)",
                code
            );
        }
        Ok(())
    }

    /// Valid codes: 0=Watts, 1=dBm, 2=dB, 3=REL.
    fn validate_units(code: i32) -> Result<()> {
        if !(0..=3).contains(&code) {
            bail!(
                "Units code {} invalid. Valid codes: 0=Watts, 1=dBm, 2=dB, 3=REL",
                code
            );
        }
        Ok(())
    }

    fn units_code_to_string(code: i32) -> &'static str {
        match code {
            1 => "dBm",
            2 => "dB",
            3 => "REL",
            _ => "W",
        }
    }
}

#[async_trait]
impl Instrument for Newport1830C {
    fn id(&self) -> &str {
        &self.id
    }

    async fn identify(&mut self) -> Result<String> {
        self.adapter.query("*IDN?").await
    }

    async fn close(&mut self) -> Result<()> {
        self.adapter.disconnect().await?;
        info!("Newport 1830-C '{}' disconnected", self.id);
        Ok(())
    }
}
