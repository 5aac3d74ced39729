//! Keysight N77xx polarimeter driver.
//!
//! Covers the SCPI `:POL:` subsystem of the N7786C/N7788C polarization
//! analyzers: state-of-polarization readout, optical power, wavelength and
//! gain control, photodiode zeroing, and sweep logging. The N7781C/N7785C
//! answer most of the same commands with a reduced feature set and are
//! accepted with a warning.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use prse::try_parse;

use crate::adapters::Adapter;
use crate::config::InstrumentConfig;
use crate::instrument::Instrument;

/// Largest sample count the sweep-logging engine accepts.
const MAX_SAMPLES: u32 = 1_048_576;

/// Power unit codes understood by `:POL:POW:UNIT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUnit {
    /// Logarithmic, referenced to 1 mW.
    Dbm,
    /// Linear watts.
    Watt,
}

impl PowerUnit {
    fn code(self) -> u8 {
        match self {
            PowerUnit::Dbm => 0,
            PowerUnit::Watt => 1,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(PowerUnit::Dbm),
            1 => Ok(PowerUnit::Watt),
            other => Err(anyhow!("Unknown power unit code {}", other)),
        }
    }
}

/// Sweep-logging start modes for `:POL:SWE:STAR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoggingMode {
    /// One loop of the configured sample count.
    Sop,
    /// Endless logging until stopped.
    SopContinuous,
}

impl LoggingMode {
    fn mnemonic(self) -> &'static str {
        match self {
            LoggingMode::Sop => "SOP",
            LoggingMode::SopContinuous => "SOPCONTINUOUS",
        }
    }
}

/// One state-of-polarization readout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StokesVector {
    /// Total power.
    pub s0: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl StokesVector {
    /// Stokes parameters normalized against total power: (S1/S0, S2/S0, S3/S0).
    pub fn normalized(&self) -> (f64, f64, f64) {
        (self.s1 / self.s0, self.s2 / self.s0, self.s3 / self.s0)
    }
}

/// Keysight N77xx polarimeter.
pub struct KeysightN77xx {
    id: String,
    adapter: Box<dyn Adapter>,
}

impl KeysightN77xx {
    /// A driver over the given channel; call [`connect`](Self::connect)
    /// before issuing commands.
    pub fn new(id: &str, adapter: Box<dyn Adapter>) -> Self {
        Self {
            id: id.to_string(),
            adapter,
        }
    }

    /// Opens the channel, checks the reported model, and drains the error
    /// queue. The initial wavelength from `config` is programmed when given.
    pub async fn connect(&mut self, config: &InstrumentConfig) -> Result<()> {
        self.adapter.connect().await?;

        let idn = self.identify_raw().await?;
        let model = Self::model_field(&idn)?.to_string();
        match model.as_str() {
            "N7786C" | "N7788C" => {}
            "N7781C" | "N7785C" => warn!(
                "[{}] Model {} has a reduced feature set; some commands may not be available",
                self.id, model
            ),
            other => bail!("Unexpected polarimeter model '{}' on '{}'", other, self.id),
        }

        self.clear_errors().await?;
        self.assert_no_errors().await?;

        if let Some(wavelength) = config.wavelength_nm {
            self.set_wavelength_nm(wavelength).await?;
        }

        info!("Polarimeter '{}' connected ({})", self.id, model);
        Ok(())
    }

    /// Clears the instrument status and error queue.
    pub async fn clear_errors(&mut self) -> Result<()> {
        self.adapter.write("*CLS").await
    }

    /// Reads the head of the error queue and fails if it is non-empty.
    pub async fn assert_no_errors(&mut self) -> Result<()> {
        let response = self.adapter.query("SYST:ERR?").await?;
        let code = response
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .parse::<i32>()
            .with_context(|| format!("Malformed SYST:ERR? response: '{}'", response))?;
        if code != 0 {
            bail!("[{}] Instrument reports error: {}", self.id, response);
        }
        Ok(())
    }

    /// Triggers a measurement and returns the raw Stokes parameters.
    pub async fn measure_stokes(&mut self) -> Result<StokesVector> {
        let response = self.adapter.query(":POL:SOP?").await?;
        Self::parse_sop(&response)
    }

    /// Returns the Stokes parameters of the last measurement.
    pub async fn fetch_stokes(&mut self) -> Result<StokesVector> {
        let response = self.adapter.query(":POL:SOP:FETCH?").await?;
        Self::parse_sop(&response)
    }

    /// Triggers a measurement and returns the optical power in the
    /// configured power unit.
    pub async fn measure_power(&mut self) -> Result<f64> {
        self.query_parsed(":POL:POW?").await
    }

    /// Returns the optical power of the last measurement.
    pub async fn fetch_power(&mut self) -> Result<f64> {
        self.query_parsed(":POL:POW:FETCH?").await
    }

    /// Sets the unit of subsequent power readouts.
    pub async fn set_power_unit(&mut self, unit: PowerUnit) -> Result<()> {
        self.adapter
            .write(&format!(":POL:POW:UNIT {}", unit.code()))
            .await
    }

    /// Reads the configured power unit.
    pub async fn power_unit(&mut self) -> Result<PowerUnit> {
        let code: u8 = self.query_parsed(":POL:POW:UNIT?").await?;
        PowerUnit::from_code(code)
    }

    /// Programs the operating wavelength, validated against the limits the
    /// instrument itself reports.
    pub async fn set_wavelength_nm(&mut self, wavelength: f64) -> Result<()> {
        let min_nm = self.query_parsed::<f64>(":POL:WAV? MIN").await? * 1e9;
        let max_nm = self.query_parsed::<f64>(":POL:WAV? MAX").await? * 1e9;
        if wavelength < min_nm || wavelength > max_nm {
            bail!(
                "Wavelength {} nm out of range ({}-{} nm) for '{}'",
                wavelength,
                min_nm,
                max_nm,
                self.id
            );
        }
        self.adapter
            .write(&format!(":POL:WAV {}NM", wavelength))
            .await
    }

    /// Reads the operating wavelength, in nm.
    pub async fn wavelength_nm(&mut self) -> Result<f64> {
        Ok(self.query_parsed::<f64>(":POL:WAV?").await? * 1e9)
    }

    /// Sets the amplifier gain level.
    ///
    /// 0-5 give the full ~250 kHz bandwidth, 6-7 about 100 kHz, 8-9 about
    /// 10 kHz; stay at or below 7 when the stabilizer is active.
    pub async fn set_gain(&mut self, level: u8) -> Result<()> {
        if level > 9 {
            bail!("Gain level {} invalid. Valid levels: 0-9", level);
        }
        self.adapter.write(&format!(":POL:GAIN {}", level)).await
    }

    /// Reads the amplifier gain level.
    pub async fn gain(&mut self) -> Result<u8> {
        self.query_parsed(":POL:GAIN?").await
    }

    /// Enables or disables automatic gain selection.
    pub async fn set_auto_gain(&mut self, enabled: bool) -> Result<()> {
        self.adapter
            .write(&format!(":POL:AGFL {}", u8::from(enabled)))
            .await
    }

    /// Whether automatic gain selection is active.
    pub async fn auto_gain(&mut self) -> Result<bool> {
        let flag: u8 = self.query_parsed(":POL:AGFL?").await?;
        Ok(flag != 0)
    }

    /// Measures photodiode dark current; it is subtracted from subsequent
    /// readings.
    pub async fn zero(&mut self) -> Result<()> {
        self.adapter.write(":POL:ZERO").await
    }

    /// Whether the last zeroing completed successfully.
    pub async fn zero_succeeded(&mut self) -> Result<bool> {
        let flag: u8 = self.query_parsed(":POL:ZERO?").await?;
        Ok(flag != 0)
    }

    /// Starts sweep logging, optionally forcing a mode.
    pub async fn start_logging(&mut self, mode: Option<LoggingMode>) -> Result<()> {
        match mode {
            None => self.adapter.write(":POL:SWE:STAR").await,
            Some(mode) => {
                self.adapter
                    .write(&format!(":POL:SWE:STAR {}", mode.mnemonic()))
                    .await
            }
        }
    }

    /// Stops sweep logging.
    pub async fn stop_logging(&mut self) -> Result<()> {
        self.adapter.write(":POL:SWE:STOP").await
    }

    /// Returns (logging state, data availability), e.g.
    /// `("IDLE", "DATA_AVAILABLE")`.
    pub async fn logging_state(&mut self) -> Result<(String, String)> {
        let response = self.adapter.query(":POL:SWE:STAT?").await?;
        let trimmed = response.trim();
        let parsed: Result<(String, String), _> = try_parse!(trimmed, "{},{}");
        parsed.map_err(|e| anyhow!("Malformed logging state '{}': {}", trimmed, e))
    }

    /// Sets the per-loop sample count.
    pub async fn set_sample_count(&mut self, count: u32) -> Result<()> {
        if count == 0 || count > MAX_SAMPLES {
            bail!(
                "Sample count {} invalid. Valid counts: 1-{}",
                count,
                MAX_SAMPLES
            );
        }
        self.adapter.write(&format!(":POL:SWE:SAMP {}", count)).await
    }

    /// Reads the per-loop sample count.
    pub async fn sample_count(&mut self) -> Result<u32> {
        self.query_parsed(":POL:SWE:SAMP?").await
    }

    /// Number of samples logged so far in the running loop.
    pub async fn logged_sample_count(&mut self) -> Result<u32> {
        self.query_parsed(":POL:SWE:SAMP:CURR?").await
    }

    /// Sets the number of logging loops; 0 keeps logging until stopped.
    pub async fn set_loop_count(&mut self, count: u32) -> Result<()> {
        self.adapter.write(&format!(":POL:SWE:LOOP {}", count)).await
    }

    /// Reads the configured number of logging loops.
    pub async fn loop_count(&mut self) -> Result<u32> {
        self.query_parsed(":POL:SWE:LOOP?").await
    }

    async fn identify_raw(&mut self) -> Result<String> {
        self.adapter.query("*IDN?").await
    }

    async fn query_parsed<T>(&mut self, command: &str) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let response = self.adapter.query(command).await?;
        response.trim().parse::<T>().with_context(|| {
            format!("Failed to parse response to '{}': '{}'", command, response)
        })
    }

    fn model_field(idn: &str) -> Result<&str> {
        idn.split(',')
            .nth(1)
            .map(str::trim)
            .ok_or_else(|| anyhow!("Malformed *IDN? response: '{}'", idn))
    }

    fn parse_sop(response: &str) -> Result<StokesVector> {
        let trimmed = response.trim();
        let parsed: Result<(f64, f64, f64, f64), _> = try_parse!(trimmed, "{},{},{},{}");
        let (s0, s1, s2, s3) =
            parsed.map_err(|e| anyhow!("Malformed SOP response '{}': {}", trimmed, e))?;
        Ok(StokesVector { s0, s1, s2, s3 })
    }
}

#[async_trait]
impl Instrument for KeysightN77xx {
    fn id(&self) -> &str {
        &self.id
    }

    async fn identify(&mut self) -> Result<String> {
        self.identify_raw().await
    }

    async fn close(&mut self) -> Result<()> {
        self.adapter.disconnect().await?;
        info!("Polarimeter '{}' disconnected", self.id);
        Ok(())
    }
}
