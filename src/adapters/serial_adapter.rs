//! RS-232 channel over the `serialport` crate.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serialport::SerialPort;
use tokio::sync::Mutex;

use super::Adapter;

/// Serial [`Adapter`] for RS-232 instruments.
///
/// The `serialport` crate is synchronous, so all port I/O runs on the Tokio
/// blocking pool. A query writes the command plus line terminator, then reads
/// byte-by-byte until the response delimiter or the overall timeout.
pub struct SerialAdapter {
    /// Port name (e.g. "/dev/ttyUSB0", "COM3").
    port_name: String,
    /// Baud rate (e.g. 9600, 115200).
    baud_rate: u32,
    /// Overall per-query timeout.
    timeout: Duration,
    /// Terminator appended to outgoing commands (e.g. "\r\n").
    line_terminator: String,
    /// Byte ending an incoming response (e.g. b'\n').
    response_delimiter: u8,
    port: Option<Arc<Mutex<Box<dyn SerialPort>>>>,
}

impl SerialAdapter {
    /// A closed adapter for the given port with default framing
    /// ("\r\n" out, '\n' in, 1 s timeout).
    pub fn new(port_name: &str, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.to_string(),
            baud_rate,
            timeout: Duration::from_millis(1000),
            line_terminator: "\r\n".to_string(),
            response_delimiter: b'\n',
            port: None,
        }
    }

    /// Sets the overall per-query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the terminator appended to outgoing commands.
    pub fn with_line_terminator(mut self, terminator: &str) -> Self {
        self.line_terminator = terminator.to_string();
        self
    }

    /// Sets the byte that ends an incoming response.
    pub fn with_response_delimiter(mut self, delimiter: u8) -> Self {
        self.response_delimiter = delimiter;
        self
    }

    fn port(&self) -> Result<Arc<Mutex<Box<dyn SerialPort>>>> {
        self.port
            .clone()
            .ok_or_else(|| anyhow!("Serial port '{}' is not open", self.port_name))
    }
}

#[async_trait]
impl Adapter for SerialAdapter {
    fn name(&self) -> &str {
        "serial"
    }

    async fn connect(&mut self) -> Result<()> {
        let port = serialport::new(&self.port_name, self.baud_rate)
            // short per-read timeout; the overall deadline is ours to enforce
            .timeout(Duration::from_millis(100))
            .open()
            .with_context(|| {
                format!(
                    "Failed to open serial port '{}' at {} baud",
                    self.port_name, self.baud_rate
                )
            })?;
        self.port = Some(Arc::new(Mutex::new(port)));
        debug!(
            "Serial port '{}' opened at {} baud",
            self.port_name, self.baud_rate
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!("Serial port '{}' closed", self.port_name);
        }
        Ok(())
    }

    async fn write(&mut self, command: &str) -> Result<()> {
        let port = self.port()?;
        let framed = format!("{}{}", command, self.line_terminator);
        let logged = command.to_string();

        tokio::task::spawn_blocking(move || {
            let mut guard = port.blocking_lock();
            guard
                .write_all(framed.as_bytes())
                .context("Failed to write to serial port")?;
            guard.flush().context("Failed to flush serial port")?;
            debug!("Sent serial command: {}", logged.trim());
            Ok(())
        })
        .await
        .context("Serial I/O task panicked")?
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        let port = self.port()?;
        let framed = format!("{}{}", command, self.line_terminator);
        let logged = command.to_string();
        let delimiter = self.response_delimiter;
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || -> Result<String> {
            let mut guard = port.blocking_lock();
            guard
                .write_all(framed.as_bytes())
                .context("Failed to write to serial port")?;
            guard.flush().context("Failed to flush serial port")?;
            debug!("Sent serial command: {}", logged.trim());

            let mut response: Vec<u8> = Vec::new();
            let mut buffer = [0u8; 1];
            let start = Instant::now();

            loop {
                if start.elapsed() > timeout {
                    return Err(anyhow!("Serial read timeout after {:?}", timeout));
                }

                match guard.read(&mut buffer) {
                    Ok(1) => {
                        if buffer[0] == delimiter {
                            break;
                        }
                        response.push(buffer[0]);
                    }
                    Ok(0) => return Err(anyhow!("Unexpected EOF from serial port")),
                    Ok(n) => return Err(anyhow!("Read {} bytes into a 1-byte buffer", n)),
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                        // port timeout is shorter than the overall deadline
                        continue;
                    }
                    Err(e) => return Err(anyhow!("Serial read error: {}", e)),
                }
            }

            let response = String::from_utf8_lossy(&response).trim().to_string();
            debug!("Received serial response: {}", response);
            Ok(response)
        })
        .await
        .context("Serial I/O task panicked")?
    }
}
