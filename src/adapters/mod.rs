//! Instrument channel implementations.
//!
//! An [`Adapter`] is the request/response transport every driver talks
//! through: plain command strings out, delimited response strings back.
//! Drivers never touch ports or sockets directly, so the same driver runs
//! against real hardware (serial) and against scripted tests (mock).

use anyhow::Result;
use async_trait::async_trait;

pub mod mock_adapter;
#[cfg(feature = "instrument_serial")]
pub mod serial_adapter;

pub use mock_adapter::MockAdapter;
#[cfg(feature = "instrument_serial")]
pub use serial_adapter::SerialAdapter;

/// Request/response transport for command-driven instruments.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short transport name for logging ("serial", "mock").
    fn name(&self) -> &str;

    /// Opens the underlying channel.
    async fn connect(&mut self) -> Result<()>;

    /// Closes the underlying channel.
    async fn disconnect(&mut self) -> Result<()>;

    /// Sends a command that expects no response.
    async fn write(&mut self, command: &str) -> Result<()>;

    /// Sends a command and waits for one delimited response line.
    async fn query(&mut self, command: &str) -> Result<String>;
}
