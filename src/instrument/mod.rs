//! Instrument drivers.
//!
//! Drivers translate method calls into the fixed command strings their
//! hardware understands and parse the responses back. Anything algorithmic
//! lives elsewhere; a driver carries protocol framing and parameter-range
//! checks only. Every driver owns a boxed [`Adapter`](crate::adapters::Adapter)
//! channel, so the same code runs against serial hardware and scripted mocks.

use anyhow::Result;
use async_trait::async_trait;

pub mod keysight_n77xx;
pub mod newport_1830c;

pub use keysight_n77xx::KeysightN77xx;
pub use newport_1830c::Newport1830C;

/// Common surface of every command-driven instrument.
#[async_trait]
pub trait Instrument: Send {
    /// Instance identifier used in configuration and logging.
    fn id(&self) -> &str;

    /// Queries `*IDN?` and returns the raw identification string.
    async fn identify(&mut self) -> Result<String>;

    /// Releases the underlying channel.
    async fn close(&mut self) -> Result<()>;
}
