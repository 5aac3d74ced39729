//! Core library for the labsweep toolkit.
//!
//! labsweep automates optical bench measurements: instrument drivers issue
//! command/response protocol strings to hardware over an [`adapters::Adapter`]
//! channel, a [`recipe::Recipe`] names the instruments and test sequences of a
//! run, and the [`sweep::Sweep`] dataset model holds the resulting
//! multi-column traces for downstream plotting, unit conversion, and export.

pub mod adapters;
pub mod config;
pub mod error;
pub mod instrument;
pub mod recipe;
pub mod sweep;

pub use error::{AppResult, DaqError};
pub use sweep::{Sweep, TraceAttr};
