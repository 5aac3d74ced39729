//! Scripted in-memory channel for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;

use super::Adapter;

/// Shared record of every command an adapter has carried, in send order.
///
/// Clone the handle before moving the adapter into a driver; the clones see
/// commands the driver sends afterwards.
#[derive(Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<String>>>);

impl CommandLog {
    /// Snapshot of the commands carried so far.
    pub fn commands(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, command: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.to_string());
    }
}

/// In-memory [`Adapter`] with canned responses.
///
/// A query is answered by, in order of preference: the next entry of a
/// per-command response sequence, an exact-match response, the first
/// matching prefix response, or the fallback. A query nothing is scripted
/// for fails, so tests catch unexpected traffic.
#[derive(Default)]
pub struct MockAdapter {
    sequences: HashMap<String, VecDeque<String>>,
    exact: HashMap<String, String>,
    prefixes: Vec<(String, String)>,
    fallback: Option<String>,
    log: CommandLog,
    connected: bool,
}

impl MockAdapter {
    /// An adapter with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a response for an exact command string.
    pub fn on(mut self, command: &str, response: &str) -> Self {
        self.exact.insert(command.to_string(), response.to_string());
        self
    }

    /// Scripts consecutive responses for repeats of the same command,
    /// consumed before exact matches. Repeating the command after the
    /// sequence runs dry falls back to the other match rules.
    pub fn on_sequence(mut self, command: &str, responses: &[&str]) -> Self {
        self.sequences.insert(
            command.to_string(),
            responses.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    /// Scripts a response for any command starting with `prefix`.
    pub fn on_prefix(mut self, prefix: &str, response: &str) -> Self {
        self.prefixes.push((prefix.to_string(), response.to_string()));
        self
    }

    /// Fallback response when nothing else matches.
    pub fn otherwise(mut self, response: &str) -> Self {
        self.fallback = Some(response.to_string());
        self
    }

    /// A handle onto the command log; clones stay live after the adapter
    /// moves into a driver.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    fn lookup(&mut self, command: &str) -> Option<String> {
        if let Some(queue) = self.sequences.get_mut(command) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }
        if let Some(response) = self.exact.get(command) {
            return Some(response.clone());
        }
        if let Some((_, response)) = self
            .prefixes
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
        {
            return Some(response.clone());
        }
        self.fallback.clone()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(anyhow!("Mock channel is not connected"))
        }
    }
}

#[async_trait]
impl Adapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    async fn write(&mut self, command: &str) -> Result<()> {
        self.ensure_connected()?;
        self.log.push(command);
        debug!("Mock write: {}", command);
        Ok(())
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        self.ensure_connected()?;
        self.log.push(command);
        let response = self
            .lookup(command)
            .ok_or_else(|| anyhow!("No scripted response for '{}'", command))?;
        debug!("Mock query: {} -> {}", command, response);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requires_connect() {
        let mut adapter = MockAdapter::new().on("*IDN?", "mock,0,0,0");
        assert!(adapter.query("*IDN?").await.is_err());

        adapter.connect().await.unwrap();
        assert_eq!(adapter.query("*IDN?").await.unwrap(), "mock,0,0,0");
    }

    #[tokio::test]
    async fn test_match_precedence() {
        let mut adapter = MockAdapter::new()
            .on_sequence("PM:Power?", &["1.0", "2.0"])
            .on("PM:Power?", "9.9")
            .on_prefix("PM:", "0")
            .otherwise("?");
        adapter.connect().await.unwrap();

        assert_eq!(adapter.query("PM:Power?").await.unwrap(), "1.0");
        assert_eq!(adapter.query("PM:Power?").await.unwrap(), "2.0");
        // sequence exhausted, exact match takes over
        assert_eq!(adapter.query("PM:Power?").await.unwrap(), "9.9");
        assert_eq!(adapter.query("PM:Lambda?").await.unwrap(), "0");
        assert_eq!(adapter.query("unscripted").await.unwrap(), "?");
    }

    #[tokio::test]
    async fn test_command_log_survives_move() {
        let adapter = MockAdapter::new().otherwise("ok");
        let log = adapter.log();

        let mut boxed: Box<dyn Adapter> = Box::new(adapter);
        boxed.connect().await.unwrap();
        boxed.write(":POL:ZERO").await.unwrap();
        boxed.query(":POL:ZERO?").await.unwrap();

        assert_eq!(log.commands(), [":POL:ZERO", ":POL:ZERO?"]);
    }

    #[tokio::test]
    async fn test_unscripted_query_fails() {
        let mut adapter = MockAdapter::new();
        adapter.connect().await.unwrap();
        assert!(adapter.query("PM:Power?").await.is_err());
    }
}
