//! Measurement recipes: which instruments to bring up, which tests to run.
//!
//! A recipe is a thin structured document. The instruments list names the
//! instances the run needs; the tests list is an ordered sequence of
//! `(test name, parameters)` pairs that a test-orchestration layer iterates
//! over. Recipes persist as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppResult, DaqError};

/// An ordered test-automation recipe.
///
/// Wire shape:
///
/// ```json
/// {
///   "instruments": ["pol_1", "pm_1"],
///   "tests": [["insertion_loss", {"wavelengths_nm": [1540, 1550]}]]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    instruments: Vec<String>,
    tests: Vec<(String, Value)>,
}

impl Recipe {
    /// Builds and validates a recipe.
    pub fn new(instruments: Vec<String>, tests: Vec<(String, Value)>) -> AppResult<Self> {
        let recipe = Self { instruments, tests };
        recipe.validate()?;
        Ok(recipe)
    }

    fn validate(&self) -> AppResult<()> {
        if self.instruments.is_empty() {
            return Err(DaqError::Configuration(
                "a recipe must name at least one instrument".into(),
            ));
        }
        if self.tests.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err(DaqError::Configuration(
                "every recipe test needs a non-empty name".into(),
            ));
        }
        Ok(())
    }

    /// Instrument instance names needed to run this recipe.
    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    /// Iterates over `(test name, parameters)` pairs in run order.
    pub fn tests(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.tests.iter().map(|(name, params)| (name.as_str(), params))
    }

    /// Loads and validates a recipe from a JSON file.
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let file = std::fs::File::open(path)?;
        let recipe: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        recipe.validate()?;
        Ok(recipe)
    }

    /// Writes the recipe as pretty-printed JSON.
    pub fn to_json_file(&self, path: &Path) -> AppResult<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}
