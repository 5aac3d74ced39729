//! Multi-trace aligned dataset for swept measurements.
//!
//! A [`Sweep`] holds every column recorded during one measurement run: the
//! independent variable first (wavelength, angle, time), followed by one or
//! more dependent columns. Construction validates the whole set eagerly and
//! derives positional aliases and per-trace ranges, so downstream consumers
//! (plotting, export, unit conversion) can index columns without re-checking
//! anything.
//!
//! # Invariants
//!
//! - At least two traces: one independent, one or more dependent.
//! - Every trace has the same number of points; that count is the sweep's
//!   length.
//! - When attrs are supplied, their key set equals the trace key set.
//! - The aliases `x`, `y`, `y0`, `y1`, ... always resolve to a trace.
//! - Cached ranges match the current trace contents; [`Sweep::rescale`]
//!   recomputes the affected trace's range before returning.
//!
//! Trace order is positional and fixed at construction: the first column is
//! `x`, the second is `y`/`y0`, and so on. Renaming traces is not supported.

use std::collections::HashMap;

use log::debug;

use crate::error::{AppResult, DaqError};

/// Per-trace metadata: a human-readable description and a physical unit.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TraceAttr {
    /// What the trace measures, e.g. "Optical Power".
    pub description: String,
    /// Physical unit of the values, e.g. "mW".
    pub unit: String,
}

impl TraceAttr {
    /// Builds an attrs entry from borrowed strings.
    pub fn new(description: &str, unit: &str) -> Self {
        Self {
            description: description.to_string(),
            unit: unit.to_string(),
        }
    }

    /// Axis label in the form plot annotations use: `description (unit)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.description, self.unit)
    }
}

/// The aggregate of all traces from one measurement run, plus derived
/// alias, range, and metadata state.
#[derive(Clone, Debug)]
pub struct Sweep {
    /// Canonical trace names, in acquisition order.
    names: Vec<String>,
    /// Trace values, parallel to `names`.
    columns: Vec<Vec<f64>>,
    /// Name -> position in `names`/`columns`.
    index: HashMap<String, usize>,
    /// Per-trace metadata; empty when the sweep is unannotated.
    attrs: HashMap<String, TraceAttr>,
    /// Positional alias -> canonical trace name.
    aliases: HashMap<String, String>,
    /// Cached (min, max) per trace.
    ranges: HashMap<String, (f64, f64)>,
    /// Common point count of every trace.
    len: usize,
}

impl Sweep {
    /// Validates the trace set and builds the derived state.
    ///
    /// `traces` is an ordered sequence of `(name, values)` pairs; the order
    /// decides the `x`/`y{n}` alias assignment. `attrs`, when given, must
    /// carry exactly one entry per trace.
    pub fn new(
        traces: Vec<(String, Vec<f64>)>,
        attrs: Option<HashMap<String, TraceAttr>>,
    ) -> AppResult<Self> {
        if traces.len() < 2 {
            return Err(DaqError::Shape(
                "there must be more than one trace of data to make a sweep".into(),
            ));
        }

        let mut names = Vec::with_capacity(traces.len());
        let mut columns = Vec::with_capacity(traces.len());
        let mut index = HashMap::with_capacity(traces.len());
        for (name, values) in traces {
            if values.is_empty() {
                return Err(DaqError::Shape(format!("trace '{name}' is empty")));
            }
            if index.insert(name.clone(), names.len()).is_some() {
                return Err(DaqError::Shape(format!("duplicate trace name '{name}'")));
            }
            names.push(name);
            columns.push(values);
        }

        let attrs = attrs.unwrap_or_default();
        if !attrs.is_empty()
            && (attrs.len() != names.len() || names.iter().any(|n| !attrs.contains_key(n)))
        {
            return Err(DaqError::AttrsMismatch);
        }

        let len = columns[0].len();
        for (name, column) in names.iter().zip(&columns).skip(1) {
            if column.len() != len {
                return Err(DaqError::LengthMismatch {
                    trace: name.clone(),
                    expected: len,
                    actual: column.len(),
                });
            }
        }

        let mut aliases = HashMap::with_capacity(names.len() + 1);
        aliases.insert("x".to_string(), names[0].clone());
        aliases.insert("y".to_string(), names[1].clone());
        for (ii, name) in names.iter().skip(1).enumerate() {
            aliases.insert(format!("y{ii}"), name.clone());
        }

        let mut ranges = HashMap::with_capacity(names.len());
        for (name, column) in names.iter().zip(&columns) {
            ranges.insert(name.clone(), span(column));
        }

        debug!("Built sweep: {} traces x {} points", names.len(), len);

        Ok(Self {
            names,
            columns,
            index,
            attrs,
            aliases,
            ranges,
            len,
        })
    }

    /// Builds a sweep from textual columns, converting every element to a
    /// number.
    ///
    /// Instrument responses arrive as strings; an element that does not
    /// parse is reported together with the trace it came from.
    pub fn from_raw<S: AsRef<str>>(
        traces: Vec<(String, Vec<S>)>,
        attrs: Option<HashMap<String, TraceAttr>>,
    ) -> AppResult<Self> {
        let mut parsed = Vec::with_capacity(traces.len());
        for (name, raw) in traces {
            let mut values = Vec::with_capacity(raw.len());
            for elem in &raw {
                let elem = elem.as_ref().trim();
                let value = elem.parse::<f64>().map_err(|source| DaqError::Numeric {
                    trace: name.clone(),
                    value: elem.to_string(),
                    source,
                })?;
                values.push(value);
            }
            parsed.push((name, values));
        }
        Self::new(parsed, attrs)
    }

    /// Common point count of every trace.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: construction rejects empty traces.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Canonical name of the independent trace.
    pub fn x_col(&self) -> &str {
        &self.names[0]
    }

    /// Canonical names of the dependent traces, in acquisition order.
    pub fn y_cols(&self) -> &[String] {
        &self.names[1..]
    }

    /// All canonical trace names, in acquisition order.
    pub fn trace_names(&self) -> &[String] {
        &self.names
    }

    /// Per-trace metadata; empty for an unannotated sweep.
    pub fn attrs(&self) -> &HashMap<String, TraceAttr> {
        &self.attrs
    }

    /// Cached (min, max) per canonical trace name.
    pub fn ranges(&self) -> &HashMap<String, (f64, f64)> {
        &self.ranges
    }

    /// Cached (min, max) of one trace, by name or alias.
    pub fn range(&self, col: &str) -> AppResult<(f64, f64)> {
        let name = self.resolve(col)?;
        Ok(self.ranges[name])
    }

    /// Resolves a positional alias (`x`, `y`, `y0`, ...) or canonical trace
    /// name to the canonical name. Aliases are checked first.
    pub fn resolve(&self, col: &str) -> AppResult<&str> {
        if let Some(name) = self.aliases.get(col) {
            return Ok(name);
        }
        match self.index.get_key_value(col) {
            Some((name, _)) => Ok(name),
            None => Err(DaqError::TraceNotFound(col.to_string())),
        }
    }

    /// Borrowed view of a trace's values, by name or alias.
    ///
    /// No copy is made: the slice aliases the sweep's own buffer and stays
    /// valid until the next mutating call.
    pub fn get(&self, col: &str) -> AppResult<&[f64]> {
        let name = self.resolve(col)?;
        Ok(&self.columns[self.index[name]])
    }

    /// Plot-ready labels, one per trace, in the form `description (unit)`.
    ///
    /// With `use_generic_names`, keys are the positional aliases (`x`, `y0`,
    /// `y1`, ...) instead of canonical trace names; the synonymous `y` never
    /// appears as a key. Fails when the sweep was built without attrs.
    pub fn axis_labels(&self, use_generic_names: bool) -> AppResult<HashMap<String, String>> {
        if self.attrs.is_empty() {
            return Err(DaqError::NoAttrs);
        }

        let mut labels = HashMap::with_capacity(self.names.len());
        for (ii, name) in self.names.iter().enumerate() {
            let key = if use_generic_names {
                if ii == 0 {
                    "x".to_string()
                } else {
                    format!("y{}", ii - 1)
                }
            } else {
                name.clone()
            };
            labels.insert(key, self.attrs[name].label());
        }
        Ok(labels)
    }

    /// Rescales one trace in place: every value is multiplied by `coeff`.
    ///
    /// On an annotated sweep the new `unit` is mandatory; a numeric
    /// coefficient alone says nothing about the resulting unit. The trace's
    /// attrs entry is updated (`description` too when given) and its cached
    /// range is recomputed before returning. A failed call leaves the sweep
    /// untouched.
    pub fn rescale(
        &mut self,
        col: &str,
        coeff: f64,
        unit: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<()> {
        let name = self.resolve(col)?.to_string();

        if !self.attrs.is_empty() && unit.is_none() {
            return Err(DaqError::MissingUnit);
        }

        let ii = self.index[&name];
        for value in &mut self.columns[ii] {
            *value *= coeff;
        }
        self.ranges.insert(name.clone(), span(&self.columns[ii]));

        // attrs keys mirror trace names, and `unit` was checked above.
        if let (Some(unit), Some(entry)) = (unit, self.attrs.get_mut(&name)) {
            if let Some(description) = description {
                entry.description = description.to_string();
            }
            entry.unit = unit.to_string();
        }

        debug!("Rescaled trace '{}' by {}", name, coeff);
        Ok(())
    }
}

fn span(values: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &value in values {
        lo = lo.min(value);
        hi = hi.max(value);
    }
    (lo, hi)
}
