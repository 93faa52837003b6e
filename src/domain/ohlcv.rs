//! OHLCV bars and the column-extended day series.

use chrono::NaiveDate;
use std::collections::HashMap;

/// One trading day. Immutable once fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// An ordered sequence of bars plus named derived columns.
///
/// Every column has exactly one value slot per bar; `None` marks a
/// warm-up-incomplete indicator row. Day index `i` refers to the same
/// calendar day in every column. The only mutations are appending new
/// columns and the final [`Series::truncate_prefix`] that drops the
/// warm-up rows and reindexes to 0.
#[derive(Debug, Clone, Default)]
pub struct Series {
    bars: Vec<Bar>,
    columns: HashMap<String, Vec<Option<f64>>>,
}

impl Series {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            columns: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, day: usize) -> &Bar {
        &self.bars[day]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Appends a derived column. Re-adding an existing name is a no-op so
    /// that multiple triggers can request the same indicator idempotently.
    pub fn add_column(&mut self, name: &str, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.bars.len());
        if self.columns.contains_key(name) {
            return;
        }
        self.columns.insert(name.to_string(), values);
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Value of `name` on `day`; `None` when the column is missing, the day
    /// is out of range, or the indicator is not yet warmed on that day.
    pub fn value(&self, name: &str, day: usize) -> Option<f64> {
        self.columns.get(name)?.get(day).copied().flatten()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Drops the first `n` rows from the bars and every column, reindexing
    /// day numbers to start at 0. Used once, after a simulation completes,
    /// to cut the warm-up prefix from the reported window.
    pub fn truncate_prefix(&mut self, n: usize) {
        let n = n.min(self.bars.len());
        self.bars.drain(..n);
        for values in self.columns.values_mut() {
            values.drain(..n);
        }
    }
}
