#![allow(dead_code)]

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use stratsim::domain::error::StratsimError;
pub use stratsim::domain::ohlcv::Bar;
use stratsim::domain::strategy::Strategy;
use stratsim::domain::trigger::default_triggers;
use stratsim::ports::broker_port::BrokerPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per calendar day from `from` to `to` inclusive, with the close
/// of day `i` taken from `close(i)`. High/low bracket the open and close.
pub fn daily_bars(from: NaiveDate, to: NaiveDate, close: impl Fn(usize) -> f64) -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut day = from;
    let mut i = 0;
    while day <= to {
        let c = close(i);
        let open = if i == 0 { c } else { close(i - 1) };
        bars.push(Bar {
            date: day,
            open,
            high: open.max(c) + 1.0,
            low: open.min(c) - 1.0,
            close: c,
            volume: 1000.0,
        });
        day = day + Days::new(1);
        i += 1;
    }
    bars
}

pub fn make_strategy(document: serde_json::Value) -> Strategy {
    Strategy::from_document(&document, default_triggers()).unwrap()
}

pub enum MockFailure {
    Broker(String),
    MissingCredential(String),
}

pub struct MockBrokerPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub failures: HashMap<String, MockFailure>,
}

impl MockBrokerPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_broker_error(mut self, symbol: &str, reason: &str) -> Self {
        self.failures
            .insert(symbol.to_string(), MockFailure::Broker(reason.to_string()));
        self
    }

    pub fn with_missing_credential(mut self, symbol: &str, name: &str) -> Self {
        self.failures.insert(
            symbol.to_string(),
            MockFailure::MissingCredential(name.to_string()),
        );
        self
    }
}

impl BrokerPort for MockBrokerPort {
    fn get_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, StratsimError> {
        if let Some(failure) = self.failures.get(symbol) {
            return Err(match failure {
                MockFailure::Broker(reason) => StratsimError::Broker {
                    reason: reason.clone(),
                },
                MockFailure::MissingCredential(name) => StratsimError::MissingCredential {
                    name: name.clone(),
                },
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|bar| bar.date >= start && bar.date <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}
