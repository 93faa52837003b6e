//! CSV file broker adapter. Serves daily bars from `{data_dir}/{SYMBOL}.csv`
//! files with a `date,open,high,low,close,volume` header.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::error::StratsimError;
use crate::domain::ohlcv::Bar;
use crate::ports::broker_port::BrokerPort;

pub struct CsvBrokerAdapter {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvBrokerAdapter {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }
}

impl BrokerPort for CsvBrokerAdapter {
    fn get_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, StratsimError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(StratsimError::InvalidSymbol {
                symbol: symbol.to_string(),
            });
        }

        let mut reader =
            csv::Reader::from_path(&path).map_err(|e| StratsimError::Broker {
                reason: format!("failed to open {}: {e}", path.display()),
            })?;

        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| StratsimError::Broker {
                reason: format!("bad row in {}: {e}", path.display()),
            })?;
            let date =
                NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                    StratsimError::Broker {
                        reason: format!("bad date '{}' in {}: {e}", row.date, path.display()),
                    }
                })?;
            if date < start || date > end {
                continue;
            }
            bars.push(Bar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|bar| bar.date);
        Ok(bars)
    }
}
