//! Day-by-day simulation of one strategy over one symbol.
//!
//! The engine holds at most one position at a time. Each trading day it is
//! either seeking an entry (no position, buy rules active) or seeking an
//! exit (position held, sell rules active); a day performs at most one
//! trade, always at that day's close.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::domain::account::Account;
use crate::domain::analyzer::Analysis;
use crate::domain::error::StratsimError;
use crate::domain::ohlcv::{Bar, Series};
use crate::domain::position::Position;
use crate::domain::strategy::Strategy;
use crate::domain::trigger::Side;
use crate::ports::broker_port::BrokerPort;

/// Column carrying the daily account equity for charts and reports.
pub const ACCOUNT_VALUE_COLUMN: &str = "account_value";

/// Tolerance, in calendar days, between the requested fetch window edges
/// and the bars actually returned. Covers weekends and short holiday runs.
const WINDOW_SLACK_DAYS: i64 = 4;

const LIQUIDATION_RULE: &str = "end of simulation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMarker {
    Buy,
    Sell,
}

/// Everything one run produces: the enriched series trimmed to the trading
/// window, per-day trade markers aligned with it, the closed-trade archive
/// and the final account.
#[derive(Debug)]
pub struct SimulationResult {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub series: Series,
    pub markers: Vec<Option<TradeMarker>>,
    pub archive: Vec<Position>,
    pub account: Account,
}

#[derive(Debug, Serialize)]
pub struct SimulationSummary {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub trading_days: usize,
    pub trades_made: usize,
    pub final_account_value: f64,
    #[serde(flatten)]
    pub analysis: Analysis,
}

impl SimulationResult {
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            symbol: self.symbol.clone(),
            start: self.start,
            end: self.end,
            trading_days: self.series.len(),
            trades_made: self.archive.len(),
            final_account_value: self.account.balance(),
            analysis: Analysis::compute(&self.archive),
        }
    }
}

pub fn run_simulation(
    broker: &dyn BrokerPort,
    strategy: &Strategy,
    symbol: &str,
    initial_balance: f64,
) -> Result<SimulationResult, StratsimError> {
    let (start, end, additional) = strategy.simulation_window()?;
    let fetch_start = start - Days::new(additional as u64);

    let bars = broker.get_daily_bars(symbol, fetch_start, end)?;
    if bars.is_empty() {
        return Err(StratsimError::InvalidSymbol {
            symbol: symbol.to_string(),
        });
    }
    check_window_edges(symbol, &bars, fetch_start, end)?;

    let mut series = Series::new(bars);
    strategy.add_indicator_data(&mut series)?;

    let warmup = series
        .bars()
        .iter()
        .position(|bar| bar.date >= start)
        .ok_or_else(|| StratsimError::InsufficientData {
            symbol: symbol.to_string(),
            reason: format!("no bars on or after {start}"),
        })?;

    let days = series.len();
    let mut account = Account::new(initial_balance);
    let mut open: Option<Position> = None;
    let mut archive: Vec<Position> = Vec::new();
    let mut markers: Vec<Option<TradeMarker>> = vec![None; days];
    let mut equity = vec![initial_balance; days];

    for day in warmup..days {
        let bar = *series.bar(day);
        // trigger checks run to completion before any money moves, so a
        // malformed rule can never leave the day half-applied
        open = match open.take() {
            Some(mut position) => {
                match strategy.check_triggers_by_side(&series, day, Some(&position), Side::Sell)? {
                    Some(rule) => {
                        account.deposit(position.share_count * bar.close);
                        position.close(bar.close, bar.date, rule);
                        archive.push(position);
                        markers[day] = Some(TradeMarker::Sell);
                        None
                    }
                    None => Some(position),
                }
            }
            None => match strategy.check_triggers_by_side(&series, day, None, Side::Buy)? {
                Some(rule) => {
                    let shares = (account.balance() / bar.close).floor();
                    if shares >= 1.0 {
                        account.withdraw(shares * bar.close);
                        markers[day] = Some(TradeMarker::Buy);
                        Some(Position::open(bar.close, shares, bar.date, rule))
                    } else {
                        None
                    }
                }
                None => None,
            },
        };
        equity[day] =
            account.balance() + open.as_ref().map_or(0.0, |p| p.market_value(bar.close));
    }

    // a position still held after the last day is liquidated at that close,
    // covering a buy that fired on the final day
    if let Some(mut position) = open.take() {
        let bar = *series.bar(days - 1);
        account.deposit(position.share_count * bar.close);
        position.close(bar.close, bar.date, LIQUIDATION_RULE.to_string());
        archive.push(position);
        // a buy that fired on the final day keeps its marker; the exit is
        // recorded in the archive only
        if markers[days - 1].is_none() {
            markers[days - 1] = Some(TradeMarker::Sell);
        }
        equity[days - 1] = account.balance();
    }

    series.add_column(ACCOUNT_VALUE_COLUMN, equity.into_iter().map(Some).collect());
    series.truncate_prefix(warmup);
    markers.drain(..warmup);

    Ok(SimulationResult {
        symbol: symbol.to_string(),
        start,
        end,
        series,
        markers,
        archive,
        account,
    })
}

/// The returned bars must hug both edges of the requested window. A first
/// bar far after the fetch start means the indicators would silently run on
/// a short warm-up, so that is an error rather than a degraded run.
fn check_window_edges(
    symbol: &str,
    bars: &[Bar],
    fetch_start: NaiveDate,
    end: NaiveDate,
) -> Result<(), StratsimError> {
    let first = bars[0].date;
    let last = bars[bars.len() - 1].date;
    if (first - fetch_start).num_days().abs() > WINDOW_SLACK_DAYS {
        return Err(StratsimError::InsufficientData {
            symbol: symbol.to_string(),
            reason: format!("first bar {first} is too far from requested start {fetch_start}"),
        });
    }
    if (end - last).num_days().abs() > WINDOW_SLACK_DAYS {
        return Err(StratsimError::InsufficientData {
            symbol: symbol.to_string(),
            reason: format!("last bar {last} is too far from requested end {end}"),
        });
    }
    Ok(())
}
