//! Stop loss trigger. Sell-side only; reads the open position's running
//! loss against today's close rather than any derived column.

use crate::domain::error::StratsimError;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{RuleValue, Side, Trigger};

/// Threshold of a stop rule: a plain number is absolute currency, a
/// trailing `%` switches to percent of the entry cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StopThreshold {
    Absolute(f64),
    Percent(f64),
}

pub(crate) fn parse_stop_threshold(
    key: &str,
    value: &RuleValue,
) -> Result<StopThreshold, StratsimError> {
    let text = value.as_scalar(key)?.trim();
    let (digits, percent) = match text.strip_suffix('%') {
        Some(rest) => (rest.trim(), true),
        None => (text, false),
    };
    let amount = digits
        .parse::<f64>()
        .map_err(|_| StratsimError::StrategyIndicator {
            rule: key.to_string(),
            reason: format!("stop threshold '{text}' is not a number"),
        })?;
    if amount <= 0.0 {
        return Err(StratsimError::StrategyIndicator {
            rule: key.to_string(),
            reason: "stop threshold must be positive".to_string(),
        });
    }
    if percent {
        Ok(StopThreshold::Percent(amount))
    } else {
        Ok(StopThreshold::Absolute(amount))
    }
}

pub struct StopLossTrigger;

impl Trigger for StopLossTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "stop_loss"
    }

    fn side(&self) -> Side {
        Side::Sell
    }

    fn additional_days_from_rule_key(
        &self,
        key: &str,
        value: &RuleValue,
    ) -> Result<u32, StratsimError> {
        parse_stop_threshold(key, value)?;
        Ok(0)
    }

    fn add_indicator_data_from_rule_key(
        &self,
        key: &str,
        value: &RuleValue,
        _series: &mut Series,
    ) -> Result<(), StratsimError> {
        parse_stop_threshold(key, value)?;
        Ok(())
    }

    fn check_trigger(
        &self,
        key: &str,
        value: &RuleValue,
        series: &Series,
        position: Option<&Position>,
        day: usize,
    ) -> Result<bool, StratsimError> {
        let threshold = parse_stop_threshold(key, value)?;
        let Some(position) = position else {
            return Ok(false);
        };
        let close = series.bar(day).close;
        Ok(match threshold {
            StopThreshold::Absolute(amount) => position.running_profit_loss(close) <= -amount,
            StopThreshold::Percent(amount) => position.running_profit_loss_pct(close) <= -amount,
        })
    }
}
