//! Stop profit trigger. The mirror of stop loss: closes a position once its
//! running gain reaches the threshold.

use crate::domain::error::StratsimError;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::stop_loss::{parse_stop_threshold, StopThreshold};
use crate::domain::trigger::{RuleValue, Side, Trigger};

pub struct StopProfitTrigger;

impl Trigger for StopProfitTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "stop_profit"
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
            StopThreshold::Absolute(amount) => position.running_profit_loss(close) >= amount,
            StopThreshold::Percent(amount) => position.running_profit_loss_pct(close) >= amount,
        })
    }
}
