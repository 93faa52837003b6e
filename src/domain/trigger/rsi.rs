//! Relative strength index trigger.
//!
//! Defaults to a 14-day window when the key carries no number. Literal
//! thresholds also get a flat companion column so charts can draw the
//! overbought/oversold line alongside the oscillator.

use crate::domain::error::StratsimError;
use crate::domain::indicator::rsi::rsi;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{
    check_comparison, column_lhs, parse_shape, split_operator, RuleShape, RuleValue, Side, Trigger,
};

const DEFAULT_LENGTH: u32 = 14;

pub struct RsiTrigger;

impl RsiTrigger {
    fn shape(text: &str) -> Result<RuleShape, StratsimError> {
        parse_shape(text, Some(DEFAULT_LENGTH), false)
    }

    fn column_name(length: u32) -> String {
        format!("RSI{length}")
    }

    fn populate(shape: &RuleShape, series: &mut Series) {
        let length = shape.length.unwrap_or(DEFAULT_LENGTH);
        let name = Self::column_name(length);
        if series.has_column(&name) {
            return;
        }
        let values = rsi(length as usize, &series.closes());
        series.add_column(&name, values.into_iter().map(Some).collect());
    }

    fn populate_threshold(shape: &RuleShape, value: &str, series: &mut Series) {
        let Some((_, rest)) = split_operator(value) else {
            return;
        };
        let Ok(threshold) = rest.parse::<f64>() else {
            return;
        };
        let length = shape.length.unwrap_or(DEFAULT_LENGTH);
        let name = format!("{} threshold {rest}", Self::column_name(length));
        if series.has_column(&name) {
            return;
        }
        let flat = vec![Some(threshold); series.len()];
        series.add_column(&name, flat);
    }

    fn reference_text(value: &str) -> &str {
        split_operator(value).map_or(value, |(_, rest)| rest)
    }
}

impl Trigger for RsiTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "RSI"
    }

    fn side(&self) -> Side {
        Side::Agnostic
    }

    fn additional_days_from_rule_key(
        &self,
        key: &str,
        _value: &RuleValue,
    ) -> Result<u32, StratsimError> {
        let shape = Self::shape(key)?;
        Ok(shape.length.unwrap_or(DEFAULT_LENGTH) + shape.slope.unwrap_or(0))
    }

    fn additional_days_from_rule_value(&self, value: &str) -> Result<u32, StratsimError> {
        let shape = Self::shape(Self::reference_text(value))?;
        Ok(shape.length.unwrap_or(DEFAULT_LENGTH) + shape.slope.unwrap_or(0))
    }

    fn add_indicator_data_from_rule_key(
        &self,
        key: &str,
        value: &RuleValue,
        series: &mut Series,
    ) -> Result<(), StratsimError> {
        let shape = Self::shape(key)?;
        Self::populate(&shape, series);
        if let RuleValue::Scalar(scalar) = value {
            Self::populate_threshold(&shape, scalar, series);
        }
        Ok(())
    }

    fn add_indicator_data_from_rule_value(
        &self,
        value: &str,
        series: &mut Series,
    ) -> Result<(), StratsimError> {
        let shape = Self::shape(Self::reference_text(value))?;
        Self::populate(&shape, series);
        Ok(())
    }

    fn get_indicator_value_when_referenced(
        &self,
        rule_value: &str,
        series: &Series,
        day: usize,
    ) -> Result<f64, StratsimError> {
        let text = Self::reference_text(rule_value);
        let shape = Self::shape(text)?;
        let column = Self::column_name(shape.length.unwrap_or(DEFAULT_LENGTH));
        column_lhs(series, &column, shape.slope, day)?.ok_or_else(|| {
            StratsimError::StrategyIndicator {
                rule: rule_value.to_string(),
                reason: format!("{column} has no value on day {day}"),
            }
        })
    }

    fn check_trigger(
        &self,
        key: &str,
        value: &RuleValue,
        series: &Series,
        _position: Option<&Position>,
        day: usize,
    ) -> Result<bool, StratsimError> {
        let shape = Self::shape(key)?;
        let column = Self::column_name(shape.length.unwrap_or(DEFAULT_LENGTH));
        let lhs = column_lhs(series, &column, shape.slope, day)?;
        check_comparison(lhs, value.as_scalar(key)?, series, day)
    }
}
