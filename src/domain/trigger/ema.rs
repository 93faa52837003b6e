//! Exponential moving average trigger.
//!
//! Unlike the SMA column, the EMA column is null for the whole seed window,
//! so rules over it simply do not fire until the average has warmed up.

use crate::domain::error::StratsimError;
use crate::domain::indicator::ema::ema;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{
    check_comparison, column_lhs, parse_shape, split_operator, RuleShape, RuleValue, Side, Trigger,
};

pub struct EmaTrigger;

impl EmaTrigger {
    fn shape(text: &str) -> Result<RuleShape, StratsimError> {
        parse_shape(text, None, false)
    }

    fn column_name(length: u32) -> String {
        format!("EMA{length}")
    }

    fn populate(shape: &RuleShape, series: &mut Series) {
        let length = shape.length.unwrap_or(1);
        let name = Self::column_name(length);
        if series.has_column(&name) {
            return;
        }
        let values = ema(length as usize, &series.closes());
        series.add_column(&name, values);
    }

    fn reference_text(value: &str) -> &str {
        split_operator(value).map_or(value, |(_, rest)| rest)
    }
}

impl Trigger for EmaTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "EMA"
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
        Ok(shape.length.unwrap_or(0) + shape.slope.unwrap_or(0))
    }

    fn additional_days_from_rule_value(&self, value: &str) -> Result<u32, StratsimError> {
        let shape = Self::shape(Self::reference_text(value))?;
        Ok(shape.length.unwrap_or(0) + shape.slope.unwrap_or(0))
    }

    fn add_indicator_data_from_rule_key(
        &self,
        key: &str,
        _value: &RuleValue,
        series: &mut Series,
    ) -> Result<(), StratsimError> {
        let shape = Self::shape(key)?;
        Self::populate(&shape, series);
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
        let column = Self::column_name(shape.length.unwrap_or(1));
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
        let column = Self::column_name(shape.length.unwrap_or(1));
        let lhs = column_lhs(series, &column, shape.slope, day)?;
        check_comparison(lhs, value.as_scalar(key)?, series, day)
    }
}
