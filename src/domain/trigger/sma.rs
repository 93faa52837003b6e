//! Simple moving average trigger.

use crate::domain::error::StratsimError;
use crate::domain::indicator::sma::sma;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{
    check_comparison, column_lhs, parse_shape, split_operator, RuleShape, RuleValue, Side, Trigger,
};

pub struct SmaTrigger;

impl SmaTrigger {
    fn shape(text: &str) -> Result<RuleShape, StratsimError> {
        parse_shape(text, None, false)
    }

    fn column_name(length: u32) -> String {
        format!("SMA{length}")
    }

    fn populate(shape: &RuleShape, series: &mut Series) {
        let length = shape.length.unwrap_or(1);
        let name = Self::column_name(length);
        if series.has_column(&name) {
            return;
        }
        let values = sma(length as usize, &series.closes());
        series.add_column(&name, values.into_iter().map(Some).collect());
    }

    /// Strips the comparison operator when the family appears in a rule
    /// value (`<=SMA50`); a bare reference is used as-is.
    fn reference_text(value: &str) -> &str {
        split_operator(value).map_or(value, |(_, rest)| rest)
    }
}

impl Trigger for SmaTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "SMA"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use chrono::NaiveDate;

    fn make_series(closes: &[f64]) -> Series {
        Series::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1000.0,
                })
                .collect(),
        )
    }

    #[test]
    fn requires_explicit_length() {
        let trigger = SmaTrigger;
        assert!(trigger
            .additional_days_from_rule_key("SMA", &RuleValue::Scalar(">100".into()))
            .is_err());
        assert_eq!(
            trigger
                .additional_days_from_rule_key("SMA20", &RuleValue::Scalar(">100".into()))
                .unwrap(),
            20
        );
    }

    #[test]
    fn populates_named_column() {
        let trigger = SmaTrigger;
        let mut series = make_series(&[100.0, 102.0, 104.0, 106.0]);
        trigger
            .add_indicator_data_from_rule_key("SMA2", &RuleValue::Scalar(">100".into()), &mut series)
            .unwrap();
        assert!(series.has_column("SMA2"));
        assert_eq!(series.value("SMA2", 1), Some(101.0));
    }

    #[test]
    fn fires_on_comparison() {
        let trigger = SmaTrigger;
        let mut series = make_series(&[100.0, 102.0, 104.0, 106.0]);
        trigger
            .add_indicator_data_from_rule_key("SMA2", &RuleValue::Scalar(">102".into()), &mut series)
            .unwrap();
        // SMA2 on day 3 is 105.0
        assert!(trigger
            .check_trigger("SMA2", &RuleValue::Scalar(">102".into()), &series, None, 3)
            .unwrap());
        assert!(!trigger
            .check_trigger("SMA2", &RuleValue::Scalar(">102".into()), &series, None, 1)
            .unwrap());
    }

    #[test]
    fn resolves_value_reference() {
        let trigger = SmaTrigger;
        let mut series = make_series(&[100.0, 102.0, 104.0, 106.0]);
        trigger
            .add_indicator_data_from_rule_value("<=SMA2", &mut series)
            .unwrap();
        let value = trigger
            .get_indicator_value_when_referenced("<=SMA2", &series, 3)
            .unwrap();
        assert!((value - 105.0).abs() < f64::EPSILON);
    }

    #[test]
    fn slope_key_needs_two_numbers() {
        let trigger = SmaTrigger;
        assert!(trigger
            .additional_days_from_rule_key("SMA20$slope", &RuleValue::Scalar(">0".into()))
            .is_err());
        assert_eq!(
            trigger
                .additional_days_from_rule_key("SMA20$slope10", &RuleValue::Scalar(">0".into()))
                .unwrap(),
            30
        );
    }
}
