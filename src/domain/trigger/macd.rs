//! MACD line trigger. Parameterless: the 12/26 pair is fixed, so a key may
//! only carry a slope window.

use crate::domain::error::StratsimError;
use crate::domain::indicator::macd::{macd, MACD_SLOW};
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{
    check_comparison, column_lhs, parse_shape, split_operator, RuleShape, RuleValue, Side, Trigger,
};

const COLUMN: &str = "MACD";

pub struct MacdTrigger;

impl MacdTrigger {
    fn shape(text: &str) -> Result<RuleShape, StratsimError> {
        parse_shape(text, None, true)
    }

    fn populate(series: &mut Series) {
        if series.has_column(COLUMN) {
            return;
        }
        let values = macd(&series.closes());
        series.add_column(COLUMN, values);
    }

    fn reference_text(value: &str) -> &str {
        split_operator(value).map_or(value, |(_, rest)| rest)
    }
}

impl Trigger for MacdTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "MACD"
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
        Ok(MACD_SLOW as u32 + shape.slope.unwrap_or(0))
    }

    fn additional_days_from_rule_value(&self, value: &str) -> Result<u32, StratsimError> {
        let shape = Self::shape(Self::reference_text(value))?;
        Ok(MACD_SLOW as u32 + shape.slope.unwrap_or(0))
    }

    fn add_indicator_data_from_rule_key(
        &self,
        key: &str,
        _value: &RuleValue,
        series: &mut Series,
    ) -> Result<(), StratsimError> {
        Self::shape(key)?;
        Self::populate(series);
        Ok(())
    }

    fn add_indicator_data_from_rule_value(
        &self,
        value: &str,
        series: &mut Series,
    ) -> Result<(), StratsimError> {
        Self::shape(Self::reference_text(value))?;
        Self::populate(series);
        Ok(())
    }

    fn get_indicator_value_when_referenced(
        &self,
        rule_value: &str,
        series: &Series,
        day: usize,
    ) -> Result<f64, StratsimError> {
        let shape = Self::shape(Self::reference_text(rule_value))?;
        column_lhs(series, COLUMN, shape.slope, day)?.ok_or_else(|| {
            StratsimError::StrategyIndicator {
                rule: rule_value.to_string(),
                reason: format!("{COLUMN} has no value on day {day}"),
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
        let lhs = column_lhs(series, COLUMN, shape.slope, day)?;
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
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                        + chrono::Days::new(i as u64),
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
    fn fixed_warm_up_is_the_slow_period() {
        let trigger = MacdTrigger;
        let value = RuleValue::Scalar(">0".into());
        assert_eq!(
            trigger.additional_days_from_rule_key("MACD", &value).unwrap(),
            26
        );
        assert_eq!(
            trigger
                .additional_days_from_rule_key("MACD$slope10", &value)
                .unwrap(),
            36
        );
    }

    #[test]
    fn rejects_embedded_length() {
        let trigger = MacdTrigger;
        assert!(trigger
            .additional_days_from_rule_key("MACD12", &RuleValue::Scalar(">0".into()))
            .is_err());
    }

    #[test]
    fn fires_once_both_averages_exist() {
        let trigger = MacdTrigger;
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let mut series = make_series(&closes);
        let value = RuleValue::Scalar(">0".into());
        trigger
            .add_indicator_data_from_rule_key("MACD", &value, &mut series)
            .unwrap();
        assert!(!trigger
            .check_trigger("MACD", &value, &series, None, 20)
            .unwrap());
        // rising market: the fast average sits above the slow one
        assert!(trigger
            .check_trigger("MACD", &value, &series, None, 39)
            .unwrap());
    }
}
