//! Close price trigger. Parameterless; compares the raw close, or its slope,
//! without any derived column.

use crate::domain::error::StratsimError;
use crate::domain::indicator::slope;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{
    check_comparison, parse_shape, split_operator, RuleShape, RuleValue, Side, Trigger,
};

pub struct PriceTrigger;

impl PriceTrigger {
    fn shape(text: &str) -> Result<RuleShape, StratsimError> {
        parse_shape(text, None, true)
    }

    fn reference_text(value: &str) -> &str {
        split_operator(value).map_or(value, |(_, rest)| rest)
    }

    fn lhs(
        series: &Series,
        slope_window: Option<u32>,
        day: usize,
    ) -> Result<Option<f64>, StratsimError> {
        let Some(window) = slope_window else {
            return Ok(Some(series.bar(day).close));
        };
        let span = window.saturating_sub(1) as usize;
        if day < span {
            return Ok(None);
        }
        let y2 = series.bar(day).close;
        let y1 = series.bar(day - span).close;
        slope(y2, y1, window).map(Some)
    }
}

impl Trigger for PriceTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "price"
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
        Ok(shape.slope.unwrap_or(0))
    }

    fn additional_days_from_rule_value(&self, value: &str) -> Result<u32, StratsimError> {
        let shape = Self::shape(Self::reference_text(value))?;
        Ok(shape.slope.unwrap_or(0))
    }

    fn add_indicator_data_from_rule_key(
        &self,
        key: &str,
        _value: &RuleValue,
        _series: &mut Series,
    ) -> Result<(), StratsimError> {
        Self::shape(key)?;
        Ok(())
    }

    fn get_indicator_value_when_referenced(
        &self,
        rule_value: &str,
        series: &Series,
        day: usize,
    ) -> Result<f64, StratsimError> {
        let shape = Self::shape(Self::reference_text(rule_value))?;
        Self::lhs(series, shape.slope, day)?.ok_or_else(|| StratsimError::StrategyIndicator {
            rule: rule_value.to_string(),
            reason: format!("price slope has no value on day {day}"),
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
        let lhs = Self::lhs(series, shape.slope, day)?;
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
    fn compares_raw_close() {
        let trigger = PriceTrigger;
        let series = make_series(&[100.0, 105.0]);
        let value = RuleValue::Scalar(">102".into());
        assert!(!trigger
            .check_trigger("price", &value, &series, None, 0)
            .unwrap());
        assert!(trigger
            .check_trigger("price", &value, &series, None, 1)
            .unwrap());
    }

    #[test]
    fn slope_over_closes() {
        let trigger = PriceTrigger;
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let series = make_series(&closes);
        let value = RuleValue::Scalar(">0.5".into());
        // (109 - 100) / 10 = 0.9
        assert!(trigger
            .check_trigger("price$slope10", &value, &series, None, 9)
            .unwrap());
        // not enough history
        assert!(!trigger
            .check_trigger("price$slope10", &value, &series, None, 5)
            .unwrap());
    }

    #[test]
    fn rejects_plain_number() {
        let trigger = PriceTrigger;
        assert!(trigger
            .additional_days_from_rule_key("price20", &RuleValue::Scalar(">0".into()))
            .is_err());
    }

    #[test]
    fn reference_resolves_to_close() {
        let trigger = PriceTrigger;
        let series = make_series(&[100.0, 105.0]);
        let value = trigger
            .get_indicator_value_when_referenced("<=price", &series, 1)
            .unwrap();
        assert!((value - 105.0).abs() < f64::EPSILON);
    }
}
