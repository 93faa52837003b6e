//! Traded volume trigger. Mirrors the price trigger over the volume field.

use crate::domain::error::StratsimError;
use crate::domain::indicator::slope;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{
    check_comparison, parse_shape, split_operator, RuleShape, RuleValue, Side, Trigger,
};

pub struct VolumeTrigger;

impl VolumeTrigger {
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
            return Ok(Some(series.bar(day).volume));
        };
        let span = window.saturating_sub(1) as usize;
        if day < span {
            return Ok(None);
        }
        let y2 = series.bar(day).volume;
        let y1 = series.bar(day - span).volume;
        slope(y2, y1, window).map(Some)
    }
}

impl Trigger for VolumeTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "volume"
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
            reason: format!("volume slope has no value on day {day}"),
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

    fn make_series(volumes: &[f64]) -> Series {
        Series::new(
            volumes
                .iter()
                .enumerate()
                .map(|(i, &volume)| Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(),
                    open: 100.0,
                    high: 100.0,
                    low: 100.0,
                    close: 100.0,
                    volume,
                })
                .collect(),
        )
    }

    #[test]
    fn compares_raw_volume() {
        let trigger = VolumeTrigger;
        let series = make_series(&[1000.0, 5000.0]);
        let value = RuleValue::Scalar(">2000".into());
        assert!(!trigger
            .check_trigger("volume", &value, &series, None, 0)
            .unwrap());
        assert!(trigger
            .check_trigger("volume", &value, &series, None, 1)
            .unwrap());
    }

    #[test]
    fn slope_over_volumes() {
        let trigger = VolumeTrigger;
        let volumes: Vec<f64> = (0..5).map(|i| 1000.0 + 100.0 * i as f64).collect();
        let series = make_series(&volumes);
        let value = RuleValue::Scalar(">0".into());
        assert!(trigger
            .check_trigger("volume$slope3", &value, &series, None, 4)
            .unwrap());
    }
}
