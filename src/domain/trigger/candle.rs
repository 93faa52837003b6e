//! Candle color trigger. The rule value maps day offsets to expected
//! colors, so `{"0": "green", "1": "red"}` reads "green today, red
//! yesterday". Doji bars count as green.

use crate::domain::error::StratsimError;
use crate::domain::indicator::candle::candle_color;
use crate::domain::indicator::CandleColor;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{RuleValue, Side, Trigger};

const COLUMN: &str = "candle_color";

const GREEN: f64 = 1.0;
const RED: f64 = 0.0;

pub struct CandleTrigger;

impl CandleTrigger {
    /// Parses and validates the offset map up front so a bad pattern fails
    /// the whole run instead of silently never firing.
    fn pattern(
        key: &str,
        value: &RuleValue,
    ) -> Result<Vec<(u32, CandleColor)>, StratsimError> {
        let map = value.as_map(key)?;
        if map.is_empty() {
            return Err(StratsimError::StrategyIndicator {
                rule: key.to_string(),
                reason: "candle pattern is empty".to_string(),
            });
        }
        let mut pattern = Vec::with_capacity(map.len());
        for (offset_text, color_value) in map {
            let offset = offset_text.parse::<u32>().map_err(|_| {
                StratsimError::StrategyIndicator {
                    rule: key.to_string(),
                    reason: format!("candle offset '{offset_text}' is not a whole number"),
                }
            })?;
            let color_text = color_value.as_str().ok_or_else(|| {
                StratsimError::StrategyIndicator {
                    rule: key.to_string(),
                    reason: format!("candle color for offset {offset} must be a string"),
                }
            })?;
            let color = match color_text {
                "green" => CandleColor::Green,
                "red" => CandleColor::Red,
                other => {
                    return Err(StratsimError::StrategyIndicator {
                        rule: key.to_string(),
                        reason: format!("unknown candle color '{other}'"),
                    })
                }
            };
            pattern.push((offset, color));
        }
        Ok(pattern)
    }
}

impl Trigger for CandleTrigger {
    fn indicator_symbol(&self) -> &'static str {
        "candle"
    }

    fn side(&self) -> Side {
        Side::Agnostic
    }

    fn additional_days_from_rule_key(
        &self,
        key: &str,
        value: &RuleValue,
    ) -> Result<u32, StratsimError> {
        let pattern = Self::pattern(key, value)?;
        Ok(pattern.iter().map(|&(offset, _)| offset).max().unwrap_or(0))
    }

    fn add_indicator_data_from_rule_key(
        &self,
        key: &str,
        value: &RuleValue,
        series: &mut Series,
    ) -> Result<(), StratsimError> {
        Self::pattern(key, value)?;
        if series.has_column(COLUMN) {
            return Ok(());
        }
        let opens: Vec<f64> = series.bars().iter().map(|b| b.open).collect();
        let colors = candle_color(&opens, &series.closes());
        let values = colors
            .into_iter()
            .map(|c| match c {
                CandleColor::Green => Some(GREEN),
                CandleColor::Red => Some(RED),
            })
            .collect();
        series.add_column(COLUMN, values);
        Ok(())
    }

    fn check_trigger(
        &self,
        key: &str,
        value: &RuleValue,
        series: &Series,
        _position: Option<&Position>,
        day: usize,
    ) -> Result<bool, StratsimError> {
        let pattern = Self::pattern(key, value)?;
        for (offset, expected) in pattern {
            let Some(index) = day.checked_sub(offset as usize) else {
                return Ok(false);
            };
            let Some(actual) = series.value(COLUMN, index) else {
                return Ok(false);
            };
            let expected = match expected {
                CandleColor::Green => GREEN,
                CandleColor::Red => RED,
            };
            if actual != expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use chrono::NaiveDate;

    fn make_series(opens_closes: &[(f64, f64)]) -> Series {
        Series::new(
            opens_closes
                .iter()
                .enumerate()
                .map(|(i, &(open, close))| Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(),
                    open,
                    high: open.max(close),
                    low: open.min(close),
                    close,
                    volume: 1000.0,
                })
                .collect(),
        )
    }

    fn rule_value(entries: &[(&str, &str)]) -> RuleValue {
        let mut map = serde_json::Map::new();
        for &(offset, color) in entries {
            map.insert(offset.to_string(), serde_json::Value::String(color.into()));
        }
        RuleValue::Map(map)
    }

    #[test]
    fn matches_offset_pattern() {
        let trigger = CandleTrigger;
        // red, green, green
        let mut series = make_series(&[(105.0, 100.0), (100.0, 103.0), (103.0, 104.0)]);
        let value = rule_value(&[("0", "green"), ("1", "green"), ("2", "red")]);
        trigger
            .add_indicator_data_from_rule_key("candle", &value, &mut series)
            .unwrap();
        assert!(trigger
            .check_trigger("candle", &value, &series, None, 2)
            .unwrap());
        assert!(!trigger
            .check_trigger("candle", &value, &series, None, 1)
            .unwrap());
    }

    #[test]
    fn offset_before_series_start_never_fires() {
        let trigger = CandleTrigger;
        let mut series = make_series(&[(100.0, 101.0)]);
        let value = rule_value(&[("3", "green")]);
        trigger
            .add_indicator_data_from_rule_key("candle", &value, &mut series)
            .unwrap();
        assert!(!trigger
            .check_trigger("candle", &value, &series, None, 0)
            .unwrap());
    }

    #[test]
    fn warm_up_covers_deepest_offset() {
        let trigger = CandleTrigger;
        let value = rule_value(&[("0", "green"), ("4", "red")]);
        assert_eq!(
            trigger.additional_days_from_rule_key("candle", &value).unwrap(),
            4
        );
    }

    #[test]
    fn rejects_malformed_patterns() {
        let trigger = CandleTrigger;
        assert!(trigger
            .additional_days_from_rule_key("candle", &rule_value(&[]))
            .is_err());
        assert!(trigger
            .additional_days_from_rule_key("candle", &rule_value(&[("0", "blue")]))
            .is_err());
        assert!(trigger
            .additional_days_from_rule_key("candle", &rule_value(&[("abc", "green")]))
            .is_err());
        assert!(trigger
            .additional_days_from_rule_key("candle", &RuleValue::Scalar(">0".into()))
            .is_err());
    }
}
