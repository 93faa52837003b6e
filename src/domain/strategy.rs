//! Strategy documents: a date window plus ordered buy and sell rule trees.
//!
//! Top-level rules are OR'd in document order; a key containing `and` with
//! a map value groups inner rules that must all hold. Rule keys are routed
//! to trigger families by substring match, with the family match tried
//! before the `and` marker so the candle family is never mistaken for a
//! group.

use chrono::{Local, NaiveDate};

use crate::domain::error::StratsimError;
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;
use crate::domain::trigger::{split_operator, RuleValue, Side, Trigger};

const DATE_FORMAT: &str = "%Y-%m-%d";
const AND_MARKER: &str = "and";

pub struct Strategy {
    start: NaiveDate,
    end: NaiveDate,
    buy_rules: Vec<(String, RuleValue)>,
    sell_rules: Vec<(String, RuleValue)>,
    triggers: Vec<Box<dyn Trigger>>,
}

impl Strategy {
    /// Parses and validates a strategy document. Rule grammar inside keys
    /// and values is checked lazily by the traversal helpers; this layer
    /// owns the document shape and the date window.
    pub fn from_document(
        document: &serde_json::Value,
        triggers: Vec<Box<dyn Trigger>>,
    ) -> Result<Self, StratsimError> {
        let root = document
            .as_object()
            .ok_or_else(|| StratsimError::MalformedStrategy {
                reason: "strategy document must be an object".to_string(),
            })?;

        let start = Self::field_date(root, "start")?;
        let end = Self::field_date(root, "end")?;
        if start > end {
            return Err(StratsimError::MalformedStrategy {
                reason: format!("start date {start} is after end date {end}"),
            });
        }
        let today = Local::now().date_naive();
        if end > today {
            return Err(StratsimError::MalformedStrategy {
                reason: format!("end date {end} is in the future"),
            });
        }

        let buy_rules = Self::field_rules(root, "buy")?;
        let sell_rules = Self::field_rules(root, "sell")?;

        let strategy = Strategy {
            start,
            end,
            buy_rules,
            sell_rules,
            triggers,
        };
        // surfaces unknown keys, misplaced sell-only rules and grammar
        // errors before any market data is fetched
        strategy.walk_rules(Side::Buy, &mut |_, _, _| Ok(()))?;
        strategy.walk_rules(Side::Sell, &mut |_, _, _| Ok(()))?;
        Ok(strategy)
    }

    fn field_date(
        root: &serde_json::Map<String, serde_json::Value>,
        name: &str,
    ) -> Result<NaiveDate, StratsimError> {
        let text = root
            .get(name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| StratsimError::MalformedStrategy {
                reason: format!("missing '{name}' date"),
            })?;
        NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| {
            StratsimError::MalformedStrategy {
                reason: format!("'{name}' date '{text}' is not {DATE_FORMAT}"),
            }
        })
    }

    fn field_rules(
        root: &serde_json::Map<String, serde_json::Value>,
        name: &str,
    ) -> Result<Vec<(String, RuleValue)>, StratsimError> {
        let map = root
            .get(name)
            .and_then(|v| v.as_object())
            .ok_or_else(|| StratsimError::MalformedStrategy {
                reason: format!("missing '{name}' rules"),
            })?;
        if map.is_empty() {
            return Err(StratsimError::MalformedStrategy {
                reason: format!("'{name}' rules are empty"),
            });
        }
        map.iter()
            .map(|(key, value)| Ok((key.clone(), RuleValue::from_document(value)?)))
            .collect()
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Finds the single trigger family whose symbol appears in `text`.
    fn match_trigger(&self, text: &str) -> Result<Option<&dyn Trigger>, StratsimError> {
        let mut matches = self
            .triggers
            .iter()
            .filter(|t| text.contains(t.indicator_symbol()));
        let first = matches.next();
        if let Some(second) = matches.next() {
            let first = first.map(|t| t.indicator_symbol()).unwrap_or_default();
            return Err(StratsimError::MalformedStrategy {
                reason: format!(
                    "rule '{text}' matches both {first} and {}",
                    second.indicator_symbol()
                ),
            });
        }
        Ok(first.map(|t| t.as_ref()))
    }

    /// Family referenced inside a comparison value, if any.
    fn match_value_trigger(&self, value: &RuleValue) -> Result<Option<&dyn Trigger>, StratsimError> {
        let RuleValue::Scalar(scalar) = value else {
            return Ok(None);
        };
        let Some((_, rest)) = split_operator(scalar) else {
            return Ok(None);
        };
        self.match_trigger(rest)
    }

    /// Depth-first walk over one side's rule tree, calling `visit` with each
    /// leaf rule and its family. Shared by warm-up sizing, data population
    /// and document validation.
    fn walk_rules(
        &self,
        side: Side,
        visit: &mut dyn FnMut(&dyn Trigger, &str, &RuleValue) -> Result<(), StratsimError>,
    ) -> Result<(), StratsimError> {
        let rules = match side {
            Side::Sell => &self.sell_rules,
            _ => &self.buy_rules,
        };
        for (key, value) in rules {
            self.walk_rule(side, key, value, visit)?;
        }
        Ok(())
    }

    fn walk_rule(
        &self,
        side: Side,
        key: &str,
        value: &RuleValue,
        visit: &mut dyn FnMut(&dyn Trigger, &str, &RuleValue) -> Result<(), StratsimError>,
    ) -> Result<(), StratsimError> {
        if let Some(trigger) = self.match_trigger(key)? {
            if trigger.side() != Side::Agnostic && trigger.side() != side {
                return Err(StratsimError::MalformedStrategy {
                    reason: format!(
                        "rule '{key}' is only valid on the {:?} side",
                        trigger.side()
                    ),
                });
            }
            return visit(trigger, key, value);
        }
        if key.contains(AND_MARKER) {
            let inner = value.as_map(key)?;
            for (inner_key, inner_value) in inner {
                let inner_value = RuleValue::from_document(inner_value)?;
                self.walk_rule(side, inner_key, &inner_value, visit)?;
            }
            return Ok(());
        }
        Err(StratsimError::MalformedStrategy {
            reason: format!("rule key '{key}' does not name any indicator"),
        })
    }

    /// Fetch window for this strategy: the configured dates plus enough
    /// calendar days before the start to warm every indicator up. The raw
    /// trading-day requirement is padded by three weekend days per week
    /// because the warm-up is counted in bars but fetched in calendar days.
    pub fn simulation_window(&self) -> Result<(NaiveDate, NaiveDate, u32), StratsimError> {
        let mut additional: u32 = 0;
        for side in [Side::Buy, Side::Sell] {
            self.walk_rules(side, &mut |trigger, key, value| {
                let mut days = trigger.additional_days_from_rule_key(key, value)?;
                if let Some(referenced) = self.match_value_trigger(value)? {
                    if let RuleValue::Scalar(scalar) = value {
                        days = days.max(referenced.additional_days_from_rule_value(scalar)?);
                    }
                }
                additional = additional.max(days);
                Ok(())
            })?;
        }
        additional += additional * 3 / 7;
        Ok((self.start, self.end, additional))
    }

    /// Computes every derived column any rule needs. Population is
    /// idempotent, so running it twice leaves the series unchanged.
    pub fn add_indicator_data(&self, series: &mut Series) -> Result<(), StratsimError> {
        for side in [Side::Buy, Side::Sell] {
            self.walk_rules(side, &mut |trigger, key, value| {
                trigger.add_indicator_data_from_rule_key(key, value, series)?;
                if let Some(referenced) = self.match_value_trigger(value)? {
                    if let RuleValue::Scalar(scalar) = value {
                        referenced.add_indicator_data_from_rule_value(scalar, series)?;
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Evaluates one side's rule tree on `day`. Returns the first rule that
    /// fires, rendered as `"key value"`, or `None` when the day is quiet.
    pub fn check_triggers_by_side(
        &self,
        series: &Series,
        day: usize,
        position: Option<&Position>,
        side: Side,
    ) -> Result<Option<String>, StratsimError> {
        let rules = match side {
            Side::Sell => &self.sell_rules,
            _ => &self.buy_rules,
        };
        for (key, value) in rules {
            if self.evaluate_rule(side, key, value, series, position, day)? {
                return Ok(Some(format!("{key} {}", describe_value(value))));
            }
        }
        Ok(None)
    }

    fn evaluate_rule(
        &self,
        side: Side,
        key: &str,
        value: &RuleValue,
        series: &Series,
        position: Option<&Position>,
        day: usize,
    ) -> Result<bool, StratsimError> {
        if let Some(trigger) = self.match_trigger(key)? {
            if trigger.side() != Side::Agnostic && trigger.side() != side {
                return Err(StratsimError::MalformedStrategy {
                    reason: format!(
                        "rule '{key}' is only valid on the {:?} side",
                        trigger.side()
                    ),
                });
            }
            let value = self.inject_referenced_value(value, series, day)?;
            return trigger.check_trigger(key, &value, series, position, day);
        }
        if key.contains(AND_MARKER) {
            let inner = value.as_map(key)?;
            let mut all = true;
            // keep walking after a miss so malformed inner rules still fail
            for (inner_key, inner_value) in inner {
                let inner_value = RuleValue::from_document(inner_value)?;
                let hit =
                    self.evaluate_rule(side, inner_key, &inner_value, series, position, day)?;
                all = all && hit;
            }
            return Ok(all);
        }
        Err(StratsimError::MalformedStrategy {
            reason: format!("rule key '{key}' does not name any indicator"),
        })
    }

    /// Rewrites `>SMA50` into `>104.2` before the owning trigger compares,
    /// so cross-indicator rules reduce to ordinary literal comparisons.
    fn inject_referenced_value(
        &self,
        value: &RuleValue,
        series: &Series,
        day: usize,
    ) -> Result<RuleValue, StratsimError> {
        let Some(referenced) = self.match_value_trigger(value)? else {
            return Ok(value.clone());
        };
        let RuleValue::Scalar(scalar) = value else {
            return Ok(value.clone());
        };
        let (op, _) = split_operator(scalar).unwrap_or(("=", ""));
        let resolved = referenced.get_indicator_value_when_referenced(scalar, series, day)?;
        Ok(RuleValue::Scalar(format!("{op}{resolved}")))
    }
}

fn describe_value(value: &RuleValue) -> String {
    match value {
        RuleValue::Scalar(s) => s.clone(),
        RuleValue::Map(m) => serde_json::Value::Object(m.clone()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use crate::domain::trigger::default_triggers;
    use chrono::Days;

    fn make_strategy(document: serde_json::Value) -> Result<Strategy, StratsimError> {
        Strategy::from_document(&document, default_triggers())
    }

    fn make_series(closes: &[f64]) -> Series {
        Series::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                        + Days::new(i as u64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000.0,
                })
                .collect(),
        )
    }

    #[test]
    fn parses_a_basic_document() {
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01",
            "end": "2024-06-01",
            "buy": { "SMA20": ">100" },
            "sell": { "stop_loss": "5%" }
        }))
        .unwrap();
        assert_eq!(strategy.start(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(strategy.end(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn rejects_bad_windows_and_empty_sides() {
        assert!(make_strategy(serde_json::json!({
            "start": "2024-06-01", "end": "2024-01-01",
            "buy": { "SMA20": ">100" }, "sell": { "stop_loss": "5" }
        }))
        .is_err());
        assert!(make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2099-01-01",
            "buy": { "SMA20": ">100" }, "sell": { "stop_loss": "5" }
        }))
        .is_err());
        assert!(make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": {}, "sell": { "stop_loss": "5" }
        }))
        .is_err());
        assert!(make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "SMA20": ">100" }
        }))
        .is_err());
    }

    #[test]
    fn rejects_unknown_rule_keys() {
        assert!(make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "bollinger": ">100" },
            "sell": { "stop_loss": "5" }
        }))
        .is_err());
    }

    #[test]
    fn rejects_sell_only_rules_on_the_buy_side() {
        assert!(make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "stop_loss": "5" },
            "sell": { "SMA20": "<100" }
        }))
        .is_err());
    }

    #[test]
    fn warm_up_takes_the_deepest_rule_with_weekend_padding() {
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "SMA20": ">100", "RSI": "<30" },
            "sell": { "stop_loss": "5" }
        }))
        .unwrap();
        let (_, _, additional) = strategy.simulation_window().unwrap();
        // 20 trading days plus floor(20 * 3 / 7) weekend days
        assert_eq!(additional, 28);
    }

    #[test]
    fn warm_up_covers_value_references() {
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "SMA5": ">SMA50" },
            "sell": { "stop_loss": "5" }
        }))
        .unwrap();
        let (_, _, additional) = strategy.simulation_window().unwrap();
        assert_eq!(additional, 50 + 50 * 3 / 7);
    }

    #[test]
    fn populates_all_referenced_columns() {
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "SMA2": ">SMA3" },
            "sell": { "RSI": ">70" }
        }))
        .unwrap();
        let mut series = make_series(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        strategy.add_indicator_data(&mut series).unwrap();
        assert!(series.has_column("SMA2"));
        assert!(series.has_column("SMA3"));
        assert!(series.has_column("RSI14"));

        // population is idempotent
        let before = series.column_names().count();
        strategy.add_indicator_data(&mut series).unwrap();
        assert_eq!(series.column_names().count(), before);
    }

    #[test]
    fn first_matching_rule_wins_in_document_order() {
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "price": ">100", "volume": ">0" },
            "sell": { "stop_loss": "5" }
        }))
        .unwrap();
        let mut series = make_series(&[101.0, 99.0]);
        strategy.add_indicator_data(&mut series).unwrap();

        let hit = strategy
            .check_triggers_by_side(&series, 0, None, Side::Buy)
            .unwrap();
        assert_eq!(hit.as_deref(), Some("price >100"));

        // price misses on day 1, the volume rule still fires
        let hit = strategy
            .check_triggers_by_side(&series, 1, None, Side::Buy)
            .unwrap();
        assert_eq!(hit.as_deref(), Some("volume >0"));
    }

    #[test]
    fn and_group_requires_every_inner_rule() {
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "and1": { "price": ">100", "volume": ">500" } },
            "sell": { "stop_loss": "5" }
        }))
        .unwrap();
        let mut series = make_series(&[101.0, 101.0]);
        strategy.add_indicator_data(&mut series).unwrap();

        let hit = strategy
            .check_triggers_by_side(&series, 0, None, Side::Buy)
            .unwrap();
        assert!(hit.is_some());

        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "and1": { "price": ">100", "volume": ">5000" } },
            "sell": { "stop_loss": "5" }
        }))
        .unwrap();
        let hit = strategy
            .check_triggers_by_side(&series, 0, None, Side::Buy)
            .unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn candle_key_is_not_an_and_group() {
        // "candle" contains the group marker but routes to its family
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "candle": { "0": "green" } },
            "sell": { "stop_loss": "5" }
        }))
        .unwrap();
        let mut series = make_series(&[100.0]);
        strategy.add_indicator_data(&mut series).unwrap();
        let hit = strategy
            .check_triggers_by_side(&series, 0, None, Side::Buy)
            .unwrap();
        assert!(hit.is_some());
    }

    #[test]
    fn cross_indicator_comparison_resolves_through_injection() {
        let strategy = make_strategy(serde_json::json!({
            "start": "2024-01-01", "end": "2024-06-01",
            "buy": { "SMA2": ">SMA4" },
            "sell": { "stop_loss": "5" }
        }))
        .unwrap();
        let mut series = make_series(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        strategy.add_indicator_data(&mut series).unwrap();
        // rising market: the short average sits above the long one
        let hit = strategy
            .check_triggers_by_side(&series, 4, None, Side::Buy)
            .unwrap();
        assert!(hit.is_some());
    }
}
