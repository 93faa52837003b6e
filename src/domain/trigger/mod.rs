//! Indicator triggers: technical indicators translated into boolean
//! conditions on rule keys and values.
//!
//! One [`Trigger`] implementation per indicator family. A rule key names
//! the family and its parameters (`SMA20`, `RSI`, `EMA20$slope10`); the
//! rule value carries a comparison (`>100`, `<=SMA50`, `>price`) or, for
//! candle and stop rules, a family-specific shape. Rule keys are matched
//! to families by substring containment of the family symbol — symbols
//! are chosen to be mutually non-overlapping by construction, and the
//! match is deliberately not tightened to exact or prefix matching.

pub mod candle;
pub mod ema;
pub mod macd;
pub mod price;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod stop_loss;
pub mod stop_profit;
pub mod volume;

use crate::domain::error::StratsimError;
use crate::domain::indicator::{round3, slope};
use crate::domain::ohlcv::Series;
use crate::domain::position::Position;

pub use candle::CandleTrigger;
pub use ema::EmaTrigger;
pub use macd::MacdTrigger;
pub use price::PriceTrigger;
pub use rsi::RsiTrigger;
pub use sma::SmaTrigger;
pub use stochastic::StochasticTrigger;
pub use stop_loss::StopLossTrigger;
pub use stop_profit::StopProfitTrigger;
pub use volume::VolumeTrigger;

/// Which simulation phase may invoke a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
    Agnostic,
}

/// Marker for the slope transform in a rule key (`EMA20$slope10`).
pub const SLOPE_MARKER: &str = "$slope";

/// Literal in a rule value meaning "the current day's close price".
pub const PRICE_MARKER: &str = "price";

/// Tolerance for the `=` comparison operator.
pub const EPSILON: f64 = 0.001;

/// A strategy rule value after document parsing: either a comparison (or
/// stop threshold) scalar, or a nested map (AND-group inner rules, candle
/// color offsets).
#[derive(Debug, Clone)]
pub enum RuleValue {
    Scalar(String),
    Map(serde_json::Map<String, serde_json::Value>),
}

impl RuleValue {
    pub fn from_document(value: &serde_json::Value) -> Result<Self, StratsimError> {
        match value {
            serde_json::Value::String(s) => Ok(RuleValue::Scalar(s.clone())),
            serde_json::Value::Number(n) => Ok(RuleValue::Scalar(n.to_string())),
            serde_json::Value::Object(map) => Ok(RuleValue::Map(map.clone())),
            other => Err(StratsimError::MalformedStrategy {
                reason: format!("unsupported rule value: {other}"),
            }),
        }
    }

    pub fn as_scalar(&self, key: &str) -> Result<&str, StratsimError> {
        match self {
            RuleValue::Scalar(s) => Ok(s),
            RuleValue::Map(_) => Err(StratsimError::MalformedStrategy {
                reason: format!("rule '{key}' expects a comparison value, found a map"),
            }),
        }
    }

    pub fn as_map(
        &self,
        key: &str,
    ) -> Result<&serde_json::Map<String, serde_json::Value>, StratsimError> {
        match self {
            RuleValue::Map(m) => Ok(m),
            RuleValue::Scalar(s) => Err(StratsimError::MalformedStrategy {
                reason: format!("rule '{key}' expects a map value, found '{s}'"),
            }),
        }
    }
}

/// One indicator family. Stateless apart from the fixed symbol/side pair;
/// all day-local state arrives as arguments.
pub trait Trigger {
    /// Symbol matched against rule keys and values by substring containment.
    fn indicator_symbol(&self) -> &'static str;

    fn side(&self) -> Side;

    /// Warm-up days this rule key needs beyond the simulation start.
    fn additional_days_from_rule_key(
        &self,
        key: &str,
        value: &RuleValue,
    ) -> Result<u32, StratsimError>;

    /// Warm-up days needed by a rule value that references this family
    /// (cross-indicator comparison such as `RSI: >SMA50`).
    fn additional_days_from_rule_value(&self, _value: &str) -> Result<u32, StratsimError> {
        Ok(0)
    }

    /// Idempotently computes and appends this family's derived column(s).
    fn add_indicator_data_from_rule_key(
        &self,
        key: &str,
        value: &RuleValue,
        series: &mut Series,
    ) -> Result<(), StratsimError>;

    fn add_indicator_data_from_rule_value(
        &self,
        _value: &str,
        _series: &mut Series,
    ) -> Result<(), StratsimError> {
        Ok(())
    }

    /// Resolves a rule value referencing this family to its numeric value
    /// on `day`. Used by the rule evaluator's value-injection step.
    fn get_indicator_value_when_referenced(
        &self,
        rule_value: &str,
        _series: &Series,
        _day: usize,
    ) -> Result<f64, StratsimError> {
        Err(StratsimError::StrategyIndicator {
            rule: rule_value.to_string(),
            reason: format!(
                "{} cannot be referenced inside a rule value",
                self.indicator_symbol()
            ),
        })
    }

    /// Whether this rule holds on `day`.
    fn check_trigger(
        &self,
        key: &str,
        value: &RuleValue,
        series: &Series,
        position: Option<&Position>,
        day: usize,
    ) -> Result<bool, StratsimError>;
}

/// Registry of every built-in trigger family, constructed once at startup
/// and handed to each strategy. No process-wide singletons.
pub fn default_triggers() -> Vec<Box<dyn Trigger>> {
    vec![
        Box::new(SmaTrigger),
        Box::new(EmaTrigger),
        Box::new(RsiTrigger),
        Box::new(MacdTrigger),
        Box::new(StochasticTrigger),
        Box::new(PriceTrigger),
        Box::new(VolumeTrigger),
        Box::new(CandleTrigger),
        Box::new(StopLossTrigger),
        Box::new(StopProfitTrigger),
    ]
}

/// Parsed parameters of one rule key or indicator reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RuleShape {
    pub length: Option<u32>,
    pub slope: Option<u32>,
}

fn shape_error(text: &str, reason: impl Into<String>) -> StratsimError {
    StratsimError::StrategyIndicator {
        rule: text.to_string(),
        reason: reason.into(),
    }
}

/// Collects the embedded decimal number groups of a rule key, left to right.
pub(crate) fn extract_numbers(text: &str) -> Result<Vec<u32>, StratsimError> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    for ch in text.chars().chain(std::iter::once(' ')) {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else if !current.is_empty() {
            let n = current
                .parse::<u32>()
                .map_err(|_| shape_error(text, format!("number '{current}' is out of range")))?;
            numbers.push(n);
            current.clear();
        }
    }

    Ok(numbers)
}

/// Applies the embedded-number grammar for one family.
///
/// Without the slope marker: zero numbers fall back to the family default
/// (an error for families without one), one number is the explicit length.
/// With the marker, the slope window needs its own number *in addition* to
/// the length, so a parameterized family requires exactly two numbers and a
/// parameterless one exactly one.
pub(crate) fn parse_shape(
    text: &str,
    default_length: Option<u32>,
    parameterless: bool,
) -> Result<RuleShape, StratsimError> {
    let numbers = extract_numbers(text)?;
    if numbers.iter().any(|&n| n == 0) {
        return Err(shape_error(text, "indicator lengths must be positive"));
    }
    let has_slope = text.contains(SLOPE_MARKER);

    if parameterless {
        return match (has_slope, numbers.len()) {
            (false, 0) => Ok(RuleShape {
                length: None,
                slope: None,
            }),
            (false, _) => Err(shape_error(text, "this indicator takes no length")),
            (true, 1) => Ok(RuleShape {
                length: None,
                slope: Some(numbers[0]),
            }),
            (true, _) => Err(shape_error(text, "slope requires exactly one window length")),
        };
    }

    match (has_slope, numbers.len()) {
        (false, 0) => match default_length {
            Some(d) => Ok(RuleShape {
                length: Some(d),
                slope: None,
            }),
            None => Err(shape_error(text, "this indicator requires an explicit length")),
        },
        (false, 1) => Ok(RuleShape {
            length: Some(numbers[0]),
            slope: None,
        }),
        (true, 2) => Ok(RuleShape {
            length: Some(numbers[0]),
            slope: Some(numbers[1]),
        }),
        (true, _) => Err(shape_error(
            text,
            "slope requires both an indicator length and a slope window length",
        )),
        (false, _) => Err(shape_error(text, "too many embedded numbers")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
}

impl CmpOp {
    pub(crate) fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Le => lhs <= rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Gt => lhs > rhs,
            // rounded so a difference of exactly 0.001 in decimal still
            // counts as equal despite binary representation noise
            CmpOp::Eq => round3((lhs - rhs).abs()) <= EPSILON,
        }
    }
}

/// Splits a comparison value into its operator and right-hand text.
/// `<=` and `>=` must be tried before their one-character prefixes.
pub(crate) fn split_operator(value: &str) -> Option<(&'static str, &str)> {
    let v = value.trim();
    for op in ["<=", ">=", "<", ">", "="] {
        if let Some(rest) = v.strip_prefix(op) {
            return Some((op, rest.trim()));
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Rhs {
    Literal(f64),
    CurrentPrice,
}

pub(crate) fn parse_comparison(value: &str) -> Result<(CmpOp, Rhs), StratsimError> {
    let (op_text, rest) = split_operator(value)
        .ok_or_else(|| shape_error(value, "missing comparison operator"))?;
    let op = match op_text {
        "<=" => CmpOp::Le,
        ">=" => CmpOp::Ge,
        "<" => CmpOp::Lt,
        ">" => CmpOp::Gt,
        _ => CmpOp::Eq,
    };
    let rhs = if rest == PRICE_MARKER {
        Rhs::CurrentPrice
    } else {
        rest.parse::<f64>().map(Rhs::Literal).map_err(|_| {
            shape_error(value, format!("unresolved comparison value '{rest}'"))
        })?
    };
    Ok((op, rhs))
}

/// Evaluates a comparison against a resolved left-hand value. A `None`
/// left-hand side (indicator not yet warmed) never fires.
pub(crate) fn check_comparison(
    lhs: Option<f64>,
    value: &str,
    series: &Series,
    day: usize,
) -> Result<bool, StratsimError> {
    let Some(lhs) = lhs else {
        return Ok(false);
    };
    let (op, rhs) = parse_comparison(value)?;
    let rhs = match rhs {
        Rhs::Literal(v) => v,
        Rhs::CurrentPrice => series.bar(day).close,
    };
    Ok(op.holds(lhs, rhs))
}

/// Left-hand value of a column-backed rule on `day`, optionally through the
/// slope transform. `None` when the column is not warmed far enough back.
pub(crate) fn column_lhs(
    series: &Series,
    column: &str,
    slope_window: Option<u32>,
    day: usize,
) -> Result<Option<f64>, StratsimError> {
    let Some(window) = slope_window else {
        return Ok(series.value(column, day));
    };
    let span = window.saturating_sub(1) as usize;
    if day < span {
        return Ok(None);
    }
    match (series.value(column, day), series.value(column, day - span)) {
        (Some(y2), Some(y1)) => slope(y2, y1, window).map(Some),
        _ => Ok(None),
    }
}
