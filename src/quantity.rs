//! Bounded quantity steppers.

use crate::numeric::parse_int_prefix;

pub const MIN_QUANTITY: i64 = 1;

/// Ceiling used when a quantity input declares no usable `max`.
pub const DEFAULT_MAX_QUANTITY: i64 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Decrement,
    Increment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityBounds {
    pub min: i64,
    pub max: i64,
}

impl Default for QuantityBounds {
    fn default() -> Self {
        Self {
            min: MIN_QUANTITY,
            max: DEFAULT_MAX_QUANTITY,
        }
    }
}

impl QuantityBounds {
    /// Bounds for an input whose `max` attribute is `max_attr`. A missing or
    /// non-numeric attribute falls back to [`DEFAULT_MAX_QUANTITY`].
    pub fn from_max_attr(max_attr: Option<&str>) -> Self {
        let max = max_attr
            .and_then(parse_int_prefix)
            .unwrap_or(DEFAULT_MAX_QUANTITY);
        Self {
            min: MIN_QUANTITY,
            max,
        }
    }

    /// One step down, never below `min`. A value already below `min` is kept.
    pub fn decrement(&self, current: i64) -> i64 {
        if current > self.min {
            current - 1
        } else {
            current
        }
    }

    /// One step up, never above `max`. A value already above `max` is kept.
    pub fn increment(&self, current: i64) -> i64 {
        if current < self.max {
            current + 1
        } else {
            current
        }
    }

    pub fn step(&self, current: i64, direction: StepDirection) -> i64 {
        match direction {
            StepDirection::Decrement => self.decrement(current),
            StepDirection::Increment => self.increment(current),
        }
    }
}

/// Applies one stepper click to the raw text of a quantity input.
///
/// Returns the value to write back, or `None` when the click leaves the input
/// alone: the text is not a number, or the value already sits at the bound.
pub fn step_input_value(raw_value: &str, max_attr: Option<&str>, direction: StepDirection) -> Option<i64> {
    let current = parse_int_prefix(raw_value)?;
    let next = QuantityBounds::from_max_attr(max_attr).step(current, direction);
    (next != current).then_some(next)
}
