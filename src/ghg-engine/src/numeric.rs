// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Numeric policy shared by every indicator and formula.
//!
//! Nothing in here fails: unparseable input becomes `0`, out-of-domain
//! values are clamped to the nearest bound and divisions by zero yield `0`.
//! The only trace of a recovery is a `debug!` event.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Replaces NaN and infinities with `0`.
#[inline]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Coerces free-form input text to a number.
///
/// Blank text is `0`.  A leading numeric prefix is honoured the way form
/// inputs usually are (`"12.5 t"` is `12.5`, `"1,5"` is `1`); text without
/// one is `0`.
pub fn coerce(text: &str) -> f64 {
    lazy_static! {
        static ref NUMBER_RE: Regex =
            Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap();
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let value = match NUMBER_RE.find(trimmed) {
        Some(m) => m.as_str().parse::<f64>().unwrap_or(0.0),
        None => 0.0,
    };
    let value = finite_or_zero(value);

    if value == 0.0 && !trimmed.trim_start_matches(['+', '-', '0', '.']).is_empty() {
        debug!(input = trimmed, "coerced unparseable input to 0");
    }

    value
}

/// `numerator / denominator`, or `0` when the denominator is zero or the
/// quotient is not finite.
#[inline]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// Declared value domain of an indicator.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Any,
    NonNegative,
    /// Entered as 0..=100, read by formulas as a fraction.
    Percent,
    /// Already fractional, 0..=1.
    Fraction,
}

impl Domain {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Domain::Any => (f64::NEG_INFINITY, f64::INFINITY),
            Domain::NonNegative => (0.0, f64::INFINITY),
            Domain::Percent => (0.0, 100.0),
            Domain::Fraction => (0.0, 1.0),
        }
    }

    /// Clamps `value` into the domain after discarding non-finite values.
    pub fn clamp(self, value: f64) -> f64 {
        let value = finite_or_zero(value);
        let (lo, hi) = self.bounds();
        let clamped = value.clamp(lo, hi);
        if clamped != value {
            debug!(value, clamped, domain = ?self, "clamped value into its domain");
        }
        clamped
    }

    /// The value a formula sees for a stored `value` of this domain.
    pub fn as_operand(self, value: f64) -> f64 {
        match self {
            Domain::Percent => value / 100.0,
            _ => value,
        }
    }
}
