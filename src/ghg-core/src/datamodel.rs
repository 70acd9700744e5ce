// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// Number of monthly slots in every time series.
pub const MONTHS: usize = 12;

/// Arena key of an entity.  Ids are handed out in increasing order and are
/// never reused within one calculator.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A calendar month, 1 through 12.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month(u8);

impl Month {
    pub fn new(month: u32) -> Result<Month> {
        if (1..=MONTHS as u32).contains(&month) {
            Ok(Month(month as u8))
        } else {
            Err(Error::new(
                ErrorKind::Entity,
                ErrorCode::BadMonth,
                Some(format!("month {month} is outside 1..=12")),
            ))
        }
    }

    pub fn from_index(index: usize) -> Option<Month> {
        if index < MONTHS {
            Some(Month(index as u8 + 1))
        } else {
            None
        }
    }

    pub fn number(self) -> u32 {
        self.0 as u32
    }

    /// Zero-based slot in a series array.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = Month> {
        (1..=MONTHS as u8).map(Month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a category adds to or subtracts from the grand total.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Additive,
    /// Recovery, destruction, absorption or recycling of a gas.
    Subtractive,
}

impl Sign {
    pub fn factor(self) -> f64 {
        match self {
            Sign::Additive => 1.0,
            Sign::Subtractive => -1.0,
        }
    }
}

/// Weighs one category total into the grand total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregationRule {
    pub category_key: String,
    pub conversion_factor: f64,
    pub sign: Sign,
}

impl AggregationRule {
    pub fn additive(category_key: &str, conversion_factor: f64) -> Self {
        AggregationRule {
            category_key: category_key.to_owned(),
            conversion_factor,
            sign: Sign::Additive,
        }
    }

    pub fn subtractive(category_key: &str, conversion_factor: f64) -> Self {
        AggregationRule {
            category_key: category_key.to_owned(),
            conversion_factor,
            sign: Sign::Subtractive,
        }
    }
}
