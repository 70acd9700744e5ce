// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::common::{MONTHS, Month};

/// Opaque reference to an uploaded evidence file.  Stored and forwarded,
/// never interpreted.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceHandle(pub String);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonthRecord {
    pub value: f64,
    pub data_source: String,
    pub evidence: Option<EvidenceHandle>,
}

/// Twelve monthly records of one indicator on one entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeries {
    records: [MonthRecord; MONTHS],
}

impl TimeSeries {
    pub fn new() -> Self {
        Default::default()
    }

    /// A series holding `value` in every month.
    pub fn filled(value: f64) -> Self {
        let mut series = TimeSeries::new();
        series.fill(value);
        series
    }

    pub fn get(&self, month: Month) -> f64 {
        self.records[month.index()].value
    }

    pub fn record(&self, month: Month) -> &MonthRecord {
        &self.records[month.index()]
    }

    pub fn record_mut(&mut self, month: Month) -> &mut MonthRecord {
        &mut self.records[month.index()]
    }

    /// Stores `value`, returning whether the stored value changed.
    pub fn set(&mut self, month: Month, value: f64) -> bool {
        let slot = &mut self.records[month.index()].value;
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn fill(&mut self, value: f64) {
        for record in self.records.iter_mut() {
            record.value = value;
        }
    }

    pub fn values(&self) -> [f64; MONTHS] {
        let mut values = [0.0; MONTHS];
        for (value, record) in values.iter_mut().zip(self.records.iter()) {
            *value = record.value;
        }
        values
    }

    pub fn records(&self) -> impl Iterator<Item = (Month, &MonthRecord)> {
        Month::all().zip(self.records.iter())
    }

    /// Sum of the twelve monthly values.
    pub fn yearly_total(&self) -> f64 {
        self.records.iter().map(|r| r.value).sum()
    }
}
