// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::calculator::Calculator;

pub type Shared = Rc<RefCell<SummaryTable>>;

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    pub key: String,
    pub industry: String,
    pub name: String,
    pub total: f64,
}

/// Latest grand total of every connected calculator, one row each.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryTable {
    rows: BTreeMap<String, SummaryRow>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn shared() -> Shared {
        Rc::new(RefCell::new(SummaryTable::new()))
    }

    pub fn record(&mut self, key: &str, industry: &str, name: &str, total: f64) {
        let row = self.rows.entry(key.to_owned()).or_insert_with(|| SummaryRow {
            key: key.to_owned(),
            industry: industry.to_owned(),
            name: name.to_owned(),
            total: 0.0,
        });
        row.total = total;
    }

    pub fn remove(&mut self, key: &str) -> Option<SummaryRow> {
        self.rows.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows.get(key).map(|r| r.total)
    }

    pub fn rows(&self) -> impl Iterator<Item = &SummaryRow> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum over every row.
    pub fn total(&self) -> f64 {
        self.rows.values().map(|r| r.total).sum()
    }

    /// Totals per industry, summed over the rows of each.
    pub fn by_industry(&self) -> BTreeMap<&str, f64> {
        let mut totals = BTreeMap::new();
        for row in self.rows.values() {
            *totals.entry(row.industry.as_str()).or_insert(0.0) += row.total;
        }
        totals
    }
}

/// Makes `table` the consumer of `calc`'s total changes under the
/// calculator's industry key.  The row appears immediately.
pub fn connect(table: &Shared, calc: &mut Calculator) {
    let key = calc.industry().to_owned();
    connect_as(table, calc, &key);
}

/// Like [`connect`], for several calculators of one industry.
pub fn connect_as(table: &Shared, calc: &mut Calculator, key: &str) {
    let table = Rc::clone(table);
    let key = key.to_owned();
    let industry = calc.industry().to_owned();
    let name = calc.schema().name.clone();
    calc.on_total_changed(move |total| {
        table.borrow_mut().record(&key, &industry, &name, total);
    });
}
