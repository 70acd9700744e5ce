// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::calculator::Calculator;
use crate::common::{EntityId, Month};
use crate::reference::ReferenceTables;

pub(crate) fn month(m: u32) -> Month {
    Month::new(m).unwrap()
}

pub(crate) fn test_calculator(profile: &str) -> Calculator<'static> {
    Calculator::for_profile(profile, ReferenceTables::builtin()).unwrap()
}

/// Sets `key` to `value` in every month of the year.
pub(crate) fn fill(calc: &mut Calculator, id: EntityId, key: &str, value: f64) {
    for m in Month::all() {
        calc.set_value(id, key, m, value).unwrap();
    }
}
