// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for formulas and aggregation.
//!
//! These tests verify that:
//! 1. Every built-in formula is pure and always yields a finite number
//! 2. Formulas declared non-negative never yield a negative number
//! 3. Yearly totals are exactly the sum of the twelve months
//! 4. Removing an entity, once or twice, restores every total

use proptest::prelude::*;

use ghg_engine::{
    Calculator, Clamp, Formula, Month, ReferenceTables, Schema, profiles,
};

fn builtin_formulas() -> Vec<(String, Formula)> {
    let mut formulas = vec![];
    for profile in profiles::all() {
        let schema = Schema::compile(profile).unwrap();
        for ty in schema.entity_types() {
            for def in ty.calculated() {
                if let Some(formula) = &def.formula {
                    formulas.push((format!("{}.{}", ty.tag(), def.key), formula.clone()));
                }
            }
        }
    }
    formulas
}

fn operand_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(-1.0),
        (0i32..100_000).prop_map(|x| x as f64 / 8.0),
        -1e6f64..1e6,
        Just(f64::MAX),
    ]
}

fn year() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..1e7, 12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn formulas_are_pure_and_finite(args in prop::collection::vec(operand_value(), 6)) {
        for (name, formula) in builtin_formulas() {
            let args = &args[..formula.operands().len()];
            let first = formula.evaluate(args);
            let second = formula.evaluate(args);
            prop_assert_eq!(first.to_bits(), second.to_bits(), "{}", name);
            prop_assert!(first.is_finite(), "{} gave {}", name, first);
            if formula.clamp() == Clamp::NonNegative {
                prop_assert!(first >= 0.0, "{} gave {}", name, first);
            }
        }
    }

    #[test]
    fn yearly_total_is_the_sum_of_months(values in year()) {
        let mut calc = Calculator::for_profile("cement", ReferenceTables::builtin()).unwrap();
        let coal = calc.add_child(None, "coke").unwrap();
        for (m, v) in Month::all().zip(values.iter()) {
            calc.set_value(coal, "consumption", m, *v).unwrap();
        }

        let mut expected = 0.0;
        for v in values.iter() {
            expected += *v;
        }
        prop_assert_eq!(calc.yearly_total(coal, "consumption").unwrap(), expected);

        let series = calc.series(coal, "carbon_emitted").unwrap();
        let mut expected = 0.0;
        for m in Month::all() {
            expected += series.get(m);
        }
        prop_assert_eq!(calc.yearly_total(coal, "carbon_emitted").unwrap(), expected);
    }

    #[test]
    fn removal_restores_totals(
        base in year(),
        extra in year(),
        purity in 0.0f64..100.0,
    ) {
        let mut calc = Calculator::for_profile("cement", ReferenceTables::builtin()).unwrap();
        let line = calc.add_child(None, "production-line").unwrap();
        let rock = calc.add_child(Some(line), "limestone").unwrap();
        for (m, v) in Month::all().zip(base.iter()) {
            calc.set_value(rock, "consumption", m, *v).unwrap();
            calc.set_value(rock, "purity", m, purity).unwrap();
        }
        let before = calc.grand_total();
        let categories = calc.category_totals().clone();

        let added = calc.add_child(Some(line), "magnesite").unwrap();
        for (m, v) in Month::all().zip(extra.iter()) {
            calc.set_value(added, "consumption", m, *v).unwrap();
            calc.set_value(added, "purity", m, purity).unwrap();
        }

        prop_assert!(calc.remove_child(added));
        prop_assert_eq!(calc.grand_total(), before);
        prop_assert_eq!(calc.category_totals(), &categories);

        prop_assert!(!calc.remove_child(added));
        prop_assert_eq!(calc.grand_total(), before);
    }
}
