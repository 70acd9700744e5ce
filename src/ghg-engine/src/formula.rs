// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Pure formulas for calculated indicators.
//!
//! A [`Formula`] names its operands (indicators of the same entity, or
//! entity constants) and carries a plain function pointer over their
//! current-month values.  Operand values arrive already normalized:
//! percentages have been divided by 100 by the caller, so bodies only ever
//! see fractions.  There is no captured state, so evaluating a formula twice
//! with the same arguments gives the same result.

use std::fmt;

use smallvec::SmallVec;

use crate::numeric::{finite_or_zero, safe_div};

/// Stoichiometric ratio of CO2 to carbon.
pub const CO2_PER_C: f64 = 44.0 / 12.0;
/// Stoichiometric ratio of CO2 to CH4 (complete oxidation).
pub const CO2_PER_CH4: f64 = 44.0 / 16.0;
/// Stoichiometric ratio of CO2 to CaO (carbonation).
pub const CO2_PER_CAO: f64 = 44.0 / 56.0;
/// Molar volume of an ideal gas at standard conditions, L/mol.
pub const MOLAR_VOLUME: f64 = 22.4;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Current-month value of another indicator on the same entity.
    Indicator(String),
    /// An entity-level constant (GWP, density, molar mass, ...).
    Constant(String),
}

impl Operand {
    pub fn indicator(key: &str) -> Self {
        Operand::Indicator(key.to_owned())
    }

    pub fn constant(name: &str) -> Self {
        Operand::Constant(name.to_owned())
    }

    pub fn name(&self) -> &str {
        match self {
            Operand::Indicator(name) | Operand::Constant(name) => name,
        }
    }
}

/// What happens to a negative result before it leaves the leaf.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Clamp {
    #[default]
    None,
    NonNegative,
}

pub type FormulaFn = fn(&[f64]) -> f64;

#[derive(Clone)]
pub struct Formula {
    name: &'static str,
    operands: SmallVec<[Operand; 6]>,
    body: FormulaFn,
    clamp: Clamp,
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Formula")
            .field("name", &self.name)
            .field("operands", &self.operands)
            .field("clamp", &self.clamp)
            .finish()
    }
}

impl Formula {
    pub fn new(name: &'static str, operands: Vec<Operand>, body: FormulaFn) -> Self {
        Formula {
            name,
            operands: SmallVec::from_vec(operands),
            body,
            clamp: Clamp::None,
        }
    }

    /// Declares that negative results are clamped to zero.
    pub fn non_negative(mut self) -> Self {
        self.clamp = Clamp::NonNegative;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn clamp(&self) -> Clamp {
        self.clamp
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn indicator_inputs(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().filter_map(|op| match op {
            Operand::Indicator(key) => Some(key.as_str()),
            Operand::Constant(_) => None,
        })
    }

    pub fn constant_inputs(&self) -> impl Iterator<Item = &str> {
        self.operands.iter().filter_map(|op| match op {
            Operand::Constant(name) => Some(name.as_str()),
            Operand::Indicator(_) => None,
        })
    }

    /// Evaluates the formula over operand values given in operand order.
    ///
    /// The result is always finite; the declared clamp is applied last.
    pub fn evaluate(&self, args: &[f64]) -> f64 {
        debug_assert_eq!(args.len(), self.operands.len(), "{}", self.name);
        if args.len() != self.operands.len() {
            return 0.0;
        }
        let value = finite_or_zero((self.body)(args));
        match self.clamp {
            Clamp::None => value,
            Clamp::NonNegative => value.max(0.0),
        }
    }
}

/// The formula families used by the built-in industry profiles.
pub mod families {
    use super::*;

    fn ops(indicators: &[&str], constants: &[&str]) -> Vec<Operand> {
        indicators
            .iter()
            .map(|k| Operand::indicator(k))
            .chain(constants.iter().map(|c| Operand::constant(c)))
            .collect()
    }

    /// Product of every operand: activity × factor × ... .
    pub fn product(indicators: &[&str], constants: &[&str]) -> Formula {
        Formula::new("product", ops(indicators, constants), |xs| {
            xs.iter().product()
        })
    }

    /// `a - b`.
    pub fn difference(a: &str, b: &str) -> Formula {
        Formula::new("difference", ops(&[a, b], &[]), |xs| xs[0] - xs[1])
    }

    /// `numerator / denominator`, zero when the denominator is zero.
    pub fn ratio(numerator: &str, denominator: &str) -> Formula {
        Formula::new("ratio", ops(&[numerator, denominator], &[]), |xs| {
            safe_div(xs[0], xs[1])
        })
    }

    /// `numerator / denominator` expressed in percent.
    pub fn percent_ratio(numerator: &str, denominator: &str) -> Formula {
        Formula::new(
            "percent_ratio",
            ops(&[numerator, denominator], &[]),
            |xs| safe_div(xs[0], xs[1]) * 100.0,
        )
    }

    /// Recovered CO2 mass from two volume/concentration streams:
    /// `(v1 × c1 + v2 × c2) × density`.
    pub fn co2_recovery(
        volume_a: &str,
        concentration_a: &str,
        volume_b: &str,
        concentration_b: &str,
        density: &str,
    ) -> Formula {
        Formula::new(
            "co2_recovery",
            ops(
                &[volume_a, concentration_a, volume_b, concentration_b],
                &[density],
            ),
            |xs| (xs[0] * xs[1] + xs[2] * xs[3]) * xs[4],
        )
        .non_negative()
    }

    /// Mass of one component of a gas mixture, in tonnes, from a volume in
    /// 10^4 Nm³, its volume fraction and its molar mass in g/mol.
    pub fn gas_mass(volume: &str, concentration: &str, molar_mass: &str) -> Formula {
        Formula::new(
            "gas_mass",
            ops(&[volume, concentration], &[molar_mass]),
            |xs| safe_div(xs[0] * xs[1] * xs[2] * 10.0, MOLAR_VOLUME),
        )
        .non_negative()
    }

    /// Methane from wastewater treatment, in tonnes:
    /// `(cod_removed - sludge_cod) × bo × mcf / 1000 - recovered`.
    pub fn wastewater_ch4(
        cod_removed: &str,
        sludge_cod: &str,
        mcf: &str,
        recovered: &str,
        bo: &str,
    ) -> Formula {
        Formula::new(
            "wastewater_ch4",
            ops(&[cod_removed, sludge_cod, mcf, recovered], &[bo]),
            |xs| (xs[0] - xs[1]) * xs[4] * xs[2] / 1000.0 - xs[3],
        )
        .non_negative()
    }

    /// CO2 bound by carbonation of CaO: `mass × (after - before) × 44/56`.
    pub fn carbonation_absorption(mass: &str, cao_before: &str, cao_after: &str) -> Formula {
        Formula::new(
            "carbonation_absorption",
            ops(&[mass, cao_before, cao_after], &[]),
            |xs| xs[0] * (xs[2] - xs[1]) * CO2_PER_CAO,
        )
        .non_negative()
    }

    /// Mass released to the atmosphere: `generated - destroyed`.
    pub fn escaped(generated: &str, destroyed: &str) -> Formula {
        Formula::new("escaped", ops(&[generated, destroyed], &[]), |xs| {
            xs[0] - xs[1]
        })
        .non_negative()
    }

    /// `(a + b) × factor`.
    pub fn sum_times(a: &str, b: &str, factor: &str) -> Formula {
        Formula::new("sum_times", ops(&[a, b], &[factor]), |xs| {
            (xs[0] + xs[1]) * xs[2]
        })
    }
}
