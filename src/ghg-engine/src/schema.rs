// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Static description of indicators, entity types and industry profiles,
//! and their compilation into a [`Schema`] the calculator can run.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::common::{AggregationRule, Result, topo_sort};
use crate::formula::{Formula, Operand};
use crate::numeric::Domain;
use crate::schema_err;

#[derive(Clone, Debug)]
pub struct IndicatorDefinition {
    pub key: String,
    pub unit: String,
    pub domain: Domain,
    pub decimal_places: u8,
    pub default_value: Option<f64>,
    /// Present iff the indicator is calculated.
    pub formula: Option<Formula>,
}

impl IndicatorDefinition {
    pub fn raw(key: &str, unit: &str) -> Self {
        IndicatorDefinition {
            key: key.to_owned(),
            unit: unit.to_owned(),
            domain: Domain::NonNegative,
            decimal_places: 2,
            default_value: None,
            formula: None,
        }
    }

    pub fn calculated(key: &str, unit: &str, formula: Formula) -> Self {
        IndicatorDefinition {
            key: key.to_owned(),
            unit: unit.to_owned(),
            domain: Domain::Any,
            decimal_places: 2,
            default_value: None,
            formula: Some(formula),
        }
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_default(mut self, value: f64) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_decimals(mut self, decimal_places: u8) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    pub fn is_calculated(&self) -> bool {
        self.formula.is_some()
    }
}

/// Where the value of a reference factor ends up on a new entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactorTarget {
    /// Stored as an entity constant, available to formulas as
    /// `Operand::Constant`.
    Constant,
    /// Pre-populates all twelve months of a raw indicator.
    Series(String),
}

/// A value normally looked up in the reference tables (emission factor,
/// GWP, molar mass, calorific value, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactorDef {
    pub name: String,
    pub unit: String,
    pub target: FactorTarget,
}

impl FactorDef {
    pub fn constant(name: &str, unit: &str) -> Self {
        FactorDef {
            name: name.to_owned(),
            unit: unit.to_owned(),
            target: FactorTarget::Constant,
        }
    }

    pub fn series(name: &str, unit: &str) -> Self {
        FactorDef {
            name: name.to_owned(),
            unit: unit.to_owned(),
            target: FactorTarget::Series(name.to_owned()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EntityType {
    pub tag: String,
    pub label: String,
    pub indicators: Vec<IndicatorDefinition>,
    pub factors: Vec<FactorDef>,
    /// Raw indicator overwritten by `set_equipment`, if the type has
    /// selectable equipment.
    pub equipment_indicator: Option<String>,
}

impl EntityType {
    pub fn new(tag: &str, label: &str) -> Self {
        EntityType {
            tag: tag.to_owned(),
            label: label.to_owned(),
            indicators: vec![],
            factors: vec![],
            equipment_indicator: None,
        }
    }

    pub fn indicator(mut self, indicator: IndicatorDefinition) -> Self {
        self.indicators.push(indicator);
        self
    }

    pub fn factor(mut self, factor: FactorDef) -> Self {
        self.factors.push(factor);
        self
    }

    pub fn equipment(mut self, indicator: &str) -> Self {
        self.equipment_indicator = Some(indicator.to_owned());
        self
    }
}

/// A group of sibling entities whose yearly totals of one indicator are
/// summed before a rule weighs them into the grand total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub key: String,
    pub label: String,
    pub entity_type: String,
    pub indicator: String,
}

impl Category {
    pub fn new(key: &str, label: &str, entity_type: &str, indicator: &str) -> Self {
        Category {
            key: key.to_owned(),
            label: label.to_owned(),
            entity_type: entity_type.to_owned(),
            indicator: indicator.to_owned(),
        }
    }
}

/// Everything that makes one industry calculator different from another.
#[derive(Clone, Debug)]
pub struct Profile {
    pub key: String,
    pub name: String,
    pub entity_types: Vec<EntityType>,
    pub categories: Vec<Category>,
    pub rules: Vec<AggregationRule>,
}

/// An entity type with lookup tables and the order in which its calculated
/// indicators must be evaluated.
#[derive(Clone, Debug)]
pub struct CompiledType {
    pub def: EntityType,
    index: HashMap<String, usize>,
    calc_order: Vec<usize>,
}

impl CompiledType {
    pub fn tag(&self) -> &str {
        &self.def.tag
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorDefinition> {
        self.index.get(key).map(|i| &self.def.indicators[*i])
    }

    pub fn indicators(&self) -> &[IndicatorDefinition] {
        &self.def.indicators
    }

    /// Calculated indicators, dependencies first.
    pub fn calculated(&self) -> impl Iterator<Item = &IndicatorDefinition> {
        self.calc_order.iter().map(|i| &self.def.indicators[*i])
    }

    pub fn constant_factors(&self) -> impl Iterator<Item = &FactorDef> {
        self.def
            .factors
            .iter()
            .filter(|f| f.target == FactorTarget::Constant)
    }

    fn compile(def: EntityType) -> Result<CompiledType> {
        let mut index = HashMap::new();
        for (i, indicator) in def.indicators.iter().enumerate() {
            if index.insert(indicator.key.clone(), i).is_some() {
                return schema_err!(
                    DuplicateIndicator,
                    format!("{}.{}", def.tag, indicator.key)
                );
            }
        }

        let mut factor_names = HashSet::new();
        for factor in def.factors.iter() {
            if !factor_names.insert(factor.name.as_str()) {
                return schema_err!(DuplicateFactor, format!("{}.{}", def.tag, factor.name));
            }
            if let FactorTarget::Series(key) = &factor.target {
                match index.get(key) {
                    Some(i) if !def.indicators[*i].is_calculated() => {}
                    _ => {
                        return schema_err!(
                            UnknownOperand,
                            format!("factor {} targets {}.{}", factor.name, def.tag, key)
                        );
                    }
                }
            }
        }
        let constants: HashSet<&str> = def
            .factors
            .iter()
            .filter(|f| f.target == FactorTarget::Constant)
            .map(|f| f.name.as_str())
            .collect();

        if let Some(key) = &def.equipment_indicator {
            match index.get(key) {
                Some(i) if !def.indicators[*i].is_calculated() => {}
                _ => {
                    return schema_err!(
                        UnknownIndicator,
                        format!("equipment targets {}.{}", def.tag, key)
                    );
                }
            }
        }

        let mut dependencies: HashMap<String, BTreeSet<String>> = HashMap::new();
        for indicator in def.indicators.iter() {
            let Some(formula) = &indicator.formula else {
                continue;
            };
            for operand in formula.operands() {
                let known = match operand {
                    Operand::Indicator(key) => index.contains_key(key),
                    Operand::Constant(name) => constants.contains(name.as_str()),
                };
                if !known {
                    return schema_err!(
                        UnknownOperand,
                        format!("{}.{} uses {}", def.tag, indicator.key, operand.name())
                    );
                }
            }
            dependencies.insert(
                indicator.key.clone(),
                formula.indicator_inputs().map(|k| k.to_owned()).collect(),
            );
        }

        let calc_order = {
            let runlist: Vec<&str> = def
                .indicators
                .iter()
                .filter(|i| i.is_calculated())
                .map(|i| i.key.as_str())
                .collect();
            topo_sort(runlist, &dependencies)?
                .into_iter()
                .map(|key| index[key])
                .collect()
        };

        Ok(CompiledType {
            def,
            index,
            calc_order,
        })
    }
}

/// A validated [`Profile`].
#[derive(Clone, Debug)]
pub struct Schema {
    pub key: String,
    pub name: String,
    types: BTreeMap<String, CompiledType>,
    categories: Vec<Category>,
    rules: Vec<AggregationRule>,
}

impl Schema {
    pub fn compile(profile: Profile) -> Result<Schema> {
        let mut types = BTreeMap::new();
        for def in profile.entity_types.into_iter() {
            let tag = def.tag.clone();
            let compiled = CompiledType::compile(def)?;
            if types.insert(tag.clone(), compiled).is_some() {
                return schema_err!(DuplicateEntityType, tag);
            }
        }

        let mut category_keys = HashSet::new();
        for category in profile.categories.iter() {
            if !category_keys.insert(category.key.as_str()) {
                return schema_err!(DuplicateCategory, category.key.clone());
            }
            let Some(ty) = types.get(&category.entity_type) else {
                return schema_err!(
                    UnknownEntityType,
                    format!("category {} gathers {}", category.key, category.entity_type)
                );
            };
            if ty.get(&category.indicator).is_none() {
                return schema_err!(
                    UnknownIndicator,
                    format!(
                        "category {} sums {}.{}",
                        category.key, category.entity_type, category.indicator
                    )
                );
            }
        }

        for rule in profile.rules.iter() {
            if !category_keys.contains(rule.category_key.as_str()) {
                return schema_err!(UnknownCategory, rule.category_key.clone());
            }
        }

        Ok(Schema {
            key: profile.key,
            name: profile.name,
            types,
            categories: profile.categories,
            rules: profile.rules,
        })
    }

    pub fn entity_type(&self, tag: &str) -> Option<&CompiledType> {
        self.types.get(tag)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &CompiledType> {
        self.types.values()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn rules(&self) -> &[AggregationRule] {
        &self.rules
    }
}
