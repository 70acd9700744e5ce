// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! One industry calculator: the entity arena of a compiled [`Schema`],
//! driven by edits.
//!
//! Every mutating call runs the same pass before it returns: recompute the
//! calculated indicators of the touched entity (for the edited month, or
//! all twelve), recompute the category and grand totals from the live
//! entities, then let the [`ChangeNotifier`] decide whether the consumer
//! hears about it.

use std::collections::{BTreeMap, BTreeSet};

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::aggregate::{self, Contribution};
use crate::common::{EntityId, Month, Result, canonicalize};
use crate::entity::{Arena, EntityNode, Provenance};
use crate::formula::Operand;
use crate::notify::ChangeNotifier;
use crate::numeric::coerce;
use crate::profiles;
use crate::reference::ReferenceTables;
use crate::schema::{CompiledType, FactorDef, FactorTarget, IndicatorDefinition, Schema};
use crate::series::{EvidenceHandle, TimeSeries};
use crate::{entity_err, reference_err};

#[derive(Debug)]
pub struct Calculator<'r> {
    schema: Schema,
    tables: &'r ReferenceTables,
    pub(crate) arena: Arena,
    notifier: ChangeNotifier,
    category_totals: BTreeMap<String, f64>,
    grand_total: f64,
}

impl<'r> Calculator<'r> {
    pub fn new(schema: Schema, tables: &'r ReferenceTables) -> Self {
        let mut calc = Calculator {
            schema,
            tables,
            arena: Arena::new(),
            notifier: ChangeNotifier::new(),
            category_totals: BTreeMap::new(),
            grand_total: 0.0,
        };
        calc.settle();
        calc
    }

    /// A calculator for one of the built-in industry profiles.
    pub fn for_profile(key: &str, tables: &'r ReferenceTables) -> Result<Self> {
        let schema = Schema::compile(profiles::builtin(key)?)?;
        Ok(Calculator::new(schema, tables))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn industry(&self) -> &str {
        &self.schema.key
    }

    pub fn tables(&self) -> &'r ReferenceTables {
        self.tables
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityNode> {
        self.arena.iter()
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityNode> {
        self.arena.get(id)
    }

    pub fn children(&self, id: EntityId) -> impl Iterator<Item = &EntityNode> {
        self.arena.children(id)
    }

    /// Entities with at least one factor that defaulted to zero.
    pub fn entities_needing_factors(&self) -> impl Iterator<Item = &EntityNode> {
        self.arena.iter().filter(|e| e.needs_factor())
    }

    /// Registers the consumer of grand-total changes.  The current total is
    /// delivered right away; afterwards only changes are.
    pub fn on_total_changed<F>(&mut self, callback: F)
    where
        F: FnMut(f64) + 'static,
    {
        self.notifier.attach(Box::new(callback));
        self.notifier.notify(self.grand_total);
    }

    pub fn detach(&mut self) {
        self.notifier.detach();
    }

    /// Adds an entity created from a reference-table template.
    pub fn add_child(&mut self, parent: Option<EntityId>, template_id: &str) -> Result<EntityId> {
        self.check_parent(parent)?;
        let tables = self.tables;
        let id = canonicalize(template_id);
        let Some(template) = tables.template(&id) else {
            return reference_err!(TemplateNotFound, template_id.to_owned());
        };
        let ty = self.entity_type(&template.entity_type)?;

        let mut node = blank_node(ty, parent, &template.name);
        node.provenance = Provenance::Fixed {
            template_id: template.id.clone(),
        };
        for factor in ty.def.factors.iter() {
            let value = match template.factors.get(&factor.name) {
                Some(value) if value.is_finite() => *value,
                _ => {
                    warn!(
                        template = template.id.as_str(),
                        factor = factor.name.as_str(),
                        "template lacks a factor, using 0"
                    );
                    node.needs_factor.insert(factor.name.clone());
                    0.0
                }
            };
            apply_factor(ty, &mut node, factor, value);
        }

        self.insert(node)
    }

    /// Adds an entity whose factors are supplied by the caller.  Declared
    /// factors missing from `constants` default to 0 and are flagged.
    pub fn add_custom_child(
        &mut self,
        parent: Option<EntityId>,
        type_tag: &str,
        name: &str,
        constants: &[(&str, f64)],
    ) -> Result<EntityId> {
        self.check_parent(parent)?;
        let ty = self.entity_type(type_tag)?;

        let mut node = blank_node(ty, parent, name);
        for factor in ty.def.factors.iter() {
            let supplied = constants
                .iter()
                .find(|(k, _)| *k == factor.name)
                .map(|(_, v)| *v)
                .filter(|v| v.is_finite());
            let value = match supplied {
                Some(value) => value,
                None => {
                    warn!(
                        entity_type = type_tag,
                        factor = factor.name.as_str(),
                        "custom entity needs a factor, using 0"
                    );
                    node.needs_factor.insert(factor.name.clone());
                    0.0
                }
            };
            apply_factor(ty, &mut node, factor, value);
        }
        for (k, _) in constants.iter() {
            if !ty.def.factors.iter().any(|f| f.name == *k) {
                debug!(entity_type = type_tag, factor = *k, "ignoring undeclared factor");
            }
        }

        self.insert(node)
    }

    /// Removes `id` and its descendants.  Returns whether anything was
    /// removed; removing an absent id is a no-op.
    pub fn remove_child(&mut self, id: EntityId) -> bool {
        let removed = self.arena.remove_subtree(id);
        if removed.is_empty() {
            return false;
        }
        debug!(entity = %id, removed = removed.len(), "removed entity subtree");
        self.settle();
        true
    }

    /// Overwrites the equipment's indicator in all twelve months.
    pub fn set_equipment(&mut self, id: EntityId, equipment_id: &str) -> Result<()> {
        let tables = self.tables;
        let key = canonicalize(equipment_id);
        let Some(equipment) = tables.equipment(&key) else {
            return reference_err!(UnknownEquipment, equipment_id.to_owned());
        };
        let Some(node) = self.arena.get_mut(id) else {
            return entity_err!(UnknownEntity, id.to_string());
        };
        let Some(ty) = self.schema.entity_type(&node.type_tag) else {
            return entity_err!(UnknownEntityType, node.type_tag.clone());
        };
        if equipment.entity_type != node.type_tag
            || ty.def.equipment_indicator.as_deref() != Some(equipment.indicator.as_str())
        {
            return entity_err!(
                EquipmentMismatch,
                format!("{} does not fit {} {}", equipment.id, node.type_tag, id)
            );
        }

        let domain = ty.get(&equipment.indicator).map(|d| d.domain).unwrap_or_default();
        if let Some(series) = node.series.get_mut(&equipment.indicator) {
            series.fill(domain.clamp(equipment.value));
        }
        node.equipment = Some(equipment.id.clone());
        recompute_all(ty, node);
        self.settle();
        Ok(())
    }

    /// Sets a factor on an existing entity, clearing its "needs factor"
    /// flag.  Series factors are written to all twelve months.
    pub fn set_factor(&mut self, id: EntityId, name: &str, value: f64) -> Result<()> {
        let Some(node) = self.arena.get_mut(id) else {
            return entity_err!(UnknownEntity, id.to_string());
        };
        let Some(ty) = self.schema.entity_type(&node.type_tag) else {
            return entity_err!(UnknownEntityType, node.type_tag.clone());
        };
        let Some(factor) = ty.def.factors.iter().find(|f| f.name == name) else {
            return entity_err!(UnknownOperand, format!("{}.{}", node.type_tag, name));
        };
        apply_factor(ty, node, factor, value);
        node.needs_factor.remove(name);
        recompute_all(ty, node);
        self.settle();
        Ok(())
    }

    /// Stores a raw value, clamped into the indicator's domain.  Returns
    /// whether the stored value changed.
    pub fn set_value(&mut self, id: EntityId, key: &str, month: Month, value: f64) -> Result<bool> {
        let (ty, node) = self.raw_slot(id, key)?;
        let domain = ty.get(key).map(|d| d.domain).unwrap_or_default();
        let value = domain.clamp(value);
        let changed = node
            .series
            .get_mut(key)
            .map(|s| s.set(month, value))
            .unwrap_or(false);
        if !changed {
            return Ok(false);
        }
        let recomputed = recompute_month(ty, node, month);
        debug!(entity = %id, indicator = key, %month, recomputed, "settled edit");
        self.settle();
        Ok(true)
    }

    /// Like [`Calculator::set_value`], for text straight from an input
    /// field.
    pub fn set_text(&mut self, id: EntityId, key: &str, month: Month, text: &str) -> Result<bool> {
        self.set_value(id, key, month, coerce(text))
    }

    pub fn set_data_source(
        &mut self,
        id: EntityId,
        key: &str,
        month: Month,
        data_source: &str,
    ) -> Result<()> {
        let series = self.series_mut(id, key)?;
        series.record_mut(month).data_source = data_source.to_owned();
        Ok(())
    }

    pub fn set_evidence(
        &mut self,
        id: EntityId,
        key: &str,
        month: Month,
        evidence: Option<EvidenceHandle>,
    ) -> Result<()> {
        let series = self.series_mut(id, key)?;
        series.record_mut(month).evidence = evidence;
        Ok(())
    }

    pub fn value(&self, id: EntityId, key: &str, month: Month) -> Result<f64> {
        Ok(self.series(id, key)?.get(month))
    }

    pub fn series(&self, id: EntityId, key: &str) -> Result<&TimeSeries> {
        let Some(node) = self.arena.get(id) else {
            return entity_err!(UnknownEntity, id.to_string());
        };
        match node.series(key) {
            Some(series) => Ok(series),
            None => entity_err!(UnknownIndicator, format!("{}.{}", node.type_tag, key)),
        }
    }

    pub fn yearly_total(&self, id: EntityId, key: &str) -> Result<f64> {
        Ok(self.series(id, key)?.yearly_total())
    }

    pub fn category_total(&self, category: &str) -> Result<f64> {
        match self.category_totals.get(category) {
            Some(total) => Ok(*total),
            None => crate::schema_err!(UnknownCategory, category.to_owned()),
        }
    }

    pub fn category_totals(&self) -> &BTreeMap<String, f64> {
        &self.category_totals
    }

    /// Category totals over `root` and its descendants.
    pub fn subtree_category_totals(&self, root: EntityId) -> Result<BTreeMap<String, f64>> {
        if !self.arena.contains(root) {
            return entity_err!(UnknownEntity, root.to_string());
        }
        Ok(aggregate::subtree_category_totals(
            &self.schema,
            &self.arena,
            root,
        ))
    }

    pub fn breakdown(&self) -> Vec<Contribution> {
        aggregate::breakdown(&self.category_totals, self.schema.rules())
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }

    /// Recomputes every calculated value of every entity, then settles.
    pub(crate) fn recompute_everything(&mut self) {
        let ids: Vec<EntityId> = self.arena.iter().map(|e| e.id).collect();
        for id in ids {
            let Some(node) = self.arena.get_mut(id) else {
                continue;
            };
            if let Some(ty) = self.schema.entity_type(&node.type_tag) {
                recompute_all(ty, node);
            }
        }
        self.settle();
    }

    /// Recomputes the category and grand totals and notifies.
    fn settle(&mut self) {
        self.category_totals = aggregate::category_totals(&self.schema, &self.arena);
        self.grand_total = aggregate::grand_total(&self.category_totals, self.schema.rules());
        debug!(
            industry = self.schema.key.as_str(),
            total = self.grand_total,
            "settled totals"
        );
        self.notifier.notify(self.grand_total);
    }

    fn insert(&mut self, mut node: EntityNode) -> Result<EntityId> {
        let id = self.arena.allocate()?;
        node.id = id;
        if let Some(ty) = self.schema.entity_type(&node.type_tag) {
            recompute_all(ty, &mut node);
        }
        debug!(entity = %id, entity_type = node.type_tag.as_str(), "added entity");
        self.arena.insert(node);
        self.settle();
        Ok(id)
    }

    fn check_parent(&self, parent: Option<EntityId>) -> Result<()> {
        match parent {
            Some(id) if !self.arena.contains(id) => {
                entity_err!(UnknownEntity, format!("parent {id}"))
            }
            _ => Ok(()),
        }
    }

    fn entity_type(&self, tag: &str) -> Result<&CompiledType> {
        match self.schema.entity_type(&canonicalize(tag)) {
            Some(ty) => Ok(ty),
            None => entity_err!(
                UnknownEntityType,
                format!("{} in {}", tag, self.schema.key)
            ),
        }
    }

    fn raw_slot(&mut self, id: EntityId, key: &str) -> Result<(&CompiledType, &mut EntityNode)> {
        let Some(node) = self.arena.get_mut(id) else {
            return entity_err!(UnknownEntity, id.to_string());
        };
        let Some(ty) = self.schema.entity_type(&node.type_tag) else {
            return entity_err!(UnknownEntityType, node.type_tag.clone());
        };
        match ty.get(key) {
            None => entity_err!(UnknownIndicator, format!("{}.{}", node.type_tag, key)),
            Some(def) if def.is_calculated() => {
                entity_err!(CalculatedIndicator, format!("{}.{}", node.type_tag, key))
            }
            Some(_) => Ok((ty, node)),
        }
    }

    fn series_mut(&mut self, id: EntityId, key: &str) -> Result<&mut TimeSeries> {
        let Some(node) = self.arena.get_mut(id) else {
            return entity_err!(UnknownEntity, id.to_string());
        };
        let type_tag = &node.type_tag;
        match node.series.get_mut(key) {
            Some(series) => Ok(series),
            None => entity_err!(UnknownIndicator, format!("{type_tag}.{key}")),
        }
    }
}

/// Initial value of an indicator on a fresh entity.
pub(crate) fn initial_value(def: &IndicatorDefinition) -> f64 {
    match def.default_value {
        Some(value) if !def.is_calculated() => def.domain.clamp(value),
        _ => 0.0,
    }
}

/// A custom node of type `ty` with every indicator at its initial value.
pub(crate) fn blank_node(ty: &CompiledType, parent: Option<EntityId>, name: &str) -> EntityNode {
    EntityNode {
        id: EntityId(0),
        type_tag: ty.tag().to_owned(),
        name: name.to_owned(),
        parent,
        provenance: Provenance::Custom,
        constants: BTreeMap::new(),
        needs_factor: BTreeSet::new(),
        equipment: None,
        series: ty
            .indicators()
            .iter()
            .map(|def| (def.key.clone(), TimeSeries::filled(initial_value(def))))
            .collect(),
    }
}

pub(crate) fn apply_factor(ty: &CompiledType, node: &mut EntityNode, factor: &FactorDef, value: f64) {
    match &factor.target {
        FactorTarget::Constant => {
            node.constants.insert(factor.name.clone(), value);
        }
        FactorTarget::Series(key) => {
            let domain = ty.get(key).map(|d| d.domain).unwrap_or_default();
            if let Some(series) = node.series.get_mut(key) {
                series.fill(domain.clamp(value));
            }
        }
    }
}

/// Recomputes the calculated indicators of `node` for `month`, in
/// dependency order.  Only values that differ are stored; returns how many
/// were.
pub(crate) fn recompute_month(ty: &CompiledType, node: &mut EntityNode, month: Month) -> usize {
    let mut changed = 0;
    for def in ty.calculated() {
        let Some(formula) = &def.formula else {
            continue;
        };
        let args: SmallVec<[f64; 6]> = formula
            .operands()
            .iter()
            .map(|operand| match operand {
                Operand::Indicator(key) => {
                    let domain = ty.get(key).map(|d| d.domain).unwrap_or_default();
                    domain.as_operand(node.value(key, month))
                }
                Operand::Constant(name) => node.constant(name),
            })
            .collect();
        let value = def.domain.clamp(formula.evaluate(&args));
        if let Some(series) = node.series.get_mut(&def.key) {
            if series.set(month, value) {
                changed += 1;
            }
        }
    }
    changed
}

pub(crate) fn recompute_all(ty: &CompiledType, node: &mut EntityNode) -> usize {
    Month::all().map(|m| recompute_month(ty, node, m)).sum()
}
