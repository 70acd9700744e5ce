// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! JSON interchange format for a calculator's entity tree.
//!
//! A snapshot holds plain data only: ids, parent links, provenance,
//! resolved factors, and each indicator's twelve values with their data
//! sources and evidence handles.  Restoring rebuilds the raw series and
//! recomputes every calculated indicator, so calculated values stored in
//! a snapshot are informational.

use std::collections::{BTreeMap, BTreeSet, HashSet};

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::calculator::{Calculator, blank_node, initial_value};
use crate::common::{EntityId, MONTHS, Month, Result, canonicalize};
use crate::entity::{EntityNode, Provenance};
use crate::profiles;
use crate::reference::ReferenceTables;
use crate::schema::Schema;
use crate::series::{EvidenceHandle, TimeSeries};
use crate::snapshot_err;

fn is_none<T>(val: &Option<T>) -> bool {
    val.is_none()
}

fn all_blank(sources: &[String]) -> bool {
    sources.iter().all(|s| s.is_empty())
}

fn all_none(evidence: &[Option<EvidenceHandle>]) -> bool {
    evidence.iter().all(|e| e.is_none())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SeriesRecord {
    /// Twelve monthly values, January first.
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "all_blank")]
    pub data_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "all_none")]
    pub evidence: Vec<Option<EvidenceHandle>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct EntityRecord {
    pub id: EntityId,
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "is_none")]
    pub parent_id: Option<EntityId>,
    pub name: String,
    /// Template the entity was created from; absent for custom entities.
    #[serde(default, skip_serializing_if = "is_none")]
    pub template_ref: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constants: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs_factor: Vec<String>,
    #[serde(default, skip_serializing_if = "is_none")]
    pub equipment: Option<String>,
    pub series: BTreeMap<String, SeriesRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Snapshot {
    /// Key of the industry profile the entities belong to.
    pub industry: String,
    /// Lowest id the restored calculator may hand out.  At `u32::MAX` the
    /// restored calculator can hold its entities but add no more.
    #[serde(default)]
    pub next_id: u32,
    pub entities: Vec<EntityRecord>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Snapshot> {
        serde_json::from_str(json).or_else(|err| snapshot_err!(BadSnapshot, err.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Generate the JSON Schema for the Snapshot type
#[cfg(feature = "schema")]
pub fn generate_schema() -> schemars::Schema {
    schemars::schema_for!(Snapshot)
}

/// Generate the JSON Schema as a formatted JSON string
#[cfg(feature = "schema")]
pub fn generate_schema_json() -> String {
    let schema = generate_schema();
    serde_json::to_string_pretty(&schema).expect("schema serialization should never fail")
}

impl From<&TimeSeries> for SeriesRecord {
    fn from(series: &TimeSeries) -> Self {
        SeriesRecord {
            values: series.values().to_vec(),
            data_sources: series.records().map(|(_, r)| r.data_source.clone()).collect(),
            evidence: series.records().map(|(_, r)| r.evidence.clone()).collect(),
        }
    }
}

impl From<&EntityNode> for EntityRecord {
    fn from(node: &EntityNode) -> Self {
        EntityRecord {
            id: node.id,
            entity_type: node.type_tag.clone(),
            parent_id: node.parent,
            name: node.name.clone(),
            template_ref: node.provenance.template_id().map(|id| id.to_owned()),
            constants: node.constants.clone(),
            needs_factor: node.needs_factor.iter().cloned().collect(),
            equipment: node.equipment.clone(),
            series: node
                .indicators()
                .map(|(key, series)| (key.to_owned(), SeriesRecord::from(series)))
                .collect(),
        }
    }
}

fn month_slots<T: Clone + Default>(
    entity: EntityId,
    key: &str,
    what: &str,
    slots: &[T],
) -> Result<Vec<T>> {
    match slots.len() {
        0 => Ok(vec![T::default(); MONTHS]),
        MONTHS => Ok(slots.to_vec()),
        n => snapshot_err!(
            BadSnapshot,
            format!("{entity} {key}: {n} {what}, expected {MONTHS}")
        ),
    }
}

impl<'r> Calculator<'r> {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            industry: self.schema().key.clone(),
            next_id: self.arena.next_id(),
            entities: self.entities().map(EntityRecord::from).collect(),
        }
    }

    /// Rebuilds a calculator for `schema` from `snapshot`.
    pub fn restore(
        schema: Schema,
        tables: &'r ReferenceTables,
        snapshot: &Snapshot,
    ) -> Result<Calculator<'r>> {
        if canonicalize(&snapshot.industry) != schema.key {
            return snapshot_err!(
                BadSnapshot,
                format!(
                    "snapshot of {} cannot restore into {}",
                    snapshot.industry, schema.key
                )
            );
        }

        let mut nodes = Vec::with_capacity(snapshot.entities.len());
        let mut ids = HashSet::new();
        for record in snapshot.entities.iter() {
            if record.id.0 == u32::MAX {
                return snapshot_err!(BadSnapshot, format!("entity id {} is out of range", record.id));
            }
            if !ids.insert(record.id) {
                return snapshot_err!(BadSnapshot, format!("duplicate entity {}", record.id));
            }
            nodes.push(restore_node(&schema, record)?);
        }

        let parents: BTreeMap<EntityId, Option<EntityId>> =
            nodes.iter().map(|n| (n.id, n.parent)).collect();
        for node in nodes.iter() {
            let mut seen = BTreeSet::new();
            let mut cursor = node.parent;
            while let Some(parent) = cursor {
                if !seen.insert(parent) || parent == node.id {
                    return snapshot_err!(BadSnapshot, format!("{} is its own ancestor", node.id));
                }
                match parents.get(&parent) {
                    Some(next) => cursor = *next,
                    None => {
                        return snapshot_err!(
                            BadSnapshot,
                            format!("{} has missing parent {}", node.id, parent)
                        );
                    }
                }
            }
        }

        let mut calc = Calculator::new(schema, tables);
        for node in nodes.into_iter() {
            calc.arena.insert(node);
        }
        calc.arena.reserve_ids(snapshot.next_id);
        calc.recompute_everything();
        Ok(calc)
    }

    /// Restores `snapshot` into the built-in profile it names.
    pub fn restore_builtin(
        tables: &'r ReferenceTables,
        snapshot: &Snapshot,
    ) -> Result<Calculator<'r>> {
        let schema = Schema::compile(profiles::builtin(&snapshot.industry)?)?;
        Calculator::restore(schema, tables, snapshot)
    }
}

fn restore_node(schema: &Schema, record: &EntityRecord) -> Result<EntityNode> {
    let Some(ty) = schema.entity_type(&canonicalize(&record.entity_type)) else {
        return snapshot_err!(
            BadSnapshot,
            format!("{} has unknown type {}", record.id, record.entity_type)
        );
    };

    let mut node = blank_node(ty, record.parent_id, &record.name);
    node.id = record.id;
    node.provenance = match &record.template_ref {
        Some(template_id) => Provenance::Fixed {
            template_id: template_id.clone(),
        },
        None => Provenance::Custom,
    };
    node.equipment = record.equipment.clone();
    node.needs_factor = record.needs_factor.iter().cloned().collect();

    for factor in ty.constant_factors() {
        let value = match record.constants.get(&factor.name) {
            Some(value) if value.is_finite() => *value,
            _ => {
                node.needs_factor.insert(factor.name.clone());
                0.0
            }
        };
        node.constants.insert(factor.name.clone(), value);
    }

    for (key, stored) in record.series.iter() {
        let Some(def) = ty.get(key) else {
            return snapshot_err!(
                BadSnapshot,
                format!("{} has unknown indicator {}", record.id, key)
            );
        };
        let values = month_slots(record.id, key, "values", &stored.values)?;
        let sources = month_slots(record.id, key, "data sources", &stored.data_sources)?;
        let evidence = month_slots(record.id, key, "evidence handles", &stored.evidence)?;
        let Some(series) = node.series.get_mut(key) else {
            continue;
        };
        for (i, month) in Month::all().enumerate() {
            let slot = series.record_mut(month);
            slot.value = if def.is_calculated() {
                initial_value(def)
            } else {
                def.domain.clamp(values[i])
            };
            slot.data_source = sources[i].clone();
            slot.evidence = evidence[i].clone();
        }
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::testutils::{fill, month, test_calculator};

    #[test]
    fn snapshot_has_twelve_values_per_indicator() {
        let mut calc = test_calculator("cement");
        let row = calc.add_child(None, "limestone").unwrap();
        fill(&mut calc, row, "consumption", 10.0);
        let snap = calc.snapshot();
        assert_eq!(snap.industry, "cement");
        assert_eq!(snap.next_id, 1);
        let entity = &snap.entities[0];
        assert_eq!(entity.template_ref.as_deref(), Some("limestone"));
        assert_eq!(entity.constants["emission_factor"], 0.4397);
        assert_eq!(entity.series["consumption"].values, vec![10.0; 12]);
        assert!(entity.series["consumption"].data_sources.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn calculated_values_are_recomputed_on_restore() {
        let mut calc = test_calculator("cement");
        let row = calc.add_child(None, "limestone").unwrap();
        calc.set_value(row, "consumption", month(1), 1000.0).unwrap();
        calc.set_value(row, "purity", month(1), 95.0).unwrap();

        let mut snap = calc.snapshot();
        snap.entities[0]
            .series
            .get_mut("emission")
            .unwrap()
            .values = vec![1e9; 12];

        let restored = Calculator::restore_builtin(calc.tables(), &snap).unwrap();
        assert_eq!(
            restored.value(row, "emission", month(1)).unwrap(),
            calc.value(row, "emission", month(1)).unwrap()
        );
        assert_eq!(restored.grand_total(), calc.grand_total());
    }

    #[test]
    fn short_series_are_rejected() {
        let mut calc = test_calculator("cement");
        calc.add_child(None, "limestone").unwrap();
        let mut snap = calc.snapshot();
        snap.entities[0]
            .series
            .get_mut("consumption")
            .unwrap()
            .values = vec![1.0; 11];
        let err = Calculator::restore_builtin(calc.tables(), &snap).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadSnapshot);
    }

    #[test]
    fn missing_parent_is_rejected() {
        let mut calc = test_calculator("cement");
        let line = calc.add_child(None, "production-line").unwrap();
        calc.add_child(Some(line), "limestone").unwrap();
        let mut snap = calc.snapshot();
        snap.entities.retain(|e| e.id != line);
        let err = Calculator::restore_builtin(calc.tables(), &snap).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadSnapshot);
    }

    #[test]
    fn wrong_industry_is_rejected() {
        let calc = test_calculator("cement");
        let snap = calc.snapshot();
        let schema = Schema::compile(profiles::builtin("chemical").unwrap()).unwrap();
        let err = Calculator::restore(schema, calc.tables(), &snap).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadSnapshot);
    }

    #[test]
    fn malformed_json_is_a_snapshot_error() {
        let err = Snapshot::from_json("{\"industry\": 1}").unwrap_err();
        assert_eq!(err.code, ErrorCode::BadSnapshot);
    }

    #[test]
    fn ids_stay_unique_after_restore() {
        let mut calc = test_calculator("cement");
        let a = calc.add_child(None, "limestone").unwrap();
        let b = calc.add_child(None, "dolomite").unwrap();
        calc.remove_child(b);
        let mut restored = Calculator::restore_builtin(calc.tables(), &calc.snapshot()).unwrap();
        let c = restored.add_child(None, "limestone").unwrap();
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn exhausted_ids_refuse_new_entities() {
        let mut calc = test_calculator("cement");
        let row = calc.add_child(None, "limestone").unwrap();
        fill(&mut calc, row, "consumption", 10.0);
        let mut snap = calc.snapshot();
        snap.next_id = u32::MAX;

        let mut restored = Calculator::restore_builtin(calc.tables(), &snap).unwrap();
        let total = restored.grand_total();
        for _ in 0..2 {
            let err = restored.add_child(None, "limestone").unwrap_err();
            assert_eq!(err.code, ErrorCode::IdsExhausted);
        }
        assert_eq!(restored.entities().count(), 1);
        assert_eq!(restored.entity(row).unwrap().name, "Limestone (CaCO3)");
        assert_eq!(restored.grand_total(), total);
    }

    #[test]
    fn out_of_range_entity_id_is_rejected() {
        let json = r#"{
            "industry": "cement",
            "entities": [
                {"id": 4294967295, "entity_type": "carbonate-row", "name": "Limestone", "series": {}}
            ]
        }"#;
        let snap = Snapshot::from_json(json).unwrap();
        let calc = test_calculator("cement");
        let err = Calculator::restore_builtin(calc.tables(), &snap).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadSnapshot);
    }

    #[test]
    fn industry_and_type_keys_are_canonicalized() {
        let mut calc = test_calculator("cement");
        let row = calc.add_child(None, "limestone").unwrap();
        fill(&mut calc, row, "consumption", 10.0);
        let mut snap = calc.snapshot();
        snap.industry = "Cement".to_owned();
        snap.entities[0].entity_type = " Carbonate-Row ".to_owned();

        let restored = Calculator::restore_builtin(calc.tables(), &snap).unwrap();
        assert_eq!(restored.industry(), "cement");
        assert_eq!(restored.entity(row).unwrap().type_tag, "carbonate-row");
        assert_eq!(restored.grand_total(), calc.grand_total());
    }
}
