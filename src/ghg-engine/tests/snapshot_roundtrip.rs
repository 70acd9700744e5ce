// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Tests for snapshot JSON roundtrips.
//!
//! These tests verify that:
//! 1. A restored calculator reproduces every value and total bit for bit
//! 2. The roundtrip is idempotent
//! 3. Arbitrary raw values survive the JSON text unchanged

use float_cmp::approx_eq;

use ghg_engine::{Calculator, EvidenceHandle, Month, ReferenceTables, Snapshot};

fn month(m: u32) -> Month {
    Month::new(m).unwrap()
}

fn chemical_plant() -> Calculator<'static> {
    let mut calc = Calculator::for_profile("chemical", ReferenceTables::builtin()).unwrap();
    let line = calc.add_child(None, "production-line").unwrap();

    let gas = calc.add_child(Some(line), "natural-gas").unwrap();
    let coal = calc.add_child(Some(line), "raw-coal").unwrap();
    calc.set_equipment(coal, "pulverized-coal-boiler").unwrap();
    let rock = calc.add_child(Some(line), "dolomite").unwrap();
    let custom = calc
        .add_custom_child(Some(line), "carbonate-row", "Slag", &[])
        .unwrap();
    let recovery = calc.add_child(None, "co2-recovery").unwrap();
    let mixture = calc.add_child(Some(line), "process-co").unwrap();

    for m in Month::all() {
        let n = m.number() as f64;
        calc.set_value(gas, "consumption", m, 3.5 * n).unwrap();
        calc.set_value(coal, "consumption", m, 120.0 + n).unwrap();
        calc.set_value(rock, "consumption", m, 40.0).unwrap();
        calc.set_value(rock, "purity", m, 90.0 + n / 2.0).unwrap();
        calc.set_value(custom, "consumption", m, 5.0).unwrap();
        calc.set_value(recovery, "external_supply_volume", m, n).unwrap();
        calc.set_value(recovery, "external_supply_concentration", m, 95.0)
            .unwrap();
        calc.set_value(mixture, "volume", m, 0.25 * n).unwrap();
        calc.set_value(mixture, "concentration", m, 12.5).unwrap();
    }
    calc.set_data_source(rock, "purity", month(3), "assay 2024-03")
        .unwrap();
    calc.set_evidence(
        rock,
        "purity",
        month(3),
        Some(EvidenceHandle("upload/8f3c".to_owned())),
    )
    .unwrap();
    calc
}

fn roundtrip(json: &str) -> (Calculator<'static>, String) {
    let snapshot = Snapshot::from_json(json).unwrap();
    let calc = Calculator::restore_builtin(ReferenceTables::builtin(), &snapshot).unwrap();
    let json = calc.snapshot().to_json();
    (calc, json)
}

#[test]
fn restored_calculator_matches_original() {
    let original = chemical_plant();
    let (restored, _) = roundtrip(&original.snapshot().to_json());

    assert_eq!(
        restored.grand_total().to_bits(),
        original.grand_total().to_bits()
    );
    assert_eq!(restored.category_totals(), original.category_totals());
    assert_eq!(
        restored.entities().count(),
        original.entities().count()
    );
    for entity in original.entities() {
        let other = restored.entity(entity.id).unwrap();
        assert_eq!(other.parent, entity.parent);
        assert_eq!(other.name, entity.name);
        assert_eq!(other.provenance, entity.provenance);
        assert_eq!(other.equipment, entity.equipment);
        assert_eq!(other.needs_factor, entity.needs_factor);
        for (key, series) in entity.indicators() {
            let other_series = other.series(key).unwrap();
            for (m, rec) in series.records() {
                let back = other_series.record(m);
                assert_eq!(
                    back.value.to_bits(),
                    rec.value.to_bits(),
                    "{} {key} {m}: {} != {}",
                    entity.id,
                    back.value,
                    rec.value
                );
                assert_eq!(back.data_source, rec.data_source);
                assert_eq!(back.evidence, rec.evidence);
            }
        }
    }
}

#[test]
fn roundtrip_is_idempotent() {
    let original = chemical_plant();
    let json = original.snapshot().to_json();
    let (_, first) = roundtrip(&json);
    let (_, second) = roundtrip(&first);
    assert_eq!(json, first);
    assert_eq!(first, second);
}

#[test]
fn raw_values_survive_json_exactly() {
    let mut calc = Calculator::for_profile("cement", ReferenceTables::builtin()).unwrap();
    let mut expected = vec![];
    // values with long decimal expansions, where fast float parsing is off by an ulp
    let mut x: u64 = 0x9e37_79b9_7f4a_7c15;
    for _ in 0..50 {
        let coal = calc.add_child(None, "coke").unwrap();
        for m in Month::all() {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            let v = (x >> 11) as f64 / (1u64 << 53) as f64 * 1e6;
            calc.set_value(coal, "consumption", m, v).unwrap();
            expected.push((coal, m, v));
        }
    }

    let (restored, _) = roundtrip(&calc.snapshot().to_json());
    for (id, m, v) in expected {
        let back = restored.value(id, "consumption", m).unwrap();
        assert_eq!(back.to_bits(), v.to_bits(), "{id} {m}: {back} != {v}");
    }
    assert_eq!(restored.grand_total().to_bits(), calc.grand_total().to_bits());
}

#[test]
fn custom_entities_keep_their_flags() {
    let original = chemical_plant();
    let json = original.snapshot().to_json();
    assert!(json.contains("\"needs_factor\""));
    assert!(json.contains("upload/8f3c"));

    let (restored, _) = roundtrip(&json);
    let flagged: Vec<_> = restored
        .entities_needing_factors()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(flagged, vec!["Slag"]);
}

#[test]
fn snapshot_json_has_no_functions() {
    let json = chemical_plant().snapshot().to_json();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let entities = value["entities"].as_array().unwrap();
    for entity in entities {
        for (_, series) in entity["series"].as_object().unwrap() {
            let values = series["values"].as_array().unwrap();
            assert_eq!(values.len(), 12);
            assert!(values.iter().all(|v| v.is_number()));
        }
    }
}

#[test]
fn handwritten_snapshot_restores() {
    let json = r#"{
        "industry": "cement",
        "entities": [
            {
                "id": 4,
                "entity_type": "carbonate-row",
                "name": "Limestone",
                "template_ref": "limestone",
                "constants": {"emission_factor": 0.4397},
                "series": {
                    "consumption": {"values": [1000, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]},
                    "purity": {"values": [95, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]}
                }
            }
        ]
    }"#;
    let (calc, _) = roundtrip(json);
    assert!(approx_eq!(f64, calc.grand_total(), 417.715, epsilon = 1e-9));
    let mut calc = calc;
    let next = calc.add_child(None, "limestone").unwrap();
    assert_eq!(next.0, 5);
}
