// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Read-only reference tables: templates entities are created from and
//! the equipment catalog.
//!
//! Tables are loaded once (from JSON, or the built-in catalog) and shared by
//! reference with every calculator; nothing in the engine mutates them.

use std::collections::BTreeMap;
use std::io::Read;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::common::{Result, canonicalize};
use crate::reference_err;

/// One entry of a reference table, e.g. a fuel with its calorific value
/// and carbon content, or a gas with its GWP.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub entity_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub factors: BTreeMap<String, f64>,
}

/// A selectable piece of equipment fixing one indicator of an entity, e.g.
/// a boiler type fixing the oxidation rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub entity_type: String,
    pub name: String,
    pub indicator: String,
    pub value: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TablesFile {
    #[serde(default)]
    templates: Vec<Template>,
    #[serde(default)]
    equipment: Vec<Equipment>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceTables {
    templates: BTreeMap<String, Template>,
    equipment: BTreeMap<String, Equipment>,
}

impl ReferenceTables {
    pub fn new(templates: Vec<Template>, equipment: Vec<Equipment>) -> Result<Self> {
        let mut tables = ReferenceTables::default();
        for mut template in templates.into_iter() {
            template.id = canonicalize(&template.id);
            template.entity_type = canonicalize(&template.entity_type);
            if template.id.is_empty() {
                return reference_err!(BadReferenceTables, "template with empty id".to_owned());
            }
            let id = template.id.clone();
            if tables.templates.insert(id.clone(), template).is_some() {
                return reference_err!(DuplicateTemplate, id);
            }
        }
        for mut item in equipment.into_iter() {
            item.id = canonicalize(&item.id);
            item.entity_type = canonicalize(&item.entity_type);
            if item.id.is_empty() {
                return reference_err!(BadReferenceTables, "equipment with empty id".to_owned());
            }
            let id = item.id.clone();
            if tables.equipment.insert(id.clone(), item).is_some() {
                return reference_err!(DuplicateEquipment, id);
            }
        }
        Ok(tables)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: TablesFile = serde_json::from_str(json)
            .or_else(|err| reference_err!(BadReferenceTables, err.to_string()))?;
        ReferenceTables::new(file.templates, file.equipment)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let file: TablesFile = serde_json::from_reader(reader)
            .or_else(|err| reference_err!(BadReferenceTables, err.to_string()))?;
        ReferenceTables::new(file.templates, file.equipment)
    }

    pub fn to_json(&self) -> String {
        let file = TablesFile {
            templates: self.templates.values().cloned().collect(),
            equipment: self.equipment.values().cloned().collect(),
        };
        // plain strings, maps and finite numbers always serialize
        serde_json::to_string_pretty(&file).unwrap_or_default()
    }

    /// The catalog shipped with the engine.
    pub fn builtin() -> &'static ReferenceTables {
        lazy_static! {
            static ref BUILTIN: ReferenceTables = builtin_tables();
        }
        &BUILTIN
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn equipment(&self, id: &str) -> Option<&Equipment> {
        self.equipment.get(id)
    }

    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn templates_for<'a>(&'a self, entity_type: &'a str) -> impl Iterator<Item = &'a Template> {
        self.templates
            .values()
            .filter(move |t| t.entity_type == entity_type)
    }

    pub fn equipment_for<'a>(
        &'a self,
        entity_type: &'a str,
    ) -> impl Iterator<Item = &'a Equipment> {
        self.equipment
            .values()
            .filter(move |e| e.entity_type == entity_type)
    }
}

fn template(id: &str, entity_type: &str, name: &str, factors: &[(&str, f64)]) -> Template {
    Template {
        id: id.to_owned(),
        entity_type: entity_type.to_owned(),
        name: name.to_owned(),
        factors: factors.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

fn boiler(id: &str, name: &str, oxidation_rate: f64) -> Equipment {
    Equipment {
        id: id.to_owned(),
        entity_type: "fuel-item".to_owned(),
        name: name.to_owned(),
        indicator: "oxidation_rate".to_owned(),
        value: oxidation_rate,
    }
}

fn builtin_tables() -> ReferenceTables {
    let templates = vec![
        template("production-line", "production-line", "Production line", &[]),
        // fuels: GJ/t (GJ/10^4 Nm3 for gases), tC/GJ
        template(
            "raw-coal",
            "fuel-item",
            "Raw coal",
            &[("net_calorific_value", 20.908), ("carbon_content", 0.02618)],
        ),
        template(
            "coke",
            "fuel-item",
            "Coke",
            &[("net_calorific_value", 28.435), ("carbon_content", 0.0295)],
        ),
        template(
            "diesel",
            "fuel-item",
            "Diesel",
            &[("net_calorific_value", 42.652), ("carbon_content", 0.0202)],
        ),
        template(
            "fuel-oil",
            "fuel-item",
            "Fuel oil",
            &[("net_calorific_value", 41.816), ("carbon_content", 0.0211)],
        ),
        template(
            "natural-gas",
            "fuel-item",
            "Natural gas",
            &[("net_calorific_value", 389.31), ("carbon_content", 0.01532)],
        ),
        // grid emission factors, tCO2/MWh
        template(
            "grid-national",
            "electricity",
            "National grid",
            &[("emission_factor", 0.5703)],
        ),
        template(
            "grid-north",
            "electricity",
            "North China grid",
            &[("emission_factor", 0.8843)],
        ),
        template(
            "grid-east",
            "electricity",
            "East China grid",
            &[("emission_factor", 0.7035)],
        ),
        // carbonates, tCO2/t
        template(
            "limestone",
            "carbonate-row",
            "Limestone (CaCO3)",
            &[("emission_factor", 0.4397)],
        ),
        template(
            "dolomite",
            "carbonate-row",
            "Dolomite (CaMg(CO3)2)",
            &[("emission_factor", 0.4773)],
        ),
        template(
            "magnesite",
            "carbonate-row",
            "Magnesite (MgCO3)",
            &[("emission_factor", 0.522)],
        ),
        template(
            "soda-ash",
            "carbonate-row",
            "Sodium carbonate (Na2CO3)",
            &[("emission_factor", 0.4149)],
        ),
        // densities, t/10^4 Nm3
        template(
            "co2-recovery",
            "co2-recovery",
            "Recovered CO2",
            &[("density", 19.77)],
        ),
        template(
            "coal-mine-methane",
            "ch4-source",
            "Coal mine methane",
            &[("density", 7.17)],
        ),
        // fluorinated gases, GWP
        template("hfc-23", "gas-product", "HFC-23", &[("gwp", 11700.0)]),
        template("sf6", "gas-product", "SF6", &[("gwp", 23900.0)]),
        template("cf4", "gas-product", "CF4", &[("gwp", 6500.0)]),
        template("c2f6", "gas-product", "C2F6", &[("gwp", 9200.0)]),
        // gas mixture components, g/mol
        template(
            "process-co2",
            "gas-mixture",
            "CO2 in process gas",
            &[("molar_mass", 44.01)],
        ),
        template(
            "process-co",
            "gas-mixture",
            "CO in process gas",
            &[("molar_mass", 28.01)],
        ),
        // kg CH4 / kg COD
        template(
            "industrial-wastewater",
            "wastewater-line",
            "Industrial wastewater",
            &[("bo", 0.25)],
        ),
        template("lime-mud", "carbonation-row", "Lime mud", &[]),
    ];

    let equipment = vec![
        boiler("pulverized-coal-boiler", "Pulverized coal boiler", 98.0),
        boiler("stoker-boiler", "Stoker boiler", 91.0),
        boiler("fluidized-bed-boiler", "Circulating fluidized bed boiler", 97.0),
        boiler("gas-burner", "Gas burner", 99.0),
        boiler("oil-burner", "Oil burner", 98.0),
    ];

    // the literal tables above have unique, non-empty ids
    ReferenceTables::new(templates, equipment).unwrap_or_default()
}
