// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Built-in industry profiles.
//!
//! Entity types are shared between industries; a profile picks the types
//! it tracks, groups them into categories and weighs the categories into
//! the industry's grand total.

use crate::common::{AggregationRule, Result, canonicalize};
use crate::formula::{CO2_PER_C, CO2_PER_CH4, families};
use crate::numeric::Domain;
use crate::schema::{Category, EntityType, FactorDef, IndicatorDefinition, Profile};
use crate::schema_err;

/// GWP of methane used by the industry guidelines.
pub const CH4_GWP: f64 = 21.0;

const KEYS: &[&str] = &[
    "cement",
    "chemical",
    "coal-mining",
    "fluorochemical",
    "pulp-paper",
];

pub fn keys() -> &'static [&'static str] {
    KEYS
}

pub fn builtin(key: &str) -> Result<Profile> {
    match canonicalize(key).as_str() {
        "cement" => Ok(cement()),
        "chemical" => Ok(chemical()),
        "coal-mining" => Ok(coal_mining()),
        "fluorochemical" => Ok(fluorochemical()),
        "pulp-paper" => Ok(pulp_paper()),
        _ => schema_err!(UnknownProfile, key.to_owned()),
    }
}

pub fn all() -> Vec<Profile> {
    vec![
        cement(),
        chemical(),
        coal_mining(),
        fluorochemical(),
        pulp_paper(),
    ]
}

fn raw(key: &str, unit: &str) -> IndicatorDefinition {
    IndicatorDefinition::raw(key, unit)
}

fn percent(key: &str) -> IndicatorDefinition {
    IndicatorDefinition::raw(key, "%").with_domain(Domain::Percent)
}

fn fraction(key: &str) -> IndicatorDefinition {
    IndicatorDefinition::raw(key, "1")
        .with_domain(Domain::Fraction)
        .with_decimals(4)
}

fn production_line() -> EntityType {
    EntityType::new("production-line", "Production line").indicator(raw("output", "t"))
}

fn fuel_item() -> EntityType {
    EntityType::new("fuel-item", "Fuel")
        .indicator(raw("consumption", "t"))
        .indicator(raw("net_calorific_value", "GJ/t").with_decimals(3))
        .indicator(raw("carbon_content", "tC/GJ").with_decimals(5))
        .indicator(percent("oxidation_rate").with_default(100.0))
        .indicator(IndicatorDefinition::calculated(
            "carbon_emitted",
            "tC",
            families::product(
                &[
                    "consumption",
                    "net_calorific_value",
                    "carbon_content",
                    "oxidation_rate",
                ],
                &[],
            ),
        ))
        .factor(FactorDef::series("net_calorific_value", "GJ/t"))
        .factor(FactorDef::series("carbon_content", "tC/GJ"))
        .equipment("oxidation_rate")
}

fn electricity() -> EntityType {
    EntityType::new("electricity", "Electricity")
        .indicator(raw("purchased", "MWh"))
        .indicator(raw("exported", "MWh"))
        .indicator(IndicatorDefinition::calculated(
            "purchased_emission",
            "tCO2",
            families::product(&["purchased"], &["emission_factor"]),
        ))
        .indicator(IndicatorDefinition::calculated(
            "exported_emission",
            "tCO2",
            families::product(&["exported"], &["emission_factor"]),
        ))
        .factor(FactorDef::constant("emission_factor", "tCO2/MWh"))
}

fn carbonate_row() -> EntityType {
    EntityType::new("carbonate-row", "Carbonate")
        .indicator(raw("consumption", "t"))
        .indicator(percent("purity"))
        .indicator(IndicatorDefinition::calculated(
            "emission",
            "tCO2",
            families::product(&["consumption", "purity"], &["emission_factor"]),
        ))
        .factor(FactorDef::constant("emission_factor", "tCO2/t"))
}

fn co2_recovery() -> EntityType {
    EntityType::new("co2-recovery", "CO2 recovery")
        .indicator(raw("external_supply_volume", "10^4 Nm3"))
        .indicator(percent("external_supply_concentration"))
        .indicator(raw("raw_material_volume", "10^4 Nm3"))
        .indicator(percent("raw_material_concentration"))
        .indicator(IndicatorDefinition::calculated(
            "recovered",
            "tCO2",
            families::co2_recovery(
                "external_supply_volume",
                "external_supply_concentration",
                "raw_material_volume",
                "raw_material_concentration",
                "density",
            ),
        ))
        .factor(FactorDef::constant("density", "t/10^4 Nm3"))
}

fn ch4_source() -> EntityType {
    EntityType::new("ch4-source", "Methane source")
        .indicator(raw("drained_volume", "10^4 Nm3"))
        .indicator(raw("ventilation_volume", "10^4 Nm3"))
        .indicator(raw("recovered_volume", "10^4 Nm3"))
        .indicator(raw("flared_volume", "10^4 Nm3"))
        .indicator(percent("flare_efficiency").with_default(98.0))
        .indicator(IndicatorDefinition::calculated(
            "emitted",
            "tCH4",
            families::sum_times("drained_volume", "ventilation_volume", "density"),
        ))
        .indicator(IndicatorDefinition::calculated(
            "recovered",
            "tCH4",
            families::product(&["recovered_volume"], &["density"]),
        ))
        .indicator(IndicatorDefinition::calculated(
            "flared",
            "tCH4",
            families::product(&["flared_volume", "flare_efficiency"], &["density"]),
        ))
        .factor(FactorDef::constant("density", "t/10^4 Nm3"))
}

fn gas_product() -> EntityType {
    EntityType::new("gas-product", "Fluorinated gas")
        .indicator(raw("generated", "t").with_decimals(3))
        .indicator(raw("destroyed", "t").with_decimals(3))
        .indicator(
            IndicatorDefinition::calculated(
                "escaped",
                "t",
                families::escaped("generated", "destroyed"),
            )
            .with_decimals(3),
        )
        .indicator(IndicatorDefinition::calculated(
            "co2e",
            "tCO2e",
            families::product(&["escaped"], &["gwp"]),
        ))
        .indicator(
            IndicatorDefinition::calculated(
                "destruction_rate",
                "%",
                families::percent_ratio("destroyed", "generated"),
            )
            .with_decimals(1),
        )
        .factor(FactorDef::constant("gwp", "tCO2e/t"))
}

fn gas_mixture() -> EntityType {
    EntityType::new("gas-mixture", "Process gas component")
        .indicator(raw("volume", "10^4 Nm3"))
        .indicator(percent("concentration"))
        .indicator(IndicatorDefinition::calculated(
            "mass",
            "t",
            families::gas_mass("volume", "concentration", "molar_mass"),
        ))
        .factor(FactorDef::constant("molar_mass", "g/mol"))
}

fn wastewater_line() -> EntityType {
    EntityType::new("wastewater-line", "Wastewater treatment")
        .indicator(raw("cod_removed", "kg"))
        .indicator(raw("sludge_cod", "kg"))
        .indicator(fraction("mcf"))
        .indicator(raw("recovered_ch4", "t"))
        .indicator(IndicatorDefinition::calculated(
            "ch4",
            "tCH4",
            families::wastewater_ch4("cod_removed", "sludge_cod", "mcf", "recovered_ch4", "bo"),
        ))
        .factor(FactorDef::constant("bo", "kgCH4/kgCOD"))
}

fn carbonation_row() -> EntityType {
    EntityType::new("carbonation-row", "Carbonation")
        .indicator(raw("mass", "t"))
        .indicator(fraction("cao_before"))
        .indicator(fraction("cao_after"))
        .indicator(IndicatorDefinition::calculated(
            "absorbed",
            "tCO2",
            families::carbonation_absorption("mass", "cao_before", "cao_after"),
        ))
}

fn fuel_combustion() -> Category {
    Category::new(
        "fuel_combustion",
        "Fuel combustion",
        "fuel-item",
        "carbon_emitted",
    )
}

fn purchased_electricity() -> Category {
    Category::new(
        "purchased_electricity",
        "Purchased electricity",
        "electricity",
        "purchased_emission",
    )
}

fn carbonate_process() -> Category {
    Category::new("carbonate", "Carbonate use", "carbonate-row", "emission")
}

fn cement() -> Profile {
    Profile {
        key: "cement".to_owned(),
        name: "Cement".to_owned(),
        entity_types: vec![production_line(), fuel_item(), carbonate_row(), electricity()],
        categories: vec![
            fuel_combustion(),
            carbonate_process(),
            purchased_electricity(),
            Category::new(
                "exported_electricity",
                "Exported electricity",
                "electricity",
                "exported_emission",
            ),
        ],
        rules: vec![
            AggregationRule::additive("fuel_combustion", CO2_PER_C),
            AggregationRule::additive("carbonate", 1.0),
            AggregationRule::additive("purchased_electricity", 1.0),
            AggregationRule::subtractive("exported_electricity", 1.0),
        ],
    }
}

fn chemical() -> Profile {
    Profile {
        key: "chemical".to_owned(),
        name: "Chemical".to_owned(),
        entity_types: vec![
            production_line(),
            fuel_item(),
            carbonate_row(),
            gas_mixture(),
            co2_recovery(),
            electricity(),
        ],
        categories: vec![
            fuel_combustion(),
            carbonate_process(),
            Category::new("process_gas", "Process gas CO2", "gas-mixture", "mass"),
            Category::new("co2_recovered", "CO2 recovered", "co2-recovery", "recovered"),
            purchased_electricity(),
        ],
        rules: vec![
            AggregationRule::additive("fuel_combustion", CO2_PER_C),
            AggregationRule::additive("carbonate", 1.0),
            AggregationRule::additive("process_gas", 1.0),
            AggregationRule::subtractive("co2_recovered", 1.0),
            AggregationRule::additive("purchased_electricity", 1.0),
        ],
    }
}

fn coal_mining() -> Profile {
    Profile {
        key: "coal-mining".to_owned(),
        name: "Coal mining".to_owned(),
        entity_types: vec![production_line(), fuel_item(), ch4_source(), electricity()],
        categories: vec![
            fuel_combustion(),
            Category::new("ch4_emitted", "CH4 emitted", "ch4-source", "emitted"),
            Category::new("ch4_recovered", "CH4 recovered", "ch4-source", "recovered"),
            Category::new("ch4_flared", "CH4 flared", "ch4-source", "flared"),
            purchased_electricity(),
        ],
        rules: vec![
            AggregationRule::additive("fuel_combustion", CO2_PER_C),
            AggregationRule::additive("ch4_emitted", CH4_GWP),
            AggregationRule::subtractive("ch4_recovered", CH4_GWP),
            AggregationRule::subtractive("ch4_flared", CH4_GWP),
            // flared methane leaves the flare as CO2
            AggregationRule::additive("ch4_flared", CO2_PER_CH4),
            AggregationRule::additive("purchased_electricity", 1.0),
        ],
    }
}

fn fluorochemical() -> Profile {
    Profile {
        key: "fluorochemical".to_owned(),
        name: "Fluorochemical".to_owned(),
        entity_types: vec![production_line(), fuel_item(), gas_product(), electricity()],
        categories: vec![
            fuel_combustion(),
            Category::new("fluorinated_gases", "Fluorinated gases", "gas-product", "co2e"),
            purchased_electricity(),
        ],
        rules: vec![
            AggregationRule::additive("fuel_combustion", CO2_PER_C),
            AggregationRule::additive("fluorinated_gases", 1.0),
            AggregationRule::additive("purchased_electricity", 1.0),
        ],
    }
}

fn pulp_paper() -> Profile {
    Profile {
        key: "pulp-paper".to_owned(),
        name: "Pulp and paper".to_owned(),
        entity_types: vec![
            production_line(),
            fuel_item(),
            wastewater_line(),
            carbonation_row(),
            electricity(),
        ],
        categories: vec![
            fuel_combustion(),
            Category::new("wastewater_ch4", "Wastewater CH4", "wastewater-line", "ch4"),
            Category::new(
                "lime_mud_absorption",
                "Lime mud carbonation",
                "carbonation-row",
                "absorbed",
            ),
            purchased_electricity(),
        ],
        rules: vec![
            AggregationRule::additive("fuel_combustion", CO2_PER_C),
            AggregationRule::additive("wastewater_ch4", CH4_GWP),
            AggregationRule::subtractive("lime_mud_absorption", 1.0),
            AggregationRule::additive("purchased_electricity", 1.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::reference::ReferenceTables;
    use crate::schema::Schema;

    #[test]
    fn every_profile_compiles() {
        for profile in all() {
            let key = profile.key.clone();
            let schema = Schema::compile(profile).unwrap_or_else(|err| panic!("{key}: {err}"));
            assert_eq!(schema.key, key);
            assert!(!schema.rules().is_empty());
        }
        assert_eq!(all().len(), keys().len());
    }

    #[test]
    fn profiles_are_found_by_key() {
        for key in keys() {
            assert_eq!(builtin(key).unwrap().key, *key);
        }
        assert_eq!(builtin("Cement").unwrap().key, "cement");
        let err = builtin("steel").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownProfile);
    }

    #[test]
    fn builtin_templates_fit_some_entity_type() {
        let types: Vec<String> = all()
            .into_iter()
            .flat_map(|p| p.entity_types.into_iter().map(|t| t.tag))
            .collect();
        for template in ReferenceTables::builtin().templates() {
            assert!(
                types.contains(&template.entity_type),
                "{} has no entity type",
                template.id
            );
        }
    }

    #[test]
    fn builtin_templates_carry_declared_factors() {
        for profile in all() {
            for ty in profile.entity_types.iter() {
                for template in ReferenceTables::builtin().templates_for(&ty.tag) {
                    for factor in ty.factors.iter() {
                        assert!(
                            template.factors.contains_key(&factor.name),
                            "{} lacks {}",
                            template.id,
                            factor.name
                        );
                    }
                }
            }
        }
    }
}
