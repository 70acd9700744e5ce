// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Roll-ups: month → year per entity, year → category across the live
//! entities of one type, and categories → the signed, factor-weighted
//! grand total.
//!
//! Every function here only reads entity state.  Conversion factors are
//! applied in exactly one place, [`contribution`].

use std::collections::BTreeMap;

use tracing::warn;

use crate::common::{AggregationRule, EntityId, Sign};
use crate::entity::{Arena, EntityNode};
use crate::schema::{Category, Schema};

/// Sum of the twelve monthly values of `key` on `entity`.
pub fn yearly_total(entity: &EntityNode, key: &str) -> f64 {
    entity.yearly_total(key)
}

/// Sum of the yearly totals of `key` over `entities`.
pub fn category_total<'a, I>(entities: I, key: &str) -> f64
where
    I: IntoIterator<Item = &'a EntityNode>,
{
    entities.into_iter().map(|e| yearly_total(e, key)).sum()
}

/// Yearly total of every category of `schema` over the live entities.
pub fn category_totals(schema: &Schema, arena: &Arena) -> BTreeMap<String, f64> {
    schema
        .categories()
        .iter()
        .map(|c| (c.key.clone(), gather(c, arena.of_type(&c.entity_type))))
        .collect()
}

/// Category totals restricted to `root` and its descendants, e.g. the
/// subtotal of one production line.
pub fn subtree_category_totals(
    schema: &Schema,
    arena: &Arena,
    root: EntityId,
) -> BTreeMap<String, f64> {
    let members = arena.subtree(root);
    schema
        .categories()
        .iter()
        .map(|c| {
            let entities = arena
                .of_type(&c.entity_type)
                .filter(|e| members.contains(&e.id));
            (c.key.clone(), gather(c, entities))
        })
        .collect()
}

fn gather<'a, I>(category: &Category, entities: I) -> f64
where
    I: IntoIterator<Item = &'a EntityNode>,
{
    category_total(entities, &category.indicator)
}

/// How one rule contributed to the grand total.
#[derive(Clone, Debug, PartialEq)]
pub struct Contribution {
    pub category_key: String,
    /// The category total as summed from the entities.
    pub category_total: f64,
    pub conversion_factor: f64,
    pub sign: Sign,
    /// `sign × conversion_factor × category_total`, after clamping
    /// subtractive totals at zero.
    pub weighted: f64,
}

/// Weighs one category total by `rule`.
///
/// A subtractive category that sums to a negative value contributes
/// nothing: subtracting it would otherwise raise the total.
pub fn contribution(rule: &AggregationRule, category_total: f64) -> Contribution {
    let base = match rule.sign {
        Sign::Subtractive if category_total < 0.0 => {
            warn!(
                category = rule.category_key.as_str(),
                total = category_total,
                "negative subtractive category clamped to 0"
            );
            0.0
        }
        _ => category_total,
    };
    Contribution {
        category_key: rule.category_key.clone(),
        category_total,
        conversion_factor: rule.conversion_factor,
        sign: rule.sign,
        weighted: rule.sign.factor() * rule.conversion_factor * base,
    }
}

/// Per-rule contributions, in rule order.  Categories missing from
/// `category_totals` count as zero.
pub fn breakdown(
    category_totals: &BTreeMap<String, f64>,
    rules: &[AggregationRule],
) -> Vec<Contribution> {
    rules
        .iter()
        .map(|rule| {
            let total = category_totals
                .get(&rule.category_key)
                .copied()
                .unwrap_or(0.0);
            contribution(rule, total)
        })
        .collect()
}

/// `Σ sign × conversion_factor × category_total` over `rules`.
pub fn grand_total(category_totals: &BTreeMap<String, f64>, rules: &[AggregationRule]) -> f64 {
    breakdown(category_totals, rules)
        .iter()
        .map(|c| c.weighted)
        .sum()
}
