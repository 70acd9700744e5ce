// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeMap, BTreeSet};

use crate::common::{EntityId, Month, Result};
use crate::entity_err;
use crate::series::TimeSeries;

/// How an entity got its factors, resolved once at creation.
#[derive(Clone, Debug, PartialEq)]
pub enum Provenance {
    Fixed { template_id: String },
    Custom,
}

impl Provenance {
    pub fn template_id(&self) -> Option<&str> {
        match self {
            Provenance::Fixed { template_id } => Some(template_id),
            Provenance::Custom => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Provenance::Custom)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EntityNode {
    pub id: EntityId,
    pub type_tag: String,
    pub name: String,
    pub parent: Option<EntityId>,
    pub provenance: Provenance,
    /// Resolved constant factors (GWP, density, ...).
    pub constants: BTreeMap<String, f64>,
    /// Factors that were missing at creation and defaulted to zero.
    pub needs_factor: BTreeSet<String>,
    pub equipment: Option<String>,
    pub(crate) series: BTreeMap<String, TimeSeries>,
}

impl EntityNode {
    pub fn series(&self, key: &str) -> Option<&TimeSeries> {
        self.series.get(key)
    }

    pub fn indicators(&self) -> impl Iterator<Item = (&str, &TimeSeries)> {
        self.series.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// Value of `key` in `month`; an indicator the entity does not carry
    /// reads as zero.
    pub fn value(&self, key: &str, month: Month) -> f64 {
        self.series.get(key).map(|s| s.get(month)).unwrap_or(0.0)
    }

    pub fn yearly_total(&self, key: &str) -> f64 {
        self.series.get(key).map(|s| s.yearly_total()).unwrap_or(0.0)
    }

    pub fn constant(&self, name: &str) -> f64 {
        self.constants.get(name).copied().unwrap_or(0.0)
    }

    pub fn needs_factor(&self) -> bool {
        !self.needs_factor.is_empty()
    }
}

/// Arena of live entities keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Arena {
    nodes: BTreeMap<EntityId, EntityNode>,
    next_id: u32,
}

impl Arena {
    pub fn new() -> Self {
        Default::default()
    }

    pub(crate) fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Hands out the next id.  `u32::MAX` is never handed out, so the
    /// counter cannot wrap onto a live entity.
    pub(crate) fn allocate(&mut self) -> Result<EntityId> {
        let Some(next_id) = self.next_id.checked_add(1) else {
            return entity_err!(IdsExhausted, format!("no id after {}", self.next_id));
        };
        let id = EntityId(self.next_id);
        self.next_id = next_id;
        Ok(id)
    }

    /// Inserts a node under its own id, keeping future ids above it.
    pub(crate) fn insert(&mut self, node: EntityNode) {
        self.next_id = self.next_id.max(node.id.0.saturating_add(1));
        self.nodes.insert(node.id, node);
    }

    pub(crate) fn reserve_ids(&mut self, next_id: u32) {
        self.next_id = self.next_id.max(next_id);
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityNode> {
        self.nodes.values()
    }

    pub fn of_type<'a>(&'a self, type_tag: &'a str) -> impl Iterator<Item = &'a EntityNode> {
        self.nodes.values().filter(move |n| n.type_tag == type_tag)
    }

    pub fn children(&self, parent: EntityId) -> impl Iterator<Item = &EntityNode> {
        self.nodes
            .values()
            .filter(move |n| n.parent == Some(parent))
    }

    /// `root` and every live descendant of it.
    pub fn subtree(&self, root: EntityId) -> BTreeSet<EntityId> {
        let mut members = BTreeSet::new();
        if !self.contains(root) {
            return members;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if members.insert(id) {
                stack.extend(self.children(id).map(|n| n.id));
            }
        }
        members
    }

    /// Removes `id` and its descendants, returning the removed ids.
    /// Removing an absent id removes nothing.
    pub(crate) fn remove_subtree(&mut self, id: EntityId) -> BTreeSet<EntityId> {
        let removed = self.subtree(id);
        for id in removed.iter() {
            self.nodes.remove(id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(arena: &mut Arena, parent: Option<EntityId>) -> EntityId {
        let id = arena.allocate().unwrap();
        arena.insert(EntityNode {
            id,
            type_tag: "fuel-item".to_owned(),
            name: format!("node {}", id.0),
            parent,
            provenance: Provenance::Custom,
            constants: BTreeMap::new(),
            needs_factor: BTreeSet::new(),
            equipment: None,
            series: BTreeMap::new(),
        });
        id
    }

    #[test]
    fn subtree_removal_is_idempotent() {
        let mut arena = Arena::new();
        let line = node(&mut arena, None);
        let a = node(&mut arena, Some(line));
        let b = node(&mut arena, Some(a));
        let other = node(&mut arena, None);

        assert_eq!(arena.subtree(line).len(), 3);
        let removed = arena.remove_subtree(line);
        assert!(removed.contains(&a) && removed.contains(&b));
        assert_eq!(arena.len(), 1);
        assert!(arena.contains(other));

        assert!(arena.remove_subtree(line).is_empty());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut arena = Arena::new();
        let a = node(&mut arena, None);
        arena.remove_subtree(a);
        let b = node(&mut arena, None);
        assert_ne!(a, b);
        assert_eq!(arena.next_id(), 2);
    }

    #[test]
    fn allocation_stops_before_wrapping() {
        let mut arena = Arena::new();
        let first = node(&mut arena, None);
        arena.reserve_ids(u32::MAX - 1);
        assert_eq!(arena.allocate().unwrap(), EntityId(u32::MAX - 1));
        let err = arena.allocate().unwrap_err();
        assert_eq!(err.code, crate::common::ErrorCode::IdsExhausted);
        assert_eq!(arena.next_id(), u32::MAX);
        assert!(arena.contains(first));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn missing_indicators_read_as_zero() {
        let mut arena = Arena::new();
        let a = node(&mut arena, None);
        let n = arena.get(a).unwrap();
        assert_eq!(n.value("consumption", Month::new(1).unwrap()), 0.0);
        assert_eq!(n.yearly_total("consumption"), 0.0);
        assert_eq!(n.constant("gwp"), 0.0);
        assert!(!n.needs_factor());
        assert!(n.provenance.is_custom());
    }
}
