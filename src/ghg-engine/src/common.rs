// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeSet, HashMap, HashSet};

// Re-export all common types from ghg-core
pub use ghg_core::common::*;
pub use ghg_core::datamodel::{AggregationRule, EntityId, MONTHS, Month, Sign};

#[macro_export]
macro_rules! schema_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Schema,
            ErrorCode::$code,
            Some($str),
        ))
    }}
);

#[macro_export]
macro_rules! entity_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Entity,
            ErrorCode::$code,
            Some($str),
        ))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Entity, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! reference_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Reference,
            ErrorCode::$code,
            Some($str),
        ))
    }}
);

#[macro_export]
macro_rules! snapshot_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(
            ErrorKind::Snapshot,
            ErrorCode::$code,
            Some($str),
        ))
    }}
);

/// Orders `runlist` so that every key comes after the keys it depends on.
///
/// Dependencies on keys missing from `dependencies` are ignored (they are
/// raw inputs, already available).  A cycle is reported with the key at
/// which it was detected.
pub fn topo_sort<'out>(
    runlist: Vec<&'out str>,
    dependencies: &'out HashMap<String, BTreeSet<String>>,
) -> Result<Vec<&'out str>> {
    let runlist_len = runlist.len();
    let mut result: Vec<&'out str> = Vec::with_capacity(runlist_len);
    let mut used: HashSet<&'out str> = HashSet::new();
    let mut in_progress: HashSet<&'out str> = HashSet::new();

    // postorder traversal so that dependencies land before the keys
    // that reference them.
    fn add<'a>(
        dependencies: &'a HashMap<String, BTreeSet<String>>,
        result: &mut Vec<&'a str>,
        used: &mut HashSet<&'a str>,
        in_progress: &mut HashSet<&'a str>,
        ident: &'a str,
    ) -> Result<()> {
        if used.contains(ident) {
            return Ok(());
        }
        if !in_progress.insert(ident) {
            return crate::schema_err!(
                CircularDependency,
                format!("'{ident}' depends on itself")
            );
        }
        if let Some(deps) = dependencies.get(ident) {
            for dep in deps.iter() {
                if dependencies.contains_key(dep.as_str()) {
                    add(dependencies, result, used, in_progress, dep)?;
                }
            }
        }
        in_progress.remove(ident);
        used.insert(ident);
        result.push(ident);
        Ok(())
    }

    for ident in runlist.into_iter() {
        add(dependencies, &mut result, &mut used, &mut in_progress, ident)?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(edges: &[(&str, &[&str])]) -> HashMap<String, BTreeSet<String>> {
        edges
            .iter()
            .map(|(k, vs)| {
                (
                    k.to_string(),
                    vs.iter().map(|v| v.to_string()).collect::<BTreeSet<_>>(),
                )
            })
            .collect()
    }

    #[test]
    fn dependencies_come_first() {
        let dependencies = deps(&[
            ("co2e", &["escaped", "gwp"]),
            ("escaped", &["generated", "destroyed"]),
        ]);
        let order = topo_sort(vec!["co2e", "escaped"], &dependencies).unwrap();
        assert_eq!(order, vec!["escaped", "co2e"]);
    }

    #[test]
    fn cycles_are_rejected() {
        let dependencies = deps(&[("a", &["b"]), ("b", &["a"])]);
        let err = topo_sort(vec!["a", "b"], &dependencies).unwrap_err();
        assert_eq!(err.code, ErrorCode::CircularDependency);
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let dependencies = deps(&[("a", &["a"])]);
        assert!(topo_sort(vec!["a"], &dependencies).is_err());
    }
}
