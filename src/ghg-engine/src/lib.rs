// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod calculator;
pub mod common;
pub mod entity;
pub mod formula;
pub mod notify;
pub mod numeric;
pub mod profiles;
pub mod reference;
pub mod schema;
pub mod series;
pub mod snapshot;
pub mod summary;

#[cfg(test)]
mod testutils;

pub use self::aggregate::Contribution;
pub use self::calculator::Calculator;
pub use self::common::{
    AggregationRule, EntityId, Error, ErrorCode, ErrorKind, MONTHS, Month, Result, Sign,
    canonicalize,
};
pub use self::entity::{EntityNode, Provenance};
pub use self::formula::{Clamp, Formula, Operand};
pub use self::notify::ChangeNotifier;
pub use self::numeric::Domain;
pub use self::reference::{Equipment, ReferenceTables, Template};
pub use self::schema::{Category, EntityType, FactorDef, IndicatorDefinition, Profile, Schema};
pub use self::series::{EvidenceHandle, MonthRecord, TimeSeries};
pub use self::snapshot::Snapshot;
pub use self::summary::SummaryTable;
