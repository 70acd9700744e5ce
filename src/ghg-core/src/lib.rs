// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
pub mod datamodel;

pub use common::{Error, ErrorCode, ErrorKind, Result, canonicalize};
pub use datamodel::{AggregationRule, EntityId, MONTHS, Month, Sign};
