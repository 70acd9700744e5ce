// Copyright 2026 The GHG Calculator Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TemplateNotFound,
    UnknownEntity,
    UnknownEntityType,
    UnknownIndicator,
    CalculatedIndicator,
    BadMonth,
    UnknownEquipment,
    EquipmentMismatch,
    DuplicateIndicator,
    DuplicateEntityType,
    DuplicateFactor,
    UnknownOperand,
    CircularDependency,
    DuplicateCategory,
    UnknownCategory,
    DuplicateTemplate,
    DuplicateEquipment,
    BadReferenceTables,
    BadSnapshot,
    UnknownProfile,
    IdsExhausted,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            TemplateNotFound => "template_not_found",
            UnknownEntity => "unknown_entity",
            UnknownEntityType => "unknown_entity_type",
            UnknownIndicator => "unknown_indicator",
            CalculatedIndicator => "calculated_indicator",
            BadMonth => "bad_month",
            UnknownEquipment => "unknown_equipment",
            EquipmentMismatch => "equipment_mismatch",
            DuplicateIndicator => "duplicate_indicator",
            DuplicateEntityType => "duplicate_entity_type",
            DuplicateFactor => "duplicate_factor",
            UnknownOperand => "unknown_operand",
            CircularDependency => "circular_dependency",
            DuplicateCategory => "duplicate_category",
            UnknownCategory => "unknown_category",
            DuplicateTemplate => "duplicate_template",
            DuplicateEquipment => "duplicate_equipment",
            BadReferenceTables => "bad_reference_tables",
            BadSnapshot => "bad_snapshot",
            UnknownProfile => "unknown_profile",
            IdsExhausted => "ids_exhausted",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Entity,
    Reference,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Entity => "EntityError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Snapshot => "SnapshotError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Normalizes a user or catalog supplied key (indicator key, template id,
/// type tag) so lookups are insensitive to case and whitespace.
///
/// Leading/trailing whitespace is dropped, inner runs of whitespace become a
/// single underscore, and the result is lowercased.
pub fn canonicalize(name: &str) -> String {
    lazy_static! {
        static ref UNDERSCORE_RE: Regex = Regex::new(r"[\s\x{00A0}]+").unwrap();
    }
    let name = name.trim();
    UNDERSCORE_RE.replace_all(name, "_").to_lowercase()
}

#[test]
fn test_canonicalize() {
    assert_eq!("raw_coal", canonicalize("Raw Coal"));
    assert_eq!("raw_coal", canonicalize("  raw \n coal "));
    assert_eq!("hfc-23", canonicalize("HFC-23"));
    assert_eq!("co2", canonicalize("CO2"));
    assert_eq!("a_b", canonicalize("a\u{00A0}b"));
    assert_eq!("", canonicalize("   "));
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Reference,
        ErrorCode::TemplateNotFound,
        Some("coke-oven-gas".to_owned()),
    );
    assert_eq!(
        "ReferenceError{template_not_found: coke-oven-gas}",
        format!("{err}")
    );

    let err = Error::new(ErrorKind::Entity, ErrorCode::BadMonth, None);
    assert_eq!("EntityError{bad_month}", format!("{err}"));
    assert_eq!(None, err.get_details());
}
