// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Schema: type schemas and erased member access.
//!
//! This crate is the schema half of the Trellis property tree. It knows
//! what a host type's members are; the companion `trellis_tree` crate
//! mirrors live instances as a node tree.
//!
//! ## Core Concepts
//!
//! ### Erased values
//!
//! [`ErasedValue`] carries member values of any `Clone + PartialEq +
//! 'static` type with type-appropriate equality. [`ValueList`] is the
//! erased value of an array member.
//!
//! ### Definitions and schemas
//!
//! A [`PropertyDefinition`] is the immutable schema of one member: name,
//! declared [`PropertyKind`], erased accessors, metadata tags,
//! visibility/enablement predicates, validators, and optional label and
//! tooltip providers. A [`TypeSchema`] is the ordered member list of one
//! host type.
//!
//! ### The registry
//!
//! [`SchemaRegistry`] memoizes one [`TypeSchema`] per host type, built
//! once at registration and shared by every tree. Rust has no runtime
//! member enumeration, so member access is captured at registration time
//! as typed closures:
//!
//! ```rust
//! use trellis_schema::{PropertyQuery, SchemaRegistry, ValidationResult};
//!
//! #[derive(Clone, PartialEq)]
//! struct Player {
//!     name: String,
//!     health: i32,
//! }
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register::<Player>("Player", |t| {
//!     t.primitive("name", |p: &Player| p.name.clone(), |p, v| p.name = v);
//!     t.primitive("health", |p: &Player| p.health, |p, v| p.health = v)
//!         .validate(|q| {
//!             let negative = q
//!                 .value()
//!                 .and_then(|v| v.downcast_ref::<i32>())
//!                 .is_some_and(|health| *health < 0);
//!             if negative {
//!                 ValidationResult::error("health must not be negative")
//!             } else {
//!                 ValidationResult::valid()
//!             }
//!         });
//! });
//!
//! let schema = registry.schema_for::<Player>().unwrap();
//! assert_eq!(schema.properties().len(), 2);
//! assert!(schema.properties()[1].has_validators());
//! ```
//!
//! ### Writes and by-value aggregates
//!
//! Setters report a [`WriteOutcome`]: either the write landed in storage
//! shared with the target (`Applied`), or the owner value was rebuilt and
//! must be stored one level up (`ReplaceOwner`). The tree crate recurses
//! on `ReplaceOwner` until a settable reference or the root target cell
//! absorbs the write, which models "aggregates are copied, not
//! referenced" without the schema knowing anything about trees.
//!
//! ### The query seam
//!
//! Predicates, validators, and label providers observe their node through
//! [`PropertyQuery`], implemented by the tree crate. This keeps schema
//! declarations independent of tree internals.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature (default)
//! is only needed for the process-wide [`SchemaRegistry::global`].

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod definition;
mod error;
mod kind;
mod query;
mod registry;
mod validate;
mod value;

pub use definition::{
    GetValueFn, LabelProvider, Predicate, PropertyDefinition, SetValueFn, Validator, WriteOutcome,
    nicify_name,
};
pub use error::SchemaError;
pub use kind::PropertyKind;
pub use query::PropertyQuery;
pub use registry::{FieldDraft, SchemaRegistry, TypeSchema, TypeSchemaBuilder};
pub use validate::{Severity, ValidationResult};
pub use value::{ErasedValue, ValueList};
