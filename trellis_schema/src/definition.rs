// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-member property definitions.
//!
//! A [`PropertyDefinition`] is the immutable schema for one member of a
//! host type: its name, declared kind, accessors, metadata tags, and the
//! predicates and validators attached to it. Definitions are built once by
//! [`TypeSchemaBuilder`](crate::TypeSchemaBuilder), owned by their
//! [`TypeSchema`](crate::TypeSchema), and shared via [`Arc`] by every node
//! bound to that member across all trees and target instances.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use crate::error::SchemaError;
use crate::kind::PropertyKind;
use crate::query::PropertyQuery;
use crate::validate::ValidationResult;
use crate::value::ErasedValue;

/// The per-level result of a recursive write.
///
/// By-value aggregates cannot be written in place: a member setter rebuilds
/// its owner and asks the caller to store the rebuilt owner one level up.
/// The write loop recurses upward until a setter reaches shared storage
/// (`Applied`) or the root target cell absorbs the replacement.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The write landed in storage shared with the target instance; no
    /// ancestor needs to change.
    Applied,
    /// The owner was rebuilt with the new member value and must be stored
    /// into its own slot.
    ReplaceOwner(ErasedValue),
}

/// Reads a member value out of an owner value.
///
/// The `usize` is the node's index among its siblings; only array element
/// accessors consult it. `None` means a null reference value.
pub type GetValueFn =
    Arc<dyn Fn(&ErasedValue, usize) -> Result<Option<ErasedValue>, SchemaError> + Send + Sync>;

/// Writes a member value, reporting how the write propagates.
pub type SetValueFn = Arc<
    dyn Fn(&ErasedValue, usize, Option<ErasedValue>) -> Result<WriteOutcome, SchemaError>
        + Send
        + Sync,
>;

/// A visibility or enablement veto.
pub type Predicate = Arc<dyn Fn(&dyn PropertyQuery) -> bool + Send + Sync>;

/// A pure validation function; results are collected, never thrown.
pub type Validator = Arc<dyn Fn(&dyn PropertyQuery) -> ValidationResult + Send + Sync>;

/// A custom label or tooltip provider.
pub type LabelProvider = Arc<dyn Fn(&dyn PropertyQuery) -> String + Send + Sync>;

/// Immutable schema for one member of a host type.
pub struct PropertyDefinition {
    pub(crate) name: &'static str,
    pub(crate) declared_kind: PropertyKind,
    pub(crate) declared_type: TypeId,
    pub(crate) declared_type_name: &'static str,
    pub(crate) element: Option<Arc<PropertyDefinition>>,
    pub(crate) is_array_element: bool,
    pub(crate) read_only: bool,
    pub(crate) max_depth: Option<usize>,
    pub(crate) tags: Vec<Arc<dyn Any + Send + Sync>>,
    pub(crate) hide_when: Vec<Predicate>,
    pub(crate) disable_when: Vec<Predicate>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) label: Option<LabelProvider>,
    pub(crate) tooltip: Option<LabelProvider>,
    pub(crate) get: GetValueFn,
    pub(crate) set: Option<SetValueFn>,
    pub(crate) extension_errors: Vec<String>,
}

impl PropertyDefinition {
    /// Returns the member name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the kind declared at registration.
    ///
    /// A node's effective kind may still differ: the serialized source's
    /// reported kind wins, and array element kinds are resolved against
    /// the registry at node construction.
    #[must_use]
    #[inline]
    pub fn declared_kind(&self) -> PropertyKind {
        self.declared_kind
    }

    /// Returns the [`TypeId`] of the declared member type.
    #[must_use]
    #[inline]
    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }

    /// Returns the declared member type's name, for diagnostics.
    #[must_use]
    #[inline]
    pub fn declared_type_name(&self) -> &'static str {
        self.declared_type_name
    }

    /// Returns `true` if this member is an element collection.
    #[must_use]
    #[inline]
    pub fn is_array(&self) -> bool {
        self.declared_kind.is_array()
    }

    /// Returns the shared definition for this array's elements.
    #[must_use]
    pub fn element_definition(&self) -> Option<&Arc<Self>> {
        self.element.as_ref()
    }

    /// Returns `true` if this definition describes array elements.
    #[must_use]
    #[inline]
    pub fn is_array_element(&self) -> bool {
        self.is_array_element
    }

    /// Returns `true` if the member was registered read-only or has no
    /// setter.
    #[must_use]
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only || self.set.is_none()
    }

    /// Returns the per-definition depth limit override, if any.
    #[must_use]
    #[inline]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Returns the first metadata tag of type `T`, in declaration order.
    #[must_use]
    pub fn tag<T: Any>(&self) -> Option<&T> {
        self.tags.iter().find_map(|tag| tag.as_ref().downcast_ref())
    }

    /// Returns `true` if any validators are attached.
    #[must_use]
    #[inline]
    pub fn has_validators(&self) -> bool {
        !self.validators.is_empty()
    }

    /// Returns the attached validators.
    #[must_use]
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Returns `true` if any visibility predicate vetoes the node.
    #[must_use]
    pub fn is_hidden(&self, query: &dyn PropertyQuery) -> bool {
        self.hide_when.iter().any(|predicate| predicate(query))
    }

    /// Returns `true` if any enablement predicate vetoes the node.
    #[must_use]
    pub fn is_disabled(&self, query: &dyn PropertyQuery) -> bool {
        self.disable_when.iter().any(|predicate| predicate(query))
    }

    /// Runs the custom label provider, if one is registered.
    #[must_use]
    pub fn custom_label(&self, query: &dyn PropertyQuery) -> Option<String> {
        self.label.as_ref().map(|provider| provider(query))
    }

    /// Runs the custom tooltip provider, if one is registered.
    #[must_use]
    pub fn custom_tooltip(&self, query: &dyn PropertyQuery) -> Option<String> {
        self.tooltip.as_ref().map(|provider| provider(query))
    }

    /// Reads this member's value out of `owner`.
    pub fn get_value(
        &self,
        owner: &ErasedValue,
        index: usize,
    ) -> Result<Option<ErasedValue>, SchemaError> {
        (self.get)(owner, index)
    }

    /// Writes this member's value, reporting how the write propagates.
    pub fn set_value(
        &self,
        owner: &ErasedValue,
        index: usize,
        value: Option<ErasedValue>,
    ) -> Result<WriteOutcome, SchemaError> {
        match &self.set {
            Some(set) => set(owner, index, value),
            None => Err(SchemaError::NotWritable { member: self.name }),
        }
    }

    /// Returns schema problems recorded against this definition.
    ///
    /// A definition with extension errors still participates in drawing
    /// and validation.
    #[must_use]
    pub fn extension_errors(&self) -> &[String] {
        &self.extension_errors
    }
}

// Manual Debug impl since accessors and callbacks aren't Debug.
impl fmt::Debug for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("name", &self.name)
            .field("declared_kind", &self.declared_kind)
            .field("declared_type", &self.declared_type_name)
            .field("is_array_element", &self.is_array_element)
            .field("read_only", &self.is_read_only())
            .field("tags", &self.tags.len())
            .field("validators", &self.validators.len())
            .field("has_label", &self.label.is_some())
            .field("has_tooltip", &self.tooltip.is_some())
            .field("extension_errors", &self.extension_errors)
            .finish_non_exhaustive()
    }
}

/// Turns a raw member name into a human-readable label.
///
/// Splits `camelCase` and `snake_case` into capitalized words and strips a
/// leading `m_` prefix.
///
/// # Example
///
/// ```rust
/// use trellis_schema::nicify_name;
///
/// assert_eq!(nicify_name("maxHealth"), "Max Health");
/// assert_eq!(nicify_name("max_health"), "Max Health");
/// assert_eq!(nicify_name("m_speed"), "Speed");
/// ```
#[must_use]
pub fn nicify_name(raw: &str) -> String {
    let raw = raw.strip_prefix("m_").unwrap_or(raw);
    let raw = raw.trim_start_matches('_');

    let mut out = String::with_capacity(raw.len() + 4);
    let mut word_break = true;
    let mut prev_lower = false;
    for ch in raw.chars() {
        if ch == '_' || ch == ' ' {
            word_break = true;
            prev_lower = false;
            continue;
        }
        if ch.is_ascii_uppercase() && prev_lower {
            word_break = true;
        }
        if word_break && !out.is_empty() {
            out.push(' ');
        }
        if word_break {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        word_break = false;
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;
    use alloc::format;
    use alloc::string::ToString;

    #[derive(Clone, PartialEq)]
    struct Sample {
        health: i32,
    }

    fn sample_definition() -> Arc<PropertyDefinition> {
        let mut registry = SchemaRegistry::new();
        let schema = registry.register::<Sample>("Sample", |t| {
            t.primitive("health", |s: &Sample| s.health, |s, v| s.health = v)
                .tag("gameplay".to_string());
        });
        schema.properties()[0].clone()
    }

    #[test]
    fn definition_basics() {
        let def = sample_definition();
        assert_eq!(def.name(), "health");
        assert_eq!(def.declared_kind(), PropertyKind::Primitive);
        assert_eq!(def.declared_type(), TypeId::of::<i32>());
        assert!(!def.is_array());
        assert!(!def.is_read_only());
        assert!(def.extension_errors().is_empty());
    }

    #[test]
    fn definition_tag_lookup() {
        let def = sample_definition();
        assert_eq!(def.tag::<String>().map(String::as_str), Some("gameplay"));
        assert!(def.tag::<i32>().is_none());
    }

    #[test]
    fn definition_get_set_roundtrip() {
        let def = sample_definition();
        let owner = ErasedValue::new(Sample { health: 10 });

        let value = def.get_value(&owner, 0).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&10));

        let outcome = def
            .set_value(&owner, 0, Some(ErasedValue::new(25_i32)))
            .unwrap();
        match outcome {
            WriteOutcome::ReplaceOwner(new_owner) => {
                let sample = new_owner.downcast_ref::<Sample>().unwrap();
                assert_eq!(sample.health, 25);
            }
            WriteOutcome::Applied => panic!("by-value member must replace its owner"),
        }
    }

    #[test]
    fn definition_set_wrong_type() {
        let def = sample_definition();
        let owner = ErasedValue::new(Sample { health: 10 });

        let err = def
            .set_value(&owner, 0, Some(ErasedValue::new("nope".to_string())))
            .unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn definition_set_null_primitive() {
        let def = sample_definition();
        let owner = ErasedValue::new(Sample { health: 10 });

        let err = def.set_value(&owner, 0, None).unwrap_err();
        assert_eq!(err, SchemaError::NullValue { member: "health" });
    }

    #[test]
    fn definition_debug() {
        let def = sample_definition();
        let debug = format!("{:?}", def);
        assert!(debug.contains("PropertyDefinition"));
        assert!(debug.contains("health"));
    }

    #[test]
    fn nicify_names() {
        assert_eq!(nicify_name("maxHealth"), "Max Health");
        assert_eq!(nicify_name("max_health"), "Max Health");
        assert_eq!(nicify_name("health"), "Health");
        assert_eq!(nicify_name("m_speed"), "Speed");
        assert_eq!(nicify_name("_hidden"), "Hidden");
        assert_eq!(nicify_name("HP"), "HP");
        assert_eq!(nicify_name("itemCount2"), "Item Count2");
    }
}
