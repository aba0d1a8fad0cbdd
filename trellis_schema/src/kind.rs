// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property kind classification.

/// The shape of a property, fixed at node construction.
///
/// The kind decides how a node materializes children and how values from
/// multiple targets are merged:
///
/// - `Primitive`: a leaf. No children; mixed when targets disagree.
/// - `Generic`: a monomorphic aggregate. Children come from the declared
///   type's schema; never reported mixed itself.
/// - `Reference`: a polymorphic value whose runtime type may differ from
///   the declared type. Children come from the runtime type's schema and
///   are rebuilt when that type changes.
/// - `Array`: a dynamically sized element list. Children are element
///   nodes, resized incrementally to track the element count.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// A leaf value.
    Primitive,
    /// A monomorphic aggregate.
    Generic,
    /// A polymorphic reference.
    Reference,
    /// An ordered element collection.
    Array,
}

impl PropertyKind {
    /// Returns `true` for kinds whose children come from a type schema.
    #[must_use]
    #[inline]
    pub fn has_schema_children(self) -> bool {
        matches!(self, Self::Generic | Self::Reference)
    }

    /// Returns `true` for the array kind.
    #[must_use]
    #[inline]
    pub fn is_array(self) -> bool {
        matches!(self, Self::Array)
    }
}
