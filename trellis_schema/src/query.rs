// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The read-only seam between schemas and the node tree.
//!
//! Predicates, validators, and label providers registered on a
//! [`PropertyDefinition`](crate::PropertyDefinition) observe the node they
//! are attached to through [`PropertyQuery`]. The tree crate implements
//! this trait for its node references, which keeps schema declarations
//! independent of the tree's internals.

use alloc::string::String;
use core::any::TypeId;

use crate::kind::PropertyKind;
use crate::value::ErasedValue;

/// A read-only view of one property node, as seen by schema callbacks.
///
/// Values exposed here are the node's cached state as of the current
/// update pass: the node itself is refreshed before its callbacks run,
/// while relatives may be up to one frame stale.
pub trait PropertyQuery {
    /// The member name from the definition.
    fn name(&self) -> &str;

    /// The node's kind.
    fn kind(&self) -> PropertyKind;

    /// The node's depth; the tree root is 0.
    fn depth(&self) -> usize;

    /// The dotted property path from the root.
    fn path(&self) -> String;

    /// The number of simultaneously edited target instances.
    fn target_count(&self) -> usize;

    /// The cached, merged value. `None` for a null reference or a
    /// mixed-reference node.
    fn value(&self) -> Option<&ErasedValue>;

    /// Reads the value for one target instance, bypassing the cache.
    fn value_at(&self, target: usize) -> Option<ErasedValue>;

    /// Returns `true` if the targets disagree for this node.
    fn is_value_mixed(&self) -> bool;

    /// The runtime type of the cached value, when known.
    ///
    /// For `Reference` nodes this may differ from the declared type.
    fn value_type(&self) -> Option<TypeId>;

    /// The node's position among its siblings; the element index for
    /// array elements.
    fn index_in_owner(&self) -> usize;

    /// Returns `true` if this node is an array element.
    fn is_array_element(&self) -> bool;
}
