// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identifiers and per-node state.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;

use smallvec::SmallVec;
use trellis_schema::{ErasedValue, PropertyDefinition, PropertyKind, SchemaError, ValidationResult};

/// Child node lists are usually small; keep them inline.
pub(crate) type ChildVec = SmallVec<[NodeId; 8]>;

/// Identifier for a node in a [`PropertyTree`](crate::PropertyTree).
///
/// This is a small, copyable handle that stays stable across updates but
/// becomes invalid when the underlying slot is reused. It consists of a
/// slot index and a generation counter.
///
/// ## Semantics
///
/// - Nodes keep their `NodeId` across cache refreshes and array resizes
///   that leave them in place; external listeners rely on this for
///   diffing.
/// - When a parent rebuilds its child list (a reference's runtime type
///   changed) or an array trims its tail, the removed nodes' ids become
///   stale. Stale ids never alias a different live node because the
///   generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Per-node state, owned by the tree's slot arena.
pub(crate) struct NodeData {
    pub(crate) definition: Arc<PropertyDefinition>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) index_in_owner: usize,
    pub(crate) depth: usize,
    /// Fixed at construction; never changes over the node's lifetime.
    pub(crate) kind: PropertyKind,
    pub(crate) path: Arc<str>,
    /// Cached merged value; `None` for a null or mixed reference.
    pub(crate) value: Option<ErasedValue>,
    /// Runtime type of the cached value; may differ from the declared
    /// type for `Reference` nodes.
    pub(crate) runtime_type: Option<TypeId>,
    pub(crate) value_mixed: bool,
    pub(crate) children: Option<ChildVec>,
    pub(crate) validation: Vec<ValidationResult>,
    pub(crate) access_error: Option<SchemaError>,
    /// Frame token of the last cache refresh; 0 means never.
    pub(crate) last_update_frame: u64,
    /// Reentrancy guard; a nested update of the same node is fatal.
    pub(crate) updating: bool,
}

impl NodeData {
    pub(crate) fn new(
        definition: Arc<PropertyDefinition>,
        parent: Option<NodeId>,
        index_in_owner: usize,
        depth: usize,
        kind: PropertyKind,
        path: Arc<str>,
    ) -> Self {
        Self {
            definition,
            parent,
            index_in_owner,
            depth,
            kind,
            path,
            value: None,
            runtime_type: None,
            value_mixed: false,
            children: None,
            validation: Vec::new(),
            access_error: None,
            last_update_frame: 0,
            updating: false,
        }
    }
}
