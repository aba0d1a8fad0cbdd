// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The property tree.
//!
//! [`PropertyTree`] is the aggregate root: it owns the node arena, the
//! shared target cells, the frame token that gates cache refreshes, and
//! the per-frame update and validation passes. All node state is read
//! through tree methods keyed by [`NodeId`].

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use trellis_schema::{
    ErasedValue, PropertyDefinition, PropertyKind, PropertyQuery, SchemaError, SchemaRegistry,
    TypeSchema, ValidationResult, ValueList, nicify_name,
};

use crate::host::{SerializedSource, UndoScope};
use crate::node::{ChildVec, NodeData, NodeId};
use crate::write::{ObserverFn, ObserverId};

/// A target instance cell, shared between the tree and its host.
///
/// Edits made through the tree land in these cells, so the host observes
/// them without copying values back.
pub type SharedTarget = Rc<RefCell<ErasedValue>>;

/// Wraps a value in a [`SharedTarget`] cell.
#[must_use]
pub fn share_target(value: ErasedValue) -> SharedTarget {
    Rc::new(RefCell::new(value))
}

/// The default depth at which child materialization stops.
///
/// Bounds recursion on self-referential schemas; individual definitions
/// may override it.
pub const DEFAULT_MAX_DEPTH: usize = 15;

/// An error constructing a [`PropertyTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The target list was empty.
    NoTargets,
    /// The targets do not all hold the same type.
    MixedTargetTypes {
        /// Type of target 0.
        first: &'static str,
        /// The first differing type.
        other: &'static str,
    },
    /// The target type has no registered schema.
    UnregisteredType {
        /// The target type's name.
        type_name: &'static str,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTargets => write!(f, "a property tree needs at least one target"),
            Self::MixedTargetTypes { first, other } => {
                write!(f, "targets must share one type, found {first} and {other}")
            }
            Self::UnregisteredType { type_name } => {
                write!(f, "no schema registered for target type {type_name}")
            }
        }
    }
}

impl core::error::Error for TreeError {}

bitflags::bitflags! {
    /// Sticky request flags consumed by the external driver.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub(crate) struct TreeRequests: u8 {
        const VALIDATION = 1 << 0;
        const REPAINT = 1 << 1;
    }
}

struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// A tree of property nodes mirroring one or more target instances.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use trellis_schema::{ErasedValue, SchemaRegistry};
/// use trellis_tree::{PropertyTree, share_target};
///
/// #[derive(Clone, PartialEq)]
/// struct Counter {
///     count: i32,
/// }
///
/// let mut registry = SchemaRegistry::new();
/// registry.register::<Counter>("Counter", |t| {
///     t.primitive("count", |c: &Counter| c.count, |c, v| c.count = v);
/// });
///
/// let target = share_target(ErasedValue::new(Counter { count: 3 }));
/// let mut tree = PropertyTree::new(Arc::new(registry), vec![target]).unwrap();
///
/// tree.update(false);
/// let root = tree.root();
/// let count = tree.children(root)[0];
/// assert_eq!(tree.display_name(count), "Count");
/// assert_eq!(
///     tree.value(count).and_then(|v| v.downcast_ref::<i32>()),
///     Some(&3)
/// );
/// ```
pub struct PropertyTree {
    pub(crate) registry: Arc<SchemaRegistry>,
    schema: Arc<TypeSchema>,
    pub(crate) targets: Vec<SharedTarget>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    frame: u64,
    max_depth: usize,
    pub(crate) requests: TreeRequests,
    pub(crate) observers: Vec<(ObserverId, ObserverFn)>,
    pub(crate) next_observer: u64,
    pub(crate) source: Option<Box<dyn SerializedSource>>,
    pub(crate) undo: Option<Box<dyn UndoScope>>,
    expanded: HashMap<Arc<str>, bool>,
}

impl PropertyTree {
    /// Creates a tree over the given targets.
    ///
    /// All targets must hold the same type, and that type must be
    /// registered in `registry`.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        targets: Vec<SharedTarget>,
    ) -> Result<Self, TreeError> {
        let Some(first) = targets.first() else {
            return Err(TreeError::NoTargets);
        };
        let type_id = first.borrow().type_id();
        for target in &targets[1..] {
            let target = target.borrow();
            if target.type_id() != type_id {
                return Err(TreeError::MixedTargetTypes {
                    first: first.borrow().type_name(),
                    other: target.type_name(),
                });
            }
        }
        let schema = registry
            .schema_of(type_id)
            .cloned()
            .ok_or(TreeError::UnregisteredType {
                type_name: first.borrow().type_name(),
            })?;

        let mut tree = Self {
            registry,
            schema,
            targets,
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 0),
            frame: 1,
            max_depth: DEFAULT_MAX_DEPTH,
            requests: TreeRequests::empty(),
            observers: Vec::new(),
            next_observer: 0,
            source: None,
            undo: None,
            expanded: HashMap::new(),
        };
        let root_definition = tree.schema.root_definition().clone();
        tree.root = tree.create_node(None, root_definition, 0);
        Ok(tree)
    }

    /// Attaches an external serialized representation.
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn SerializedSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Attaches the host's undo transaction system.
    #[must_use]
    pub fn with_undo(mut self, undo: Box<dyn UndoScope>) -> Self {
        self.undo = Some(undo);
        self
    }

    /// Overrides the default depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    // =========================================================================
    // Frame and update pass
    // =========================================================================

    /// Returns the current frame token.
    #[must_use]
    #[inline]
    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Advances the frame token, making every node cache eligible for
    /// refresh, and refreshes the root.
    ///
    /// With `force`, every materialized node is refreshed immediately;
    /// the mutation protocol uses this so re-reads after a write observe
    /// fresh state within the same frame.
    pub fn update(&mut self, force: bool) {
        self.frame += 1;
        let root = self.root;
        self.update_node(root, force);
    }

    pub(crate) fn update_node(&mut self, id: NodeId, force: bool) {
        let frame = self.frame;
        {
            let data = self.data(id);
            assert!(
                !data.updating,
                "re-entrant update of property node '{}'",
                data.path
            );
            if data.last_update_frame == frame && !force {
                return;
            }
        }
        {
            let data = self.data_mut(id);
            data.updating = true;
            data.last_update_frame = frame;
        }

        let (value, mixed, error) = self.read_merged(id);

        let (kind, declared_type, old_runtime) = {
            let data = self.data(id);
            (data.kind, data.definition.declared_type(), data.runtime_type)
        };
        let new_runtime = match kind {
            PropertyKind::Reference => value.as_ref().map(ErasedValue::type_id),
            _ => Some(declared_type),
        };
        let type_changed = old_runtime != new_runtime;

        {
            let data = self.data_mut(id);
            data.value = value;
            data.value_mixed = mixed;
            data.runtime_type = new_runtime;
            data.access_error = error;
        }

        let (depth, depth_override) = {
            let data = self.data(id);
            (data.depth, data.definition.max_depth())
        };
        let effective_max_depth = depth_override.unwrap_or(self.max_depth);
        if depth >= effective_max_depth {
            // At the limit a node reports no children, which breaks
            // self-referential schema cycles.
            self.clear_children(id);
            self.data_mut(id).children = Some(ChildVec::new());
            self.data_mut(id).updating = false;
            return;
        }

        match kind {
            PropertyKind::Generic | PropertyKind::Reference => {
                if self.data(id).children.is_none() || type_changed {
                    self.clear_children(id);
                    let self_type = match kind {
                        PropertyKind::Reference => self.data(id).runtime_type,
                        _ => Some(declared_type),
                    };
                    let definitions: Vec<Arc<PropertyDefinition>> = self_type
                        .and_then(|ty| self.registry.schema_of(ty))
                        .map(|schema| schema.properties().to_vec())
                        .unwrap_or_default();
                    let mut children = ChildVec::with_capacity(definitions.len());
                    for (index, definition) in definitions.into_iter().enumerate() {
                        children.push(self.create_node(Some(id), definition, index));
                    }
                    self.data_mut(id).children = Some(children);
                }
            }
            PropertyKind::Array => {
                let element_count = self
                    .data(id)
                    .value
                    .as_ref()
                    .and_then(|value| value.downcast_ref::<ValueList>())
                    .map_or(0, ValueList::len);
                if self.data(id).children.is_none() {
                    self.data_mut(id).children = Some(ChildVec::new());
                }
                // Grow by appending and shrink by trimming the tail, so
                // surviving elements keep their node identity.
                while self.child_count(id) < element_count {
                    let Some(element) = self.data(id).definition.element_definition().cloned()
                    else {
                        break;
                    };
                    let index = self.child_count(id);
                    let child = self.create_node(Some(id), element, index);
                    self.data_mut(id).children.as_mut().unwrap().push(child);
                }
                while self.child_count(id) > element_count {
                    let child = self.data_mut(id).children.as_mut().unwrap().pop().unwrap();
                    self.destroy_subtree(child);
                }
            }
            PropertyKind::Primitive => {}
        }

        if force {
            if let Some(children) = self.data(id).children.clone() {
                for child in children {
                    self.update_node(child, true);
                }
            }
        }

        self.data_mut(id).updating = false;
    }

    fn read_merged(&self, id: NodeId) -> (Option<ErasedValue>, bool, Option<SchemaError>) {
        let first = match self.value_for_target(id, 0) {
            Ok(value) => value,
            Err(error) => return (None, false, Some(error)),
        };
        let targets = self.targets.len();
        if targets == 1 {
            return (first, false, None);
        }

        match self.data(id).kind {
            PropertyKind::Array => {
                // Mixed whenever there is more than one target; the
                // displayed value is the shortest non-null element list,
                // which keeps element reads in range for every target.
                let mut best = first;
                for index in 1..targets {
                    let other = match self.value_for_target(id, index) {
                        Ok(value) => value,
                        Err(error) => return (None, true, Some(error)),
                    };
                    best = match (best, other) {
                        (None, other) => other,
                        (best, None) => best,
                        (Some(current), Some(other)) => match shorter_list(current, other) {
                            Ok(list) => Some(list),
                            Err(error) => return (None, true, Some(error)),
                        },
                    };
                }
                (best, true, None)
            }
            PropertyKind::Reference => {
                // Heterogeneous runtime types cannot merge children.
                let first_type = first.as_ref().map(ErasedValue::type_id);
                for index in 1..targets {
                    let other = match self.value_for_target(id, index) {
                        Ok(value) => value,
                        Err(error) => return (None, true, Some(error)),
                    };
                    if other.as_ref().map(ErasedValue::type_id) != first_type {
                        return (None, true, None);
                    }
                }
                (first, false, None)
            }
            PropertyKind::Generic => (first, false, None),
            PropertyKind::Primitive => {
                for index in 1..targets {
                    let other = match self.value_for_target(id, index) {
                        Ok(value) => value,
                        Err(error) => return (first, true, Some(error)),
                    };
                    if other != first {
                        return (first, true, None);
                    }
                }
                (first, false, None)
            }
        }
    }

    /// Reads the value for one target instance, bypassing the cache.
    ///
    /// Walks the parent chain down from the target cell through the
    /// definitions' accessors.
    pub fn value_for_target(
        &self,
        id: NodeId,
        target: usize,
    ) -> Result<Option<ErasedValue>, SchemaError> {
        let data = self.data(id);
        match data.parent {
            None => Ok(Some(self.targets[target].borrow().clone())),
            Some(parent) => {
                let owner = self.value_for_target(parent, target)?;
                let owner = owner.ok_or(SchemaError::NullOwner {
                    member: data.definition.name(),
                })?;
                data.definition.get_value(&owner, data.index_in_owner)
            }
        }
    }

    // =========================================================================
    // Node reads
    // =========================================================================

    /// Returns the root node.
    #[must_use]
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of simultaneously edited targets.
    #[must_use]
    #[inline]
    pub fn targets_count(&self) -> usize {
        self.targets.len()
    }

    /// Returns the target cells.
    #[must_use]
    pub fn targets(&self) -> &[SharedTarget] {
        &self.targets
    }

    /// Returns the schema registry this tree reads from.
    #[must_use]
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Returns the node's cached merged value, refreshing it if stale.
    ///
    /// The returned value is never older than the current frame token.
    /// `None` means a null reference or a mixed-reference node.
    pub fn value(&mut self, id: NodeId) -> Option<&ErasedValue> {
        self.update_node(id, false);
        self.data(id).value.as_ref()
    }

    /// Returns `true` if the targets disagree for this node.
    ///
    /// Always `false` for a single-target tree.
    pub fn is_value_mixed(&mut self, id: NodeId) -> bool {
        if self.targets.len() == 1 {
            return false;
        }
        self.update_node(id, false);
        self.data(id).value_mixed
    }

    /// Returns the runtime type of the node's value.
    ///
    /// For `Reference` nodes this is read from the current value and may
    /// differ from the declared type; for other kinds it is the declared
    /// type.
    pub fn value_type(&mut self, id: NodeId) -> Option<TypeId> {
        if self.data(id).kind != PropertyKind::Reference {
            return Some(self.data(id).definition.declared_type());
        }
        self.update_node(id, false);
        self.data(id).runtime_type
    }

    /// Returns the child nodes of a `Generic` or `Reference` node.
    ///
    /// Empty for every other kind.
    pub fn children(&mut self, id: NodeId) -> &[NodeId] {
        self.update_node(id, false);
        let data = self.data(id);
        if data.kind.has_schema_children() {
            data.children.as_deref().unwrap_or(&[])
        } else {
            &[]
        }
    }

    /// Returns the element nodes of an `Array` node.
    ///
    /// Empty for every other kind.
    pub fn array_elements(&mut self, id: NodeId) -> &[NodeId] {
        self.update_node(id, false);
        let data = self.data(id);
        if data.kind.is_array() {
            data.children.as_deref().unwrap_or(&[])
        } else {
            &[]
        }
    }

    /// Returns the node's kind, fixed at construction.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> PropertyKind {
        self.data(id).kind
    }

    /// Returns the node's depth; the root is 0.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.data(id).depth
    }

    /// Returns the node's parent.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Returns the node that owns this member, skipping the array node
    /// for array elements.
    #[must_use]
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.data(id).parent?;
        if self.data(id).definition.is_array_element() {
            self.data(parent).parent
        } else {
            Some(parent)
        }
    }

    /// Returns `true` for the tree root.
    #[must_use]
    pub fn is_root(&self, id: NodeId) -> bool {
        self.data(id).parent.is_none()
    }

    /// Returns the node's definition.
    #[must_use]
    pub fn definition(&self, id: NodeId) -> &Arc<PropertyDefinition> {
        &self.data(id).definition
    }

    /// Returns the raw member name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &'static str {
        self.data(id).definition.name()
    }

    /// Returns the dotted property path from the root.
    #[must_use]
    pub fn path(&self, id: NodeId) -> &str {
        &self.data(id).path
    }

    /// Returns the element index of an array element node.
    ///
    /// # Panics
    ///
    /// Panics if the node is not an array element; that is a caller
    /// programming error.
    #[must_use]
    pub fn index_in_array(&self, id: NodeId) -> usize {
        let data = self.data(id);
        assert!(
            data.definition.is_array_element(),
            "cannot read index_in_array for non-element node '{}'",
            data.path
        );
        data.index_in_owner
    }

    /// Returns the display label: the custom label when registered,
    /// "Element N" for array elements, the nicified member name
    /// otherwise.
    #[must_use]
    pub fn display_name(&self, id: NodeId) -> String {
        let data = self.data(id);
        if data.definition.is_array_element() {
            return format!("Element {}", data.index_in_owner);
        }
        let definition = data.definition.clone();
        if let Some(label) = definition.custom_label(&PropertyRef { tree: self, id }) {
            return label;
        }
        nicify_name(definition.name())
    }

    /// Returns the tooltip, when a provider is registered.
    #[must_use]
    pub fn tooltip(&self, id: NodeId) -> Option<String> {
        let definition = self.data(id).definition.clone();
        definition.custom_tooltip(&PropertyRef { tree: self, id })
    }

    /// Returns `true` unless a visibility predicate vetoes the node.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        let definition = self.data(id).definition.clone();
        !definition.is_hidden(&PropertyRef { tree: self, id })
    }

    /// Returns `true` unless the definition is read-only or an
    /// enablement predicate vetoes the node.
    #[must_use]
    pub fn is_enabled(&self, id: NodeId) -> bool {
        let definition = self.data(id).definition.clone();
        if definition.is_read_only() {
            return false;
        }
        !definition.is_disabled(&PropertyRef { tree: self, id })
    }

    /// Returns the node's persisted expansion flag.
    ///
    /// Delegated to the serialized source when one is attached, else kept
    /// in a session map keyed by property path.
    #[must_use]
    pub fn is_expanded(&self, id: NodeId) -> bool {
        let path = &self.data(id).path;
        match &self.source {
            Some(source) => source.is_expanded(path),
            None => self.expanded.get(path).copied().unwrap_or(false),
        }
    }

    /// Persists the node's expansion flag.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        if self.is_expanded(id) == expanded {
            return;
        }
        let path = self.data(id).path.clone();
        match &mut self.source {
            Some(source) => source.set_expanded(&path, expanded),
            None => {
                self.expanded.insert(path, expanded);
            }
        }
    }

    /// Returns schema problems recorded against the node's definition.
    #[must_use]
    pub fn extension_errors(&self, id: NodeId) -> &[String] {
        self.data(id).definition.extension_errors()
    }

    /// Returns the accessor error from the node's last refresh, if any.
    #[must_use]
    pub fn access_error(&self, id: NodeId) -> Option<&SchemaError> {
        self.data(id).access_error.as_ref()
    }

    // =========================================================================
    // Requests and validation
    // =========================================================================

    /// Requests a validation pass before the next draw.
    pub fn request_validation(&mut self) {
        self.requests.insert(TreeRequests::VALIDATION);
    }

    /// Requests a repaint from the external driver.
    pub fn request_repaint(&mut self) {
        self.requests.insert(TreeRequests::REPAINT);
    }

    /// Returns `true` if a validation pass is pending.
    #[must_use]
    pub fn validation_requested(&self) -> bool {
        self.requests.contains(TreeRequests::VALIDATION)
    }

    /// Returns and clears the repaint request flag.
    pub fn take_repaint_request(&mut self) -> bool {
        let requested = self.requests.contains(TreeRequests::REPAINT);
        self.requests.remove(TreeRequests::REPAINT);
        requested
    }

    /// Runs a validation pass if one was requested.
    pub fn run_validation_if_required(&mut self) {
        if self.requests.contains(TreeRequests::VALIDATION) {
            self.run_validation();
            self.requests.remove(TreeRequests::VALIDATION);
        }
    }

    /// Runs every node's validators, keeping only failing results.
    ///
    /// Walks pre-order: a node's validators run before its children's,
    /// and a failing parent never blocks child validation.
    pub fn run_validation(&mut self) {
        let root = self.root;
        self.validate_node(root);
    }

    fn validate_node(&mut self, id: NodeId) {
        self.update_node(id, false);

        let mut results = Vec::new();
        if let Some(error) = &self.data(id).access_error {
            results.push(ValidationResult::error(format!("{error}")));
        }
        let definition = self.data(id).definition.clone();
        for validator in definition.validators() {
            let result = validator(&PropertyRef { tree: self, id });
            if !result.is_valid() {
                results.push(result);
            }
        }
        self.data_mut(id).validation = results;

        let kind = self.data(id).kind;
        if kind.has_schema_children() || kind.is_array() {
            let children = self.data(id).children.clone().unwrap_or_default();
            for child in children {
                self.validate_node(child);
            }
        }
    }

    /// Returns the node's failing validation results from the last pass.
    #[must_use]
    pub fn validation_results(&self, id: NodeId) -> &[ValidationResult] {
        &self.data(id).validation
    }

    /// Visits every failing validation result in pre-order.
    pub fn enumerate_validation_results(
        &mut self,
        mut visit: impl FnMut(NodeId, &ValidationResult),
    ) {
        let root = self.root;
        self.enumerate_node(root, &mut visit);
    }

    fn enumerate_node(&mut self, id: NodeId, visit: &mut impl FnMut(NodeId, &ValidationResult)) {
        self.update_node(id, false);

        let results = self.data(id).validation.clone();
        for result in &results {
            visit(id, result);
        }

        let kind = self.data(id).kind;
        if kind.has_schema_children() || kind.is_array() {
            let children = self.data(id).children.clone().unwrap_or_default();
            for child in children {
                self.enumerate_node(child, visit);
            }
        }
    }

    // =========================================================================
    // Arena internals
    // =========================================================================

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        let slot = self
            .slots
            .get(id.idx())
            .filter(|slot| slot.generation == id.1);
        match slot.and_then(|slot| slot.data.as_ref()) {
            Some(data) => data,
            None => panic!("stale or foreign node id {id:?}"),
        }
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        let slot = self
            .slots
            .get_mut(id.idx())
            .filter(|slot| slot.generation == id.1);
        match slot.and_then(|slot| slot.data.as_mut()) {
            Some(data) => data,
            None => panic!("stale or foreign node id {id:?}"),
        }
    }

    fn child_count(&self, id: NodeId) -> usize {
        self.data(id).children.as_ref().map_or(0, ChildVec::len)
    }

    fn create_node(
        &mut self,
        parent: Option<NodeId>,
        definition: Arc<PropertyDefinition>,
        index: usize,
    ) -> NodeId {
        let depth = parent.map_or(0, |parent| self.data(parent).depth + 1);
        let path = self.child_path(parent, &definition, index);
        let reported = self
            .source
            .as_ref()
            .and_then(|source| source.reported_kind(&path));
        let kind = self.registry.effective_kind(&definition, reported);
        self.alloc(NodeData::new(definition, parent, index, depth, kind, path))
    }

    fn child_path(
        &self,
        parent: Option<NodeId>,
        definition: &PropertyDefinition,
        index: usize,
    ) -> Arc<str> {
        match parent {
            None => Arc::from(""),
            Some(parent) => {
                let base = &self.data(parent).path;
                if definition.is_array_element() {
                    Arc::from(format!("{base}[{index}]").as_str())
                } else if base.is_empty() {
                    Arc::from(definition.name())
                } else {
                    Arc::from(format!("{base}.{}", definition.name()).as_str())
                }
            }
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                let slot = &mut self.slots[idx as usize];
                slot.generation += 1;
                slot.data = Some(data);
                NodeId::new(idx, slot.generation)
            }
            None => {
                let idx = u32::try_from(self.slots.len()).expect("node arena exhausted");
                self.slots.push(Slot {
                    generation: 1,
                    data: Some(data),
                });
                NodeId::new(idx, 1)
            }
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        if let Some(children) = self.data_mut(id).children.take() {
            for child in children {
                self.destroy_subtree(child);
            }
        }
    }

    fn destroy_subtree(&mut self, id: NodeId) {
        self.clear_children(id);
        let slot = &mut self.slots[id.idx()];
        slot.data = None;
        self.free.push(id.0);
    }
}

impl fmt::Debug for PropertyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTree")
            .field("type_name", &self.schema.type_name())
            .field("targets", &self.targets.len())
            .field("frame", &self.frame)
            .field("live_nodes", &(self.slots.len() - self.free.len()))
            .finish_non_exhaustive()
    }
}

/// The [`PropertyQuery`] view handed to predicates, validators, and label
/// providers.
pub(crate) struct PropertyRef<'a> {
    pub(crate) tree: &'a PropertyTree,
    pub(crate) id: NodeId,
}

impl PropertyQuery for PropertyRef<'_> {
    fn name(&self) -> &str {
        self.tree.data(self.id).definition.name()
    }

    fn kind(&self) -> PropertyKind {
        self.tree.data(self.id).kind
    }

    fn depth(&self) -> usize {
        self.tree.data(self.id).depth
    }

    fn path(&self) -> String {
        self.tree.data(self.id).path.to_string()
    }

    fn target_count(&self) -> usize {
        self.tree.targets.len()
    }

    fn value(&self) -> Option<&ErasedValue> {
        self.tree.data(self.id).value.as_ref()
    }

    fn value_at(&self, target: usize) -> Option<ErasedValue> {
        self.tree.value_for_target(self.id, target).ok().flatten()
    }

    fn is_value_mixed(&self) -> bool {
        self.tree.targets.len() > 1 && self.tree.data(self.id).value_mixed
    }

    fn value_type(&self) -> Option<TypeId> {
        self.tree.data(self.id).runtime_type
    }

    fn index_in_owner(&self) -> usize {
        self.tree.data(self.id).index_in_owner
    }

    fn is_array_element(&self) -> bool {
        self.tree.data(self.id).definition.is_array_element()
    }
}

fn list_len(value: &ErasedValue) -> Result<usize, SchemaError> {
    value
        .downcast_ref::<ValueList>()
        .map(ValueList::len)
        .ok_or(SchemaError::TypeMismatch {
            expected: core::any::type_name::<ValueList>(),
            found: value.type_name(),
        })
}

fn shorter_list(current: ErasedValue, other: ErasedValue) -> Result<ErasedValue, SchemaError> {
    let current_len = list_len(&current)?;
    let other_len = list_len(&other)?;
    Ok(if other_len < current_len { other } else { current })
}
