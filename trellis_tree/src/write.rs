// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutation protocol and change notification.
//!
//! [`PropertyTree::set_value`] and [`PropertyTree::set_values`] are the
//! only mutation entry points. Every write follows one discipline:
//!
//! 1. Flush edits pending in the serialized source into the targets.
//! 2. Open a single undo group covering all targets.
//! 3. Apply the value per target, recursing upward while setters report
//!    [`WriteOutcome::ReplaceOwner`]; the root target cell absorbs
//!    whatever reaches it.
//! 4. Resynchronize the serialized source and force-refresh every cache.
//! 5. Notify observers, then request validation and a repaint.
//!
//! Notification is two-tier: the written node gets
//! [`ChangeKind::ValueChanged`]; every strict ancestor gets
//! [`ChangeKind::DescendantChanged`], bubbling root-ward. Listeners use
//! the distinction to refresh dependent widgets without re-walking the
//! tree.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use trellis_schema::{ErasedValue, SchemaError, WriteOutcome};

use crate::node::NodeId;
use crate::tree::{PropertyTree, TreeRequests};

/// Distinguishes a node's own change from a descendant's.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The noticed node's own value was written.
    ValueChanged,
    /// A strict descendant of the noticed node was written.
    DescendantChanged,
}

/// A change notification delivered to observers.
#[derive(Clone, Debug)]
pub struct ChangeNotice {
    /// The node being notified.
    pub node: NodeId,
    /// The notified node's property path.
    pub node_path: Arc<str>,
    /// The node whose value was written.
    pub origin: NodeId,
    /// The written node's property path.
    pub origin_path: Arc<str>,
    /// Whether `node` is the origin or one of its ancestors.
    pub kind: ChangeKind,
}

/// Handle for removing a registered observer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

pub(crate) type ObserverFn = Box<dyn Fn(&ChangeNotice)>;

impl PropertyTree {
    /// Registers a change observer.
    pub fn observe(&mut self, observer: impl Fn(&ChangeNotice) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes a change observer.
    ///
    /// Returns `true` if the observer was registered.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    /// Writes one value to every target.
    ///
    /// `None` clears a reference member. This is a mutation entry point;
    /// the full protocol in the module docs runs around the write.
    pub fn set_value(&mut self, id: NodeId, value: Option<ErasedValue>) -> Result<(), SchemaError> {
        self.modify_targets(id, |tree, target| {
            tree.apply_recursive(id, value.clone(), target)
        })
    }

    /// Writes one concrete value to every target.
    pub fn set_primitive<T: Clone + PartialEq + 'static>(
        &mut self,
        id: NodeId,
        value: T,
    ) -> Result<(), SchemaError> {
        self.set_value(id, Some(ErasedValue::new(value)))
    }

    /// Writes a per-target value to every target.
    pub fn set_values(
        &mut self,
        id: NodeId,
        mut per_target: impl FnMut(usize) -> Option<ErasedValue>,
    ) -> Result<(), SchemaError> {
        self.modify_targets(id, |tree, target| {
            let value = per_target(target);
            tree.apply_recursive(id, value, target)
        })
    }

    /// Runs `apply` once per target inside the mutation protocol.
    ///
    /// `id` names the node being written; its path labels the undo group
    /// and anchors the change notification.
    pub fn modify_targets(
        &mut self,
        id: NodeId,
        mut apply: impl FnMut(&mut Self, usize) -> Result<(), SchemaError>,
    ) -> Result<(), SchemaError> {
        // Capture the notification chain up front: a forced refresh may
        // rebuild the written node's subtree.
        let notices = self.change_notices(id);

        if let Some(source) = &mut self.source {
            source.apply_pending(&mut self.targets);
        }

        let label = self.data(id).path.clone();
        if let Some(undo) = &mut self.undo {
            undo.begin_group(&label);
        }

        for target in 0..self.targets.len() {
            apply(self, target)?;
        }

        if let Some(source) = &mut self.source {
            source.synchronize(&self.targets);
        }
        self.update(true);

        for notice in &notices {
            self.emit(notice);
        }

        self.requests
            .insert(TreeRequests::VALIDATION | TreeRequests::REPAINT);
        Ok(())
    }

    /// Notifies observers that `id`'s value changed, bubbling a
    /// descendant-changed notice to every strict ancestor.
    pub fn notify_value_changed(&self, id: NodeId) {
        for notice in self.change_notices(id) {
            self.emit(&notice);
        }
    }

    fn change_notices(&self, origin: NodeId) -> Vec<ChangeNotice> {
        let origin_path = self.data(origin).path.clone();
        let mut notices = Vec::new();
        notices.push(ChangeNotice {
            node: origin,
            node_path: origin_path.clone(),
            origin,
            origin_path: origin_path.clone(),
            kind: ChangeKind::ValueChanged,
        });
        let mut current = self.data(origin).parent;
        while let Some(ancestor) = current {
            notices.push(ChangeNotice {
                node: ancestor,
                node_path: self.data(ancestor).path.clone(),
                origin,
                origin_path: origin_path.clone(),
                kind: ChangeKind::DescendantChanged,
            });
            current = self.data(ancestor).parent;
        }
        notices
    }

    fn emit(&self, notice: &ChangeNotice) {
        for (_, observer) in &self.observers {
            observer(notice);
        }
    }

    fn apply_recursive(
        &mut self,
        id: NodeId,
        mut value: Option<ErasedValue>,
        target: usize,
    ) -> Result<(), SchemaError> {
        let mut current = id;
        loop {
            match self.data(current).parent {
                None => {
                    // The target cell is the final by-reference container.
                    let value = value.ok_or(SchemaError::NullValue {
                        member: self.data(current).definition.name(),
                    })?;
                    *self.targets[target].borrow_mut() = value;
                    return Ok(());
                }
                Some(parent) => {
                    let owner =
                        self.value_for_target(parent, target)?
                            .ok_or(SchemaError::NullOwner {
                                member: self.data(current).definition.name(),
                            })?;
                    let data = self.data(current);
                    match data
                        .definition
                        .set_value(&owner, data.index_in_owner, value)?
                    {
                        WriteOutcome::Applied => return Ok(()),
                        WriteOutcome::ReplaceOwner(new_owner) => {
                            current = parent;
                            value = Some(new_owner);
                        }
                    }
                }
            }
        }
    }
}
