// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! External collaborator traits.
//!
//! A [`PropertyTree`](crate::PropertyTree) can be synchronized against an
//! external serialized representation and wrapped in a host transaction
//! system. Both are optional; the tree consumes them only through the
//! traits in this module.

use trellis_schema::PropertyKind;

use crate::tree::SharedTarget;

/// An external serialized representation of the edited targets.
///
/// When attached, the source's reported kinds participate in node kind
/// resolution, expansion state persists through the source instead of the
/// tree's session map, and the mutation protocol brackets every write
/// with [`apply_pending`](Self::apply_pending) and
/// [`synchronize`](Self::synchronize).
pub trait SerializedSource {
    /// Reports the kind of the property at `path`, if the serialized
    /// representation knows it.
    ///
    /// A reported kind overrides the declared kind when the node is
    /// constructed.
    fn reported_kind(&self, path: &str) -> Option<PropertyKind> {
        let _ = path;
        None
    }

    /// Returns the persisted expansion flag for `path`.
    fn is_expanded(&self, path: &str) -> bool;

    /// Persists the expansion flag for `path`.
    fn set_expanded(&mut self, path: &str, expanded: bool);

    /// Flushes edits pending in the serialized representation into the
    /// target instances.
    ///
    /// Called at the start of every write, before the undo group opens.
    fn apply_pending(&mut self, targets: &mut [SharedTarget]);

    /// Re-reads the serialized representation from the target instances.
    ///
    /// Called after every write, before the tree re-reads its caches.
    fn synchronize(&mut self, targets: &[SharedTarget]);
}

/// The host's undo transaction primitive.
///
/// The mutation protocol opens one group per logical write, covering
/// every target instance.
pub trait UndoScope {
    /// Opens an undo group labeled with the written property's path.
    fn begin_group(&mut self, label: &str);
}
