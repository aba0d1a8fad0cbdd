// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Tree: a reflective property tree over live object graphs.
//!
//! This crate mirrors one or more target instances of a registered type
//! (see `trellis_schema`) as a tree of addressable, cacheable,
//! mutation-safe nodes — the core of an editor inspector. The
//! surrounding GUI is an external collaborator: it drives the tree once
//! per frame and renders what the tree reports.
//!
//! ## Core Concepts
//!
//! ### Nodes and the frame token
//!
//! Every member, nested aggregate, polymorphic reference, and array
//! element is a node, identified by a generational [`NodeId`]. Node
//! caches refresh lazily: a cache is stale once the tree's frame token
//! advances, and reads within one frame return identical values and
//! identical child identities.
//!
//! ### Multi-target editing
//!
//! A tree edits `N >= 1` instances at once. Reads merge the targets:
//! primitives report a mixed flag when targets disagree, arrays display
//! the shortest non-null element list, references go null when runtime
//! types diverge. Writes apply to every target inside one undo group.
//!
//! ### The mutation protocol
//!
//! [`PropertyTree::set_value`] / [`PropertyTree::set_values`] are the
//! only mutation entry points; [`ChangeNotice`] and [`ChangeKind`] carry
//! the two-tier change notifications to observers.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis_schema::{ErasedValue, SchemaRegistry};
//! use trellis_tree::{PropertyTree, share_target};
//!
//! #[derive(Clone, PartialEq)]
//! struct Inventory {
//!     count: i32,
//!     items: Vec<i32>,
//! }
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register::<Inventory>("Inventory", |t| {
//!     t.primitive("count", |v: &Inventory| v.count, |v, x| v.count = x);
//!     t.array("items", |v: &Inventory| v.items.clone(), |v, x| v.items = x);
//! });
//! let registry = Arc::new(registry);
//!
//! let target = share_target(ErasedValue::new(Inventory {
//!     count: 2,
//!     items: vec![10, 20],
//! }));
//! let mut tree = PropertyTree::new(registry, vec![target.clone()]).unwrap();
//!
//! // Drive one frame: update, then read.
//! tree.update(false);
//! let root = tree.root();
//! let count = tree.children(root)[0];
//! let items = tree.children(root)[1];
//! assert_eq!(
//!     tree.value(count).and_then(|v| v.downcast_ref::<i32>()),
//!     Some(&2)
//! );
//! assert_eq!(tree.array_elements(items).len(), 2);
//!
//! // Writes go through the tree and land in the shared target.
//! tree.set_primitive(count, 5).unwrap();
//! let edited = target.borrow();
//! assert_eq!(edited.downcast_ref::<Inventory>().unwrap().count, 5);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod host;
mod node;
mod tree;
mod write;

pub use host::{SerializedSource, UndoScope};
pub use node::NodeId;
pub use tree::{
    DEFAULT_MAX_DEPTH, PropertyTree, SharedTarget, TreeError, share_target,
};
pub use write::{ChangeKind, ChangeNotice, ObserverId};
