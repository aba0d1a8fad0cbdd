// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type schemas and the schema registry.
//!
//! This module is the type-definition cache: [`SchemaRegistry::register`]
//! builds the ordered member list for a host type exactly once, and
//! [`SchemaRegistry::schema_of`] hands the memoized [`TypeSchema`] to every
//! tree and node that mirrors an instance of that type. Member access is
//! captured here as erased closures so the node tree stays
//! reflection-agnostic.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use core::marker::PhantomData;
use hashbrown::HashMap;

use crate::definition::{
    GetValueFn, LabelProvider, Predicate, PropertyDefinition, SetValueFn, Validator, WriteOutcome,
};
use crate::error::SchemaError;
use crate::kind::PropertyKind;
use crate::query::PropertyQuery;
use crate::validate::ValidationResult;
use crate::value::{ErasedValue, ValueList};

/// The memoized schema of one host type: its members in declaration order.
///
/// Consumers rely on the order being stable, since node positions
/// correspond positionally to the external serialized representation.
pub struct TypeSchema {
    type_id: TypeId,
    type_name: &'static str,
    properties: Vec<Arc<PropertyDefinition>>,
    root: Arc<PropertyDefinition>,
    extension_errors: Vec<String>,
}

impl TypeSchema {
    /// Returns the [`TypeId`] of the host type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the host type's registered name.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the member definitions in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[Arc<PropertyDefinition>] {
        &self.properties
    }

    /// Looks up a member definition by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Arc<PropertyDefinition>> {
        self.properties.iter().find(|def| def.name() == name)
    }

    /// Returns the synthetic identity definition used for tree roots.
    ///
    /// Its getter returns the owner itself and its setter replaces it, so
    /// the recursive write loop terminates uniformly at the target cell.
    #[must_use]
    pub fn root_definition(&self) -> &Arc<PropertyDefinition> {
        &self.root
    }

    /// Returns schema-level problems recorded during registration.
    #[must_use]
    pub fn extension_errors(&self) -> &[String] {
        &self.extension_errors
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("type_name", &self.type_name)
            .field(
                "properties",
                &self.properties.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("extension_errors", &self.extension_errors)
            .finish()
    }
}

/// Builds the member list of one host type.
///
/// Handed to the registration closure by [`SchemaRegistry::register`].
/// Each field method appends a definition in declaration order and
/// returns a [`FieldDraft`] for chaining per-member configuration.
pub struct TypeSchemaBuilder<O> {
    type_name: &'static str,
    properties: Vec<PropertyDefinition>,
    _marker: PhantomData<fn() -> O>,
}

impl<O: Clone + PartialEq + 'static> TypeSchemaBuilder<O> {
    fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            properties: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Registers a leaf member.
    pub fn primitive<T, G, S>(&mut self, name: &'static str, get: G, set: S) -> FieldDraft<'_>
    where
        T: Clone + PartialEq + 'static,
        G: Fn(&O) -> T + Send + Sync + 'static,
        S: Fn(&mut O, T) + Send + Sync + 'static,
    {
        let get_fn: GetValueFn = Arc::new(move |owner, _| {
            let owner = downcast_owner::<O>(owner)?;
            Ok(Some(ErasedValue::new(get(owner))))
        });
        let set_fn = by_value_setter::<O, T, _>(name, set);
        self.push(make_definition::<T>(
            name,
            PropertyKind::Primitive,
            get_fn,
            Some(set_fn),
            None,
        ))
    }

    /// Registers a leaf member with no setter.
    ///
    /// Use for computed members; the node is never enabled and writes
    /// fail with [`SchemaError::NotWritable`].
    pub fn primitive_read_only<T, G>(&mut self, name: &'static str, get: G) -> FieldDraft<'_>
    where
        T: Clone + PartialEq + 'static,
        G: Fn(&O) -> T + Send + Sync + 'static,
    {
        let get_fn: GetValueFn = Arc::new(move |owner, _| {
            let owner = downcast_owner::<O>(owner)?;
            Ok(Some(ErasedValue::new(get(owner))))
        });
        self.push(make_definition::<T>(
            name,
            PropertyKind::Primitive,
            get_fn,
            None,
            None,
        ))
    }

    /// Registers a nested aggregate member.
    ///
    /// Children come from `T`'s own registered schema; an unregistered
    /// aggregate type simply yields no children.
    pub fn aggregate<T, G, S>(&mut self, name: &'static str, get: G, set: S) -> FieldDraft<'_>
    where
        T: Clone + PartialEq + 'static,
        G: Fn(&O) -> T + Send + Sync + 'static,
        S: Fn(&mut O, T) + Send + Sync + 'static,
    {
        let get_fn: GetValueFn = Arc::new(move |owner, _| {
            let owner = downcast_owner::<O>(owner)?;
            Ok(Some(ErasedValue::new(get(owner))))
        });
        let set_fn = by_value_setter::<O, T, _>(name, set);
        self.push(make_definition::<T>(
            name,
            PropertyKind::Generic,
            get_fn,
            Some(set_fn),
            None,
        ))
    }

    /// Registers an element-collection member.
    ///
    /// The element kind is resolved at node construction: a registered
    /// schema for `T` makes elements aggregates, otherwise they are
    /// leaves.
    pub fn array<T, G, S>(&mut self, name: &'static str, get: G, set: S) -> FieldDraft<'_>
    where
        T: Clone + PartialEq + 'static,
        G: Fn(&O) -> Vec<T> + Send + Sync + 'static,
        S: Fn(&mut O, Vec<T>) + Send + Sync + 'static,
    {
        let get_fn: GetValueFn = Arc::new(move |owner, _| {
            let owner = downcast_owner::<O>(owner)?;
            let list = get(owner).into_iter().map(ErasedValue::new).collect();
            Ok(Some(ErasedValue::new::<ValueList>(list)))
        });
        let set_fn: SetValueFn = Arc::new(move |owner, _, value| {
            let value = value.ok_or(SchemaError::NullValue { member: name })?;
            let list = downcast_value::<ValueList>(value)?;
            let mut items = Vec::with_capacity(list.len());
            for item in list.into_values() {
                items.push(downcast_value::<T>(item)?);
            }
            let mut owner = downcast_owner::<O>(owner)?.clone();
            set(&mut owner, items);
            Ok(WriteOutcome::ReplaceOwner(ErasedValue::new(owner)))
        });
        let element = Arc::new(element_definition::<T>(name));
        self.push(make_definition::<Vec<T>>(
            name,
            PropertyKind::Array,
            get_fn,
            Some(set_fn),
            Some(element),
        ))
    }

    /// Registers a polymorphic reference member with by-value storage.
    ///
    /// `D` is the declared (interface) type, e.g. `dyn Any`; the runtime
    /// type is read from the value itself. Writes into the referenced
    /// value rebuild the owner and recurse upward.
    pub fn reference<D, G, S>(&mut self, name: &'static str, get: G, set: S) -> FieldDraft<'_>
    where
        D: ?Sized + 'static,
        G: Fn(&O) -> Option<ErasedValue> + Send + Sync + 'static,
        S: Fn(&mut O, Option<ErasedValue>) -> Result<(), SchemaError> + Send + Sync + 'static,
    {
        let get_fn: GetValueFn = Arc::new(move |owner, _| Ok(get(downcast_owner::<O>(owner)?)));
        let set_fn: SetValueFn = Arc::new(move |owner, _, value| {
            let mut owner = downcast_owner::<O>(owner)?.clone();
            set(&mut owner, value)?;
            Ok(WriteOutcome::ReplaceOwner(ErasedValue::new(owner)))
        });
        self.push(make_definition_erased(
            name,
            PropertyKind::Reference,
            TypeId::of::<D>(),
            core::any::type_name::<D>(),
            get_fn,
            Some(set_fn),
            None,
        ))
    }

    /// Registers a polymorphic reference member backed by shared storage.
    ///
    /// The setter writes through interior sharing (an `Rc<RefCell<_>>` or
    /// similar), so the recursive write stops here instead of rebuilding
    /// ancestors.
    pub fn reference_shared<D, G, S>(
        &mut self,
        name: &'static str,
        get: G,
        set: S,
    ) -> FieldDraft<'_>
    where
        D: ?Sized + 'static,
        G: Fn(&O) -> Option<ErasedValue> + Send + Sync + 'static,
        S: Fn(&O, Option<ErasedValue>) -> Result<(), SchemaError> + Send + Sync + 'static,
    {
        let get_fn: GetValueFn = Arc::new(move |owner, _| Ok(get(downcast_owner::<O>(owner)?)));
        let set_fn: SetValueFn = Arc::new(move |owner, _, value| {
            set(downcast_owner::<O>(owner)?, value)?;
            Ok(WriteOutcome::Applied)
        });
        self.push(make_definition_erased(
            name,
            PropertyKind::Reference,
            TypeId::of::<D>(),
            core::any::type_name::<D>(),
            get_fn,
            Some(set_fn),
            None,
        ))
    }

    fn push(&mut self, mut definition: PropertyDefinition) -> FieldDraft<'_> {
        if self
            .properties
            .iter()
            .any(|existing| existing.name == definition.name)
        {
            definition.extension_errors.push(format!(
                "duplicate member '{}' on {}",
                definition.name, self.type_name
            ));
        }
        self.properties.push(definition);
        FieldDraft {
            definition: self.properties.last_mut().unwrap(),
        }
    }

    fn finish(self) -> TypeSchema {
        let type_name = self.type_name;
        let get_fn: GetValueFn = Arc::new(move |owner, _| Ok(Some(owner.clone())));
        let set_fn: SetValueFn = Arc::new(move |_, _, value| {
            value
                .map(WriteOutcome::ReplaceOwner)
                .ok_or(SchemaError::NullValue { member: type_name })
        });
        let root = Arc::new(make_definition_erased(
            type_name,
            PropertyKind::Generic,
            TypeId::of::<O>(),
            core::any::type_name::<O>(),
            get_fn,
            Some(set_fn),
            None,
        ));
        TypeSchema {
            type_id: TypeId::of::<O>(),
            type_name,
            properties: self.properties.into_iter().map(Arc::new).collect(),
            root,
            extension_errors: Vec::new(),
        }
    }
}

impl<O> fmt::Debug for TypeSchemaBuilder<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchemaBuilder")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// Chainable per-member configuration, returned by the field methods of
/// [`TypeSchemaBuilder`].
pub struct FieldDraft<'a> {
    definition: &'a mut PropertyDefinition,
}

impl FieldDraft<'_> {
    /// Marks the member read-only; read-only members are never enabled.
    pub fn read_only(self) -> Self {
        self.definition.read_only = true;
        self
    }

    /// Overrides the tree's depth limit below this member.
    pub fn max_depth(self, depth: usize) -> Self {
        self.definition.max_depth = Some(depth);
        self
    }

    /// Attaches a metadata tag, preserving declaration order.
    pub fn tag<T: core::any::Any + Send + Sync>(self, tag: T) -> Self {
        self.definition.tags.push(Arc::new(tag));
        self
    }

    /// Hides the node whenever the predicate returns `true`.
    pub fn hide_when<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn PropertyQuery) -> bool + Send + Sync + 'static,
    {
        self.definition.hide_when.push(Arc::new(predicate) as Predicate);
        self
    }

    /// Disables the node whenever the predicate returns `true`.
    pub fn disable_when<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn PropertyQuery) -> bool + Send + Sync + 'static,
    {
        self.definition
            .disable_when
            .push(Arc::new(predicate) as Predicate);
        self
    }

    /// Attaches a validator.
    pub fn validate<F>(self, validator: F) -> Self
    where
        F: Fn(&dyn PropertyQuery) -> ValidationResult + Send + Sync + 'static,
    {
        self.definition
            .validators
            .push(Arc::new(validator) as Validator);
        self
    }

    /// Replaces the nicified member name with a custom label.
    pub fn label<F>(self, provider: F) -> Self
    where
        F: Fn(&dyn PropertyQuery) -> String + Send + Sync + 'static,
    {
        self.definition.label = Some(Arc::new(provider) as LabelProvider);
        self
    }

    /// Attaches a tooltip provider.
    pub fn tooltip<F>(self, provider: F) -> Self
    where
        F: Fn(&dyn PropertyQuery) -> String + Send + Sync + 'static,
    {
        self.definition.tooltip = Some(Arc::new(provider) as LabelProvider);
        self
    }
}

impl fmt::Debug for FieldDraft<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDraft")
            .field("name", &self.definition.name)
            .finish()
    }
}

/// The process-scoped cache of type schemas.
///
/// Schemas are registered once, memoized per [`TypeId`], and shared by
/// every tree. After registration the registry is read-only; freeze it
/// behind an `Arc` (or use [`SchemaRegistry::global`] with the `std`
/// feature) to share it.
///
/// # Example
///
/// ```rust
/// use trellis_schema::{PropertyKind, SchemaRegistry};
///
/// #[derive(Clone, PartialEq)]
/// struct Player {
///     name: String,
///     health: i32,
/// }
///
/// let mut registry = SchemaRegistry::new();
/// registry.register::<Player>("Player", |t| {
///     t.primitive("name", |p: &Player| p.name.clone(), |p, v| p.name = v);
///     t.primitive("health", |p: &Player| p.health, |p, v| p.health = v);
/// });
///
/// let schema = registry.schema_for::<Player>().unwrap();
/// assert_eq!(schema.type_name(), "Player");
/// assert_eq!(schema.properties().len(), 2);
/// assert_eq!(schema.properties()[0].name(), "name");
/// assert_eq!(
///     schema.properties()[1].declared_kind(),
///     PropertyKind::Primitive
/// );
/// ```
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: HashMap<TypeId, Arc<TypeSchema>>,
    extension_errors: Vec<String>,
}

impl SchemaRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host type, building its member list once.
    ///
    /// Registering a type twice keeps the first schema and records an
    /// extension error; partially broken registrations degrade rather
    /// than abort.
    pub fn register<T: Clone + PartialEq + 'static>(
        &mut self,
        type_name: &'static str,
        build: impl FnOnce(&mut TypeSchemaBuilder<T>),
    ) -> Arc<TypeSchema> {
        if let Some(existing) = self.schemas.get(&TypeId::of::<T>()) {
            self.extension_errors
                .push(format!("type '{type_name}' is already registered"));
            return existing.clone();
        }

        let mut builder = TypeSchemaBuilder::new(type_name);
        build(&mut builder);
        let schema = Arc::new(builder.finish());
        self.schemas.insert(TypeId::of::<T>(), schema.clone());
        schema
    }

    /// Returns the memoized schema for a type id.
    #[must_use]
    pub fn schema_of(&self, type_id: TypeId) -> Option<&Arc<TypeSchema>> {
        self.schemas.get(&type_id)
    }

    /// Returns the memoized schema for `T`.
    #[must_use]
    pub fn schema_for<T: 'static>(&self) -> Option<&Arc<TypeSchema>> {
        self.schema_of(TypeId::of::<T>())
    }

    /// Returns the number of registered types.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Resolves the kind a node bound to `definition` should take.
    ///
    /// The serialized source's reported kind wins when present. Array
    /// element kinds depend on whether the element type has a schema;
    /// everything else uses the declared kind.
    #[must_use]
    pub fn effective_kind(
        &self,
        definition: &PropertyDefinition,
        reported: Option<PropertyKind>,
    ) -> PropertyKind {
        if let Some(kind) = reported {
            return kind;
        }
        if definition.is_array_element() && self.schema_of(definition.declared_type()).is_some() {
            return PropertyKind::Generic;
        }
        definition.declared_kind()
    }

    /// Returns registration problems recorded by this registry.
    #[must_use]
    pub fn extension_errors(&self) -> &[String] {
        &self.extension_errors
    }

    /// Returns the process-wide registry, constructing it on first use.
    ///
    /// The first caller's `init` closure populates the registry; later
    /// `init` closures are ignored (single-writer-wins). Hosts that need
    /// multiple registries, or `no_std` hosts, construct
    /// [`SchemaRegistry::new`] values and share them explicitly instead.
    #[cfg(feature = "std")]
    pub fn global(init: impl FnOnce(&mut Self)) -> &'static Self {
        static GLOBAL: std::sync::OnceLock<SchemaRegistry> = std::sync::OnceLock::new();
        GLOBAL.get_or_init(|| {
            let mut registry = Self::new();
            init(&mut registry);
            registry
        })
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("count", &self.schemas.len())
            .field(
                "types",
                &self
                    .schemas
                    .values()
                    .map(|s| s.type_name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn downcast_owner<O: 'static>(owner: &ErasedValue) -> Result<&O, SchemaError> {
    owner.downcast_ref::<O>().ok_or(SchemaError::TypeMismatch {
        expected: core::any::type_name::<O>(),
        found: owner.type_name(),
    })
}

fn downcast_value<T: 'static>(value: ErasedValue) -> Result<T, SchemaError> {
    value.downcast::<T>().map_err(|value| SchemaError::TypeMismatch {
        expected: core::any::type_name::<T>(),
        found: value.type_name(),
    })
}

fn by_value_setter<O, T, S>(name: &'static str, set: S) -> SetValueFn
where
    O: Clone + PartialEq + 'static,
    T: Clone + PartialEq + 'static,
    S: Fn(&mut O, T) + Send + Sync + 'static,
{
    Arc::new(move |owner, _, value| {
        let value = value.ok_or(SchemaError::NullValue { member: name })?;
        let value = downcast_value::<T>(value)?;
        let mut owner = downcast_owner::<O>(owner)?.clone();
        set(&mut owner, value);
        Ok(WriteOutcome::ReplaceOwner(ErasedValue::new(owner)))
    })
}

fn make_definition<T: 'static>(
    name: &'static str,
    kind: PropertyKind,
    get: GetValueFn,
    set: Option<SetValueFn>,
    element: Option<Arc<PropertyDefinition>>,
) -> PropertyDefinition {
    make_definition_erased(
        name,
        kind,
        TypeId::of::<T>(),
        core::any::type_name::<T>(),
        get,
        set,
        element,
    )
}

fn make_definition_erased(
    name: &'static str,
    kind: PropertyKind,
    declared_type: TypeId,
    declared_type_name: &'static str,
    get: GetValueFn,
    set: Option<SetValueFn>,
    element: Option<Arc<PropertyDefinition>>,
) -> PropertyDefinition {
    PropertyDefinition {
        name,
        declared_kind: kind,
        declared_type,
        declared_type_name,
        element,
        is_array_element: false,
        read_only: false,
        max_depth: None,
        tags: Vec::new(),
        hide_when: Vec::new(),
        disable_when: Vec::new(),
        validators: Vec::new(),
        label: None,
        tooltip: None,
        get,
        set,
        extension_errors: Vec::new(),
    }
}

/// The shared definition for the elements of one array member.
fn element_definition<T: Clone + PartialEq + 'static>(name: &'static str) -> PropertyDefinition {
    let get_fn: GetValueFn = Arc::new(move |owner, index| {
        let list = downcast_owner::<ValueList>(owner)?;
        let item = list.get(index).ok_or(SchemaError::IndexOutOfRange {
            index,
            len: list.len(),
        })?;
        Ok(Some(item.clone()))
    });
    let set_fn: SetValueFn = Arc::new(move |owner, index, value| {
        let value = value.ok_or(SchemaError::NullValue { member: name })?;
        let mut list = downcast_owner::<ValueList>(owner)?.clone();
        let len = list.len();
        if !list.set(index, value) {
            return Err(SchemaError::IndexOutOfRange { index, len });
        }
        Ok(WriteOutcome::ReplaceOwner(ErasedValue::new(list)))
    });
    let mut definition = make_definition::<T>(name, PropertyKind::Primitive, get_fn, Some(set_fn), None);
    definition.is_array_element = true;
    definition
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[derive(Clone, PartialEq)]
    struct Point {
        x: f64,
        y: f64,
    }

    #[derive(Clone, PartialEq)]
    struct Shape {
        origin: Point,
        vertices: Vec<f64>,
    }

    fn register_shape(registry: &mut SchemaRegistry) {
        registry.register::<Point>("Point", |t| {
            t.primitive("x", |p: &Point| p.x, |p, v| p.x = v);
            t.primitive("y", |p: &Point| p.y, |p, v| p.y = v);
        });
        registry.register::<Shape>("Shape", |t| {
            t.aggregate("origin", |s: &Shape| s.origin.clone(), |s, v| s.origin = v);
            t.array("vertices", |s: &Shape| s.vertices.clone(), |s, v| s.vertices = v);
        });
    }

    #[test]
    fn registration_preserves_order() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);

        let schema = registry.schema_for::<Shape>().unwrap();
        let names: Vec<_> = schema.properties().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["origin", "vertices"]);
    }

    #[test]
    fn schema_lookup() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);

        assert!(registry.schema_for::<Point>().is_some());
        assert!(registry.schema_for::<Shape>().is_some());
        assert!(registry.schema_for::<i32>().is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_type_keeps_first() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Point>("Point", |t| {
            t.primitive("x", |p: &Point| p.x, |p, v| p.x = v);
        });
        let second = registry.register::<Point>("Point", |t| {
            t.primitive("x", |p: &Point| p.x, |p, v| p.x = v);
            t.primitive("y", |p: &Point| p.y, |p, v| p.y = v);
        });

        // First registration wins; the conflict is recorded, not fatal.
        assert_eq!(second.properties().len(), 1);
        assert_eq!(registry.extension_errors().len(), 1);
    }

    #[test]
    fn duplicate_member_records_extension_error() {
        let mut registry = SchemaRegistry::new();
        let schema = registry.register::<Point>("Point", |t| {
            t.primitive("x", |p: &Point| p.x, |p, v| p.x = v);
            t.primitive("x", |p: &Point| p.y, |p, v| p.y = v);
        });

        assert_eq!(schema.properties().len(), 2);
        assert!(schema.properties()[0].extension_errors().is_empty());
        assert_eq!(schema.properties()[1].extension_errors().len(), 1);
        assert!(schema.properties()[1].extension_errors()[0].contains("duplicate"));
    }

    #[test]
    fn array_member_carries_element_definition() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);

        let schema = registry.schema_for::<Shape>().unwrap();
        let vertices = schema.property("vertices").unwrap();
        assert!(vertices.is_array());

        let element = vertices.element_definition().unwrap();
        assert!(element.is_array_element());
        assert_eq!(element.declared_type(), TypeId::of::<f64>());
    }

    #[test]
    fn element_accessors_index_the_list() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);

        let schema = registry.schema_for::<Shape>().unwrap();
        let element = schema
            .property("vertices")
            .unwrap()
            .element_definition()
            .unwrap()
            .clone();

        let list = ErasedValue::new(ValueList::from_iter(
            [1.0_f64, 2.0, 3.0].map(ErasedValue::new),
        ));
        let second = element.get_value(&list, 1).unwrap().unwrap();
        assert_eq!(second.downcast_ref::<f64>(), Some(&2.0));

        let err = element.get_value(&list, 9).unwrap_err();
        assert_eq!(err, SchemaError::IndexOutOfRange { index: 9, len: 3 });

        match element
            .set_value(&list, 2, Some(ErasedValue::new(9.0_f64)))
            .unwrap()
        {
            WriteOutcome::ReplaceOwner(new_list) => {
                let new_list = new_list.downcast_ref::<ValueList>().unwrap();
                assert_eq!(
                    new_list.get(2).and_then(|v| v.downcast_ref::<f64>()),
                    Some(&9.0)
                );
            }
            WriteOutcome::Applied => panic!("element writes must replace the list"),
        }
    }

    #[test]
    fn effective_kind_resolution() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);
        registry.register::<Vec<Point>>("PointList", |_| {});

        let schema = registry.schema_for::<Shape>().unwrap();
        let origin = schema.property("origin").unwrap();
        let vertices = schema.property("vertices").unwrap();
        let element = vertices.element_definition().unwrap();

        // Declared kinds stand when nothing overrides them.
        assert_eq!(registry.effective_kind(origin, None), PropertyKind::Generic);
        assert_eq!(registry.effective_kind(vertices, None), PropertyKind::Array);

        // f64 has no schema: elements are leaves.
        assert_eq!(
            registry.effective_kind(element, None),
            PropertyKind::Primitive
        );

        // A reported kind always wins.
        assert_eq!(
            registry.effective_kind(origin, Some(PropertyKind::Reference)),
            PropertyKind::Reference
        );
    }

    #[test]
    fn element_kind_becomes_generic_when_registered() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);

        #[derive(Clone, PartialEq)]
        struct Path {
            points: Vec<Point>,
        }
        let schema = registry.register::<Path>("Path", |t| {
            t.array("points", |p: &Path| p.points.clone(), |p, v| p.points = v);
        });

        let element = schema
            .property("points")
            .unwrap()
            .element_definition()
            .unwrap();
        assert_eq!(
            registry.effective_kind(element, None),
            PropertyKind::Generic
        );
    }

    #[test]
    fn root_definition_is_identity() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);

        let schema = registry.schema_for::<Point>().unwrap();
        let root = schema.root_definition();

        let owner = ErasedValue::new(Point { x: 1.0, y: 2.0 });
        let value = root.get_value(&owner, 0).unwrap().unwrap();
        assert!(value.is::<Point>());

        let replacement = ErasedValue::new(Point { x: 3.0, y: 4.0 });
        match root.set_value(&owner, 0, Some(replacement)).unwrap() {
            WriteOutcome::ReplaceOwner(new_owner) => {
                assert_eq!(new_owner.downcast_ref::<Point>().map(|p| p.x), Some(3.0));
            }
            WriteOutcome::Applied => panic!("root writes must replace the target"),
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn global_registry_first_writer_wins() {
        let first = SchemaRegistry::global(|r| {
            r.register::<Point>("Point", |t| {
                t.primitive("x", |p: &Point| p.x, |p, v| p.x = v);
            });
        });
        // A second initializer is ignored; the same instance comes back.
        let second = SchemaRegistry::global(|r| {
            r.register::<Shape>("Shape", |_| {});
        });
        assert!(core::ptr::eq(first, second));
        assert!(second.schema_for::<Point>().is_some());
        assert!(second.schema_for::<Shape>().is_none());
    }

    #[test]
    fn registry_debug() {
        let mut registry = SchemaRegistry::new();
        register_shape(&mut registry);

        let debug = alloc::format!("{:?}", registry);
        assert!(debug.contains("SchemaRegistry"));
        assert!(debug.contains("Point"));
    }
}
