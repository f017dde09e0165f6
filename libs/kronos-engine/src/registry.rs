use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kronos_api::walk::Walk;
use kronos_api::{TypeConverter, Zone};

use crate::converters;

/// Type-erased leaf converter, stored in the registry.
pub trait ErasedConverter: Send + Sync {
    /// Name of the converted type, for logs.
    fn type_name(&self) -> &'static str;

    fn requires_marker(&self) -> bool;

    /// Convert `value` in place. Returns `false` when `value` is not of the
    /// converter's type.
    fn convert_in_place(&self, value: &mut dyn Walk, from: &Zone, to: &Zone, format: &str) -> bool;
}

struct Typed<T, C> {
    converter: C,
    _type: PhantomData<fn() -> T>,
}

impl<T, C> ErasedConverter for Typed<T, C>
where
    T: Walk,
    C: TypeConverter<T>,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn requires_marker(&self) -> bool {
        self.converter.requires_marker()
    }

    fn convert_in_place(&self, value: &mut dyn Walk, from: &Zone, to: &Zone, format: &str) -> bool {
        match value.as_any_mut().downcast_mut::<T>() {
            Some(v) => {
                *v = self.converter.convert(v, from, to, format);
                true
            }
            None => false,
        }
    }
}

/// A converter paired with the type it handles, ready to be registered.
#[derive(Clone)]
pub struct ConverterEntry {
    type_id: TypeId,
    converter: Arc<dyn ErasedConverter>,
}

impl ConverterEntry {
    pub fn new<T, C>(converter: C) -> Self
    where
        T: Walk,
        C: TypeConverter<T> + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            converter: Arc::new(Typed {
                converter,
                _type: PhantomData,
            }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.converter.type_name()
    }
}

impl std::fmt::Debug for ConverterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ConverterEntry").field(&self.type_name()).finish()
    }
}

/// Exact runtime type → leaf converter.
///
/// Read on every leaf of every traversal; written at start-up. A miss
/// means the value is not a leaf.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: RwLock<HashMap<TypeId, Arc<dyn ErasedConverter>>>,
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.read();
        let mut names: Vec<_> = guard.values().map(|c| c.type_name()).collect();
        names.sort_unstable();
        f.debug_struct("ConverterRegistry").field("types", &names).finish()
    }
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in converters.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for entry in converters::builtin() {
            registry.insert(entry);
        }
        registry
    }

    /// Register `converter` for exactly `T`, replacing any previous one.
    pub fn register<T, C>(&self, converter: C)
    where
        T: Walk,
        C: TypeConverter<T> + 'static,
    {
        self.insert(ConverterEntry::new::<T, C>(converter));
    }

    pub fn insert(&self, entry: ConverterEntry) {
        let replaced = self.write().insert(entry.type_id, entry.converter.clone()).is_some();
        tracing::debug!(r#type = entry.type_name(), replaced, "registered converter");
    }

    pub fn lookup(&self, type_id: TypeId) -> Option<Arc<dyn ErasedConverter>> {
        self.read().get(&type_id).cloned()
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.read().contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Arc<dyn ErasedConverter>>> {
        match self.converters.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("converter registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Arc<dyn ErasedConverter>>> {
        match self.converters.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("converter registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
