use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use kronos_api::Composite;
use kronos_api::schema::FieldDescriptor;

/// Per-type field descriptors, computed on first use and kept for the
/// process lifetime.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeId, Arc<[FieldDescriptor]>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor of `type_id`, derived from `value` when not cached yet.
    pub fn get_or_describe(&self, type_id: TypeId, value: &dyn Composite) -> Arc<[FieldDescriptor]> {
        let cached = match self.entries.read() {
            Ok(g) => g.get(&type_id).cloned(),
            Err(poisoned) => {
                tracing::warn!("descriptor cache read lock was poisoned, recovering");
                poisoned.into_inner().get(&type_id).cloned()
            }
        };
        if let Some(fields) = cached {
            return fields;
        }

        let fields: Arc<[FieldDescriptor]> = value.describe().into();
        let mut guard = match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("descriptor cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        Arc::clone(guard.entry(type_id).or_insert(fields))
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use kronos_api::walk::Walk;

    struct Counting<'a> {
        calls: &'a Cell<u32>,
    }

    impl Composite for Counting<'_> {
        fn describe(&self) -> Vec<FieldDescriptor> {
            self.calls.set(self.calls.get() + 1);
            vec![FieldDescriptor::new("at", "NaiveDateTime")]
        }

        fn has_field(&self, name: &str) -> bool {
            name == "at"
        }

        fn field_mut(&mut self, _name: &str) -> Option<&mut dyn Walk> {
            None
        }
    }

    #[test]
    fn describes_each_type_once() {
        let cache = DescriptorCache::new();
        let calls = Cell::new(0);
        let value = Counting { calls: &calls };
        let id = TypeId::of::<u8>();

        let first = cache.get_or_describe(id, &value);
        let second = cache.get_or_describe(id, &value);
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first[0].name, "at");
        assert_eq!(cache.len(), 1);
    }
}
