use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::error::KronosError;
use crate::schema::Composite;
use crate::zone::{Zone, ZonedDateTime};

/// Runtime type access for walkable values.
///
/// Blanket-implemented for every `'static` type; the walker uses it to
/// look converters up by the exact runtime type of a node.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// `TypeId` of the concrete value behind a `dyn Walk`.
pub fn runtime_type(value: &dyn Walk) -> TypeId {
    Any::type_id(value.as_any())
}

/// Traversal classification of a node, without borrowing its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `None`, JSON `null`.
    Null,
    /// No children: primitives, enums, foreign values, temporal leaves.
    Scalar,
    /// Wrapper around exactly one child (`Some`, `Box`, JSON string).
    Transparent,
    /// Ordered sequence.
    Sequence,
    /// Unordered set; elements are re-inserted after conversion.
    Set,
    /// Key → value map; only values are visited.
    Map,
    /// Fixed-size array.
    Array,
    /// Struct with a field descriptor.
    Composite,
    /// Node reachable through shared ownership; may close a cycle.
    Shared,
}

impl NodeKind {
    /// Nodes that can hold temporal values further down.
    pub fn has_children(self) -> bool {
        matches!(
            self,
            NodeKind::Sequence
                | NodeKind::Set
                | NodeKind::Map
                | NodeKind::Array
                | NodeKind::Composite
                | NodeKind::Shared
        )
    }
}

/// Borrowed view of a node's children.
pub enum Shape<'a> {
    Null,
    Scalar,
    Transparent(&'a mut dyn Walk),
    Sequence(Vec<&'a mut dyn Walk>),
    Set(&'a mut dyn SetNode),
    Map(Vec<&'a mut dyn Walk>),
    Array(Vec<&'a mut dyn Walk>),
    Composite(&'a mut dyn Composite),
    Shared(&'a dyn SharedNode),
}

/// A value the conversion walker can traverse.
///
/// Implementations describe structure only: whether a node is null, a
/// leaf, or a container, and how to reach its children. Which leaves
/// get converted is decided at runtime by the converter registry, keyed
/// by the concrete type, so the set of temporal types stays open.
///
/// Implemented for primitives, `String`, chrono and std time types,
/// std collections, `Option`, `Box`, tuples, `Rc<RefCell<_>>`,
/// `Arc<Mutex<_>>`, `Arc<RwLock<_>>` and `serde_json::Value`.
/// User structs derive it with `#[derive(Temporal)]`; custom leaf types
/// use [`impl_walk_opaque!`](crate::impl_walk_opaque).
pub trait Walk: AsAny {
    fn kind(&self) -> NodeKind;

    fn shape(&mut self) -> Shape<'_>;

    /// The wrapped child of a `Transparent` node.
    fn inner(&self) -> Option<&dyn Walk> {
        None
    }

    /// `true` for primitive types that can never hold temporal data;
    /// containers of them are skipped entirely.
    fn is_scalar() -> bool
    where
        Self: Sized,
    {
        false
    }
}

/// Unordered collection whose elements must be removed and re-inserted
/// to be changed.
pub trait SetNode {
    /// Visit every element, keeping the collection itself.
    fn refill(&mut self, visit: &mut dyn FnMut(&mut dyn Walk));
}

/// Interior-mutable node behind shared ownership.
pub trait SharedNode {
    /// Address of the shared allocation: the node's identity.
    fn address(&self) -> usize;

    /// Borrow the node mutably for the duration of `visit`.
    fn with_mut(&self, visit: &mut dyn FnMut(&mut dyn Walk)) -> Result<(), KronosError>;
}

/// Implement [`Walk`] for leaf types without children.
///
/// The walker only converts such values when a converter is registered
/// for the exact type.
#[macro_export]
macro_rules! impl_walk_opaque {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::walk::Walk for $ty {
            fn kind(&self) -> $crate::walk::NodeKind {
                $crate::walk::NodeKind::Scalar
            }

            fn shape(&mut self) -> $crate::walk::Shape<'_> {
                $crate::walk::Shape::Scalar
            }
        }
    )*};
}

macro_rules! impl_walk_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Walk for $ty {
            fn kind(&self) -> NodeKind {
                NodeKind::Scalar
            }

            fn shape(&mut self) -> Shape<'_> {
                Shape::Scalar
            }

            fn is_scalar() -> bool {
                true
            }
        }
    )*};
}

impl_walk_scalar!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, (),
    &'static str,
);

impl_walk_opaque!(
    String,
    NaiveDateTime,
    NaiveDate,
    NaiveTime,
    TimeDelta,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    DateTime<chrono_tz::Tz>,
    FixedOffset,
    chrono_tz::Tz,
    SystemTime,
    std::time::Duration,
    Zone,
    ZonedDateTime,
);

// ═══════════════════════════════════════════════════════════════
//  Wrappers
// ═══════════════════════════════════════════════════════════════

impl<T: Walk> Walk for Option<T> {
    fn kind(&self) -> NodeKind {
        match self {
            None => NodeKind::Null,
            Some(_) => NodeKind::Transparent,
        }
    }

    fn shape(&mut self) -> Shape<'_> {
        match self {
            None => Shape::Null,
            Some(value) => Shape::Transparent(value),
        }
    }

    fn inner(&self) -> Option<&dyn Walk> {
        self.as_ref().map(|v| v as &dyn Walk)
    }
}

impl<T: Walk> Walk for Box<T> {
    fn kind(&self) -> NodeKind {
        NodeKind::Transparent
    }

    fn shape(&mut self) -> Shape<'_> {
        Shape::Transparent(&mut **self)
    }

    fn inner(&self) -> Option<&dyn Walk> {
        Some(&**self)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sequences and arrays
// ═══════════════════════════════════════════════════════════════

macro_rules! impl_walk_sequence {
    ($($seq:ident),*) => {$(
        impl<T: Walk> Walk for $seq<T> {
            fn kind(&self) -> NodeKind {
                if T::is_scalar() { NodeKind::Scalar } else { NodeKind::Sequence }
            }

            fn shape(&mut self) -> Shape<'_> {
                if T::is_scalar() {
                    return Shape::Scalar;
                }
                Shape::Sequence(self.iter_mut().map(|v| v as &mut dyn Walk).collect())
            }
        }
    )*};
}

impl_walk_sequence!(Vec, VecDeque, LinkedList);

impl<T: Walk, const N: usize> Walk for [T; N] {
    fn kind(&self) -> NodeKind {
        if T::is_scalar() { NodeKind::Scalar } else { NodeKind::Array }
    }

    fn shape(&mut self) -> Shape<'_> {
        if T::is_scalar() {
            return Shape::Scalar;
        }
        Shape::Array(self.iter_mut().map(|v| v as &mut dyn Walk).collect())
    }
}

impl<T: Walk> Walk for Box<[T]> {
    fn kind(&self) -> NodeKind {
        if T::is_scalar() { NodeKind::Scalar } else { NodeKind::Array }
    }

    fn shape(&mut self) -> Shape<'_> {
        if T::is_scalar() {
            return Shape::Scalar;
        }
        Shape::Array(self.iter_mut().map(|v| v as &mut dyn Walk).collect())
    }
}

macro_rules! impl_walk_tuple {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Walk),+> Walk for ($($name,)+) {
            fn kind(&self) -> NodeKind {
                NodeKind::Sequence
            }

            fn shape(&mut self) -> Shape<'_> {
                Shape::Sequence(vec![$(&mut self.$idx as &mut dyn Walk),+])
            }
        }
    };
}

impl_walk_tuple!(A.0);
impl_walk_tuple!(A.0, B.1);
impl_walk_tuple!(A.0, B.1, C.2);
impl_walk_tuple!(A.0, B.1, C.2, D.3);
impl_walk_tuple!(A.0, B.1, C.2, D.3, E.4);
impl_walk_tuple!(A.0, B.1, C.2, D.3, E.4, F.5);

// ═══════════════════════════════════════════════════════════════
//  Sets
// ═══════════════════════════════════════════════════════════════

impl<T, S> SetNode for HashSet<T, S>
where
    T: Walk + Eq + Hash,
    S: BuildHasher + 'static,
{
    fn refill(&mut self, visit: &mut dyn FnMut(&mut dyn Walk)) {
        let items: Vec<T> = self.drain().collect();
        for mut item in items {
            visit(&mut item);
            self.insert(item);
        }
    }
}

impl<T, S> Walk for HashSet<T, S>
where
    T: Walk + Eq + Hash,
    S: BuildHasher + 'static,
{
    fn kind(&self) -> NodeKind {
        if T::is_scalar() { NodeKind::Scalar } else { NodeKind::Set }
    }

    fn shape(&mut self) -> Shape<'_> {
        if T::is_scalar() {
            return Shape::Scalar;
        }
        Shape::Set(self)
    }
}

impl<T: Walk + Ord> SetNode for BTreeSet<T> {
    fn refill(&mut self, visit: &mut dyn FnMut(&mut dyn Walk)) {
        let items = std::mem::take(self);
        for mut item in items {
            visit(&mut item);
            self.insert(item);
        }
    }
}

impl<T: Walk + Ord> Walk for BTreeSet<T> {
    fn kind(&self) -> NodeKind {
        if T::is_scalar() { NodeKind::Scalar } else { NodeKind::Set }
    }

    fn shape(&mut self) -> Shape<'_> {
        if T::is_scalar() {
            return Shape::Scalar;
        }
        Shape::Set(self)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Maps: keys are identifiers, only values are visited
// ═══════════════════════════════════════════════════════════════

impl<K: 'static, V: Walk, S: 'static> Walk for HashMap<K, V, S> {
    fn kind(&self) -> NodeKind {
        if V::is_scalar() { NodeKind::Scalar } else { NodeKind::Map }
    }

    fn shape(&mut self) -> Shape<'_> {
        if V::is_scalar() {
            return Shape::Scalar;
        }
        Shape::Map(self.values_mut().map(|v| v as &mut dyn Walk).collect())
    }
}

impl<K: 'static, V: Walk> Walk for BTreeMap<K, V> {
    fn kind(&self) -> NodeKind {
        if V::is_scalar() { NodeKind::Scalar } else { NodeKind::Map }
    }

    fn shape(&mut self) -> Shape<'_> {
        if V::is_scalar() {
            return Shape::Scalar;
        }
        Shape::Map(self.values_mut().map(|v| v as &mut dyn Walk).collect())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Shared nodes: the only way to build a cycle
// ═══════════════════════════════════════════════════════════════

impl<T: Walk> SharedNode for Rc<RefCell<T>> {
    fn address(&self) -> usize {
        Rc::as_ptr(self) as *const () as usize
    }

    fn with_mut(&self, visit: &mut dyn FnMut(&mut dyn Walk)) -> Result<(), KronosError> {
        let mut guard = self.try_borrow_mut().map_err(|_| {
            KronosError::access(format!("{} is already borrowed", std::any::type_name::<T>()))
        })?;
        visit(&mut *guard);
        Ok(())
    }
}

impl<T: Walk> SharedNode for Arc<Mutex<T>> {
    fn address(&self) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }

    fn with_mut(&self, visit: &mut dyn FnMut(&mut dyn Walk)) -> Result<(), KronosError> {
        let mut guard = self.lock().map_err(|_| {
            KronosError::access(format!("{} lock is poisoned", std::any::type_name::<T>()))
        })?;
        visit(&mut *guard);
        Ok(())
    }
}

impl<T: Walk> SharedNode for Arc<RwLock<T>> {
    fn address(&self) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }

    fn with_mut(&self, visit: &mut dyn FnMut(&mut dyn Walk)) -> Result<(), KronosError> {
        let mut guard = self.write().map_err(|_| {
            KronosError::access(format!("{} lock is poisoned", std::any::type_name::<T>()))
        })?;
        visit(&mut *guard);
        Ok(())
    }
}

macro_rules! impl_walk_shared {
    ($($ptr:ident < $cell:ident >),*) => {$(
        impl<T: Walk> Walk for $ptr<$cell<T>> {
            fn kind(&self) -> NodeKind {
                NodeKind::Shared
            }

            fn shape(&mut self) -> Shape<'_> {
                Shape::Shared(&*self)
            }
        }
    )*};
}

impl_walk_shared!(Rc<RefCell>, Arc<Mutex>, Arc<RwLock>);

// ═══════════════════════════════════════════════════════════════
//  JSON documents
// ═══════════════════════════════════════════════════════════════

impl Walk for serde_json::Value {
    fn kind(&self) -> NodeKind {
        use serde_json::Value;
        match self {
            Value::Null => NodeKind::Null,
            Value::Bool(_) | Value::Number(_) => NodeKind::Scalar,
            Value::String(_) => NodeKind::Transparent,
            Value::Array(_) => NodeKind::Sequence,
            Value::Object(_) => NodeKind::Map,
        }
    }

    fn shape(&mut self) -> Shape<'_> {
        use serde_json::Value;
        match self {
            Value::Null => Shape::Null,
            Value::Bool(_) | Value::Number(_) => Shape::Scalar,
            Value::String(s) => Shape::Transparent(s),
            Value::Array(items) => Shape::Sequence(items.iter_mut().map(|v| v as &mut dyn Walk).collect()),
            Value::Object(map) => Shape::Map(map.values_mut().map(|v| v as &mut dyn Walk).collect()),
        }
    }

    fn inner(&self) -> Option<&dyn Walk> {
        match self {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Walk for serde_json::Map<String, serde_json::Value> {
    fn kind(&self) -> NodeKind {
        NodeKind::Map
    }

    fn shape(&mut self) -> Shape<'_> {
        Shape::Map(self.values_mut().map(|v| v as &mut dyn Walk).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_is_transparent_or_null() {
        let mut some = Some(String::from("x"));
        let none: Option<String> = None;
        assert_eq!(some.kind(), NodeKind::Transparent);
        assert_eq!(none.kind(), NodeKind::Null);
        assert_eq!(runtime_type(some.inner().unwrap()), TypeId::of::<String>());
        assert!(matches!(some.shape(), Shape::Transparent(_)));
    }

    #[test]
    fn primitive_containers_are_skipped() {
        let mut numbers = vec![1, 2, 3];
        let mut flags: HashMap<String, bool> = HashMap::new();
        assert_eq!(numbers.kind(), NodeKind::Scalar);
        assert!(matches!(numbers.shape(), Shape::Scalar));
        assert!(matches!(flags.shape(), Shape::Scalar));
        assert_eq!([0u8; 4].kind(), NodeKind::Scalar);
    }

    #[test]
    fn string_containers_are_walked() {
        let mut names = vec![String::from("a"), String::from("b")];
        match names.shape() {
            Shape::Sequence(items) => assert_eq!(items.len(), 2),
            _ => panic!("expected a sequence"),
        }
    }

    #[test]
    fn boxed_slices_are_arrays() {
        let mut days: Box<[NaiveDate]> = vec![NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(); 3].into_boxed_slice();
        assert_eq!(days.kind(), NodeKind::Array);
        match days.shape() {
            Shape::Array(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected an array"),
        }
        let bytes: Box<[u8]> = Box::new([1, 2]);
        assert_eq!(bytes.kind(), NodeKind::Scalar);
    }

    #[test]
    fn runtime_type_sees_through_dyn() {
        let value: Box<dyn Walk> = Box::new(NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
        assert_eq!(runtime_type(value.as_ref()), TypeId::of::<NaiveDate>());
    }

    #[test]
    fn set_refill_keeps_collection() {
        let mut set: BTreeSet<String> = ["b", "a"].into_iter().map(String::from).collect();
        set.refill(&mut |item| {
            if let Some(s) = item.as_any_mut().downcast_mut::<String>() {
                s.push('!');
            }
        });
        assert_eq!(set.into_iter().collect::<Vec<_>>(), ["a!", "b!"]);
    }

    #[test]
    fn shared_nodes_report_allocation_address() {
        let node = Rc::new(RefCell::new(String::from("x")));
        let alias = Rc::clone(&node);
        assert_eq!(node.address(), alias.address());

        let _held = node.borrow();
        let err = alias.with_mut(&mut |_| {}).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Access);
    }

    #[test]
    fn json_strings_are_transparent() {
        let mut doc = serde_json::json!({ "at": "2025-05-20 10:00:00", "n": 1, "none": null });
        assert_eq!(doc.kind(), NodeKind::Map);
        match doc.shape() {
            Shape::Map(values) => {
                let kinds: Vec<_> = values.iter().map(|v| v.kind()).collect();
                assert!(kinds.contains(&NodeKind::Transparent));
                assert!(kinds.contains(&NodeKind::Scalar));
                assert!(kinds.contains(&NodeKind::Null));
            }
            _ => panic!("expected a map"),
        }
    }
}
