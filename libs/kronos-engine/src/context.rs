use std::any::TypeId;
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use kronos_api::Zone;

/// Identity of a node: its address and runtime type.
///
/// The type is part of the identity because a struct and its first field
/// share an address.
pub type NodeId = (usize, TypeId);

/// State of one traversal.
///
/// Created per top-level call and never shared. `visited` holds the nodes
/// on the current recursion path only: siblings that share a child are
/// both converted, a node that reaches one of its ancestors is not.
#[derive(Debug)]
pub struct ConversionContext {
    from: Zone,
    to: Zone,
    default_format: Arc<str>,
    visited: HashSet<NodeId>,
}

impl ConversionContext {
    pub fn new(from: Zone, to: Zone, default_format: Arc<str>) -> Self {
        Self {
            from,
            to,
            default_format,
            visited: HashSet::new(),
        }
    }

    pub fn from(&self) -> &Zone {
        &self.from
    }

    pub fn to(&self) -> &Zone {
        &self.to
    }

    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// Depth of the current recursion path.
    pub fn depth(&self) -> usize {
        self.visited.len()
    }

    /// Put `id` on the recursion path until the returned guard is dropped.
    ///
    /// `None` when `id` is already on the path.
    pub fn enter(&mut self, id: NodeId) -> Option<PathGuard<'_>> {
        if !self.visited.insert(id) {
            return None;
        }
        Some(PathGuard { ctx: self, id })
    }
}

/// A node on the recursion path. Removed on drop, unwinding included.
pub struct PathGuard<'a> {
    ctx: &'a mut ConversionContext,
    id: NodeId,
}

impl Deref for PathGuard<'_> {
    type Target = ConversionContext;

    fn deref(&self) -> &ConversionContext {
        self.ctx
    }
}

impl DerefMut for PathGuard<'_> {
    fn deref_mut(&mut self) -> &mut ConversionContext {
        self.ctx
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.ctx.visited.remove(&self.id);
    }
}
