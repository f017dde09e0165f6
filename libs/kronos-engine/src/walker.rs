use std::any::TypeId;

use kronos_api::Composite;
use kronos_api::walk::{NodeKind, Shape, Walk, runtime_type};

use crate::context::ConversionContext;
use crate::descriptor::DescriptorCache;
use crate::registry::ConverterRegistry;
use crate::selector::{FieldSelector, Selection};

/// Pattern in effect below a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    /// Override from a `#[time(format = "...")]` field; `None` uses the
    /// context default.
    pub format: Option<&'static str>,
}

impl Scope {
    pub const fn with_format(format: Option<&'static str>) -> Self {
        Self { format }
    }
}

/// Depth-first, in-place conversion of an object graph.
///
/// Classification order: null, registered leaf, transparent wrapper, then
/// containers (sequence, set, map, array), composites and shared nodes.
/// Everything else is a scalar and stays untouched. Nothing here fails:
/// nodes that cannot be reached are logged and skipped.
///
/// Every registered leaf the walk reaches is converted. Whether a struct
/// field is reached at all is up to the [`FieldSelector`].
pub struct ObjectWalker<'a> {
    registry: &'a ConverterRegistry,
    descriptors: &'a DescriptorCache,
}

impl<'a> ObjectWalker<'a> {
    pub fn new(registry: &'a ConverterRegistry, descriptors: &'a DescriptorCache) -> Self {
        Self { registry, descriptors }
    }

    pub fn process(&self, value: &mut dyn Walk, ctx: &mut ConversionContext, scope: Scope) {
        let kind = value.kind();
        if kind == NodeKind::Null {
            return;
        }

        let type_id = runtime_type(value);
        if let Some(converter) = self.registry.lookup(type_id) {
            let format = scope.format.unwrap_or(ctx.default_format());
            converter.convert_in_place(value, ctx.from(), ctx.to(), format);
            return;
        }

        match kind {
            NodeKind::Scalar => {}
            NodeKind::Transparent => {
                if let Shape::Transparent(inner) = value.shape() {
                    self.process(inner, ctx, scope);
                }
            }
            _ => self.descend(value, type_id, ctx, scope),
        }
    }

    fn descend(&self, value: &mut dyn Walk, type_id: TypeId, ctx: &mut ConversionContext, scope: Scope) {
        let address = (&raw const *value).cast::<()>() as usize;
        let shape = value.shape();
        let id = match &shape {
            Shape::Shared(node) => (node.address(), type_id),
            _ => (address, type_id),
        };

        let Some(mut on_path) = ctx.enter(id) else {
            tracing::trace!(address = id.0, "node already on the path, not descending");
            return;
        };
        self.dispatch(shape, type_id, &mut on_path, scope);
    }

    fn dispatch(&self, shape: Shape<'_>, type_id: TypeId, ctx: &mut ConversionContext, scope: Scope) {
        match shape {
            Shape::Sequence(items) | Shape::Map(items) | Shape::Array(items) => {
                for item in items {
                    self.process(item, ctx, scope);
                }
            }
            Shape::Set(set) => set.refill(&mut |item| self.process(item, ctx, scope)),
            Shape::Composite(composite) => self.visit_fields(composite, type_id, ctx),
            Shape::Shared(node) => {
                if let Err(e) = node.with_mut(&mut |inner| self.process(inner, ctx, scope)) {
                    tracing::debug!(error = %e, "shared node not accessible, left unchanged");
                }
            }
            Shape::Null | Shape::Scalar | Shape::Transparent(_) => {}
        }
    }

    fn visit_fields(&self, composite: &mut dyn Composite, type_id: TypeId, ctx: &mut ConversionContext) {
        let fields = self.descriptors.get_or_describe(type_id, composite);
        let selector = FieldSelector::new(self.registry);

        for field in fields.iter() {
            let Some(value) = composite.field_mut(field.name) else {
                tracing::debug!(field = field.name, "field not accessible, left unchanged");
                continue;
            };
            match selector.select(field, value) {
                Selection::Skip => {}
                Selection::Convert(scope) | Selection::Descend(scope) => self.process(value, ctx, scope),
            }
        }
    }
}
