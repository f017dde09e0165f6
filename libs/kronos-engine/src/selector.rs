use kronos_api::schema::FieldDescriptor;
use kronos_api::walk::{NodeKind, Walk, runtime_type};

use crate::registry::ConverterRegistry;
use crate::walker::Scope;

/// Outcome of field selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Leave the field untouched.
    Skip,
    /// The field holds a leaf to convert.
    Convert(Scope),
    /// The field holds a container or struct to walk into.
    Descend(Scope),
}

/// Decides, per field and per traversal, whether a composite's field takes
/// part in conversion.
///
/// Selection looks at the runtime value, not the declared type, so it is
/// never cached.
pub struct FieldSelector<'r> {
    registry: &'r ConverterRegistry,
}

impl<'r> FieldSelector<'r> {
    pub fn new(registry: &'r ConverterRegistry) -> Self {
        Self { registry }
    }

    pub fn select(&self, field: &FieldDescriptor, value: &dyn Walk) -> Selection {
        let Some(value) = peel(value) else {
            return Selection::Skip;
        };
        let scope = Scope::with_format(field.marker_format);

        if let Some(converter) = self.registry.lookup(runtime_type(value)) {
            // Strings held directly by a field are temporal only by declaration.
            if converter.requires_marker() && !field.has_marker {
                return Selection::Skip;
            }
            return Selection::Convert(scope);
        }
        if field.has_marker || value.kind().has_children() {
            return Selection::Descend(scope);
        }
        Selection::Skip
    }
}

/// Strip `Option`/`Box`-style wrappers. `None` for null.
fn peel(mut value: &dyn Walk) -> Option<&dyn Walk> {
    loop {
        match value.kind() {
            NodeKind::Null => return None,
            NodeKind::Transparent => value = value.inner()?,
            _ => return Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn registry() -> ConverterRegistry {
        ConverterRegistry::with_defaults()
    }

    #[test]
    fn registered_runtime_type_is_converted() {
        let registry = registry();
        let selector = FieldSelector::new(&registry);
        let field = FieldDescriptor::new("at", "Option<NaiveDateTime>");
        let value = Some(Box::new(NaiveDateTime::default()));
        assert_eq!(selector.select(&field, &value), Selection::Convert(Scope::default()));
    }

    #[test]
    fn marker_carries_format() {
        let registry = registry();
        let selector = FieldSelector::new(&registry);
        let field = FieldDescriptor::new("day", "String").marked(Some("yyyy/MM/dd HH:mm"));
        let value = String::from("2025/05/20 10:00");
        assert_eq!(
            selector.select(&field, &value),
            Selection::Convert(Scope::with_format(Some("yyyy/MM/dd HH:mm")))
        );
    }

    #[test]
    fn containers_are_descended_plain_values_skipped() {
        let registry = registry();
        let selector = FieldSelector::new(&registry);
        let field = FieldDescriptor::new("f", "?");
        assert!(matches!(selector.select(&field, &vec![String::new()]), Selection::Descend(_)));
        assert_eq!(selector.select(&field, &7u32), Selection::Skip);
        assert_eq!(selector.select(&field, &vec![1u8]), Selection::Skip);
        assert_eq!(selector.select(&field, &None::<NaiveDateTime>), Selection::Skip);
    }

    #[test]
    fn bare_string_field_needs_marker() {
        let registry = registry();
        let selector = FieldSelector::new(&registry);
        let plain = FieldDescriptor::new("note", "Option<String>");
        assert_eq!(selector.select(&plain, &Some(String::from("2025-05-20 10:00:00"))), Selection::Skip);
        assert_eq!(selector.select(&plain, &String::from("2025-05-20 10:00:00")), Selection::Skip);

        let marked = FieldDescriptor::new("note", "String").marked(None);
        assert_eq!(
            selector.select(&marked, &String::from("2025-05-20 10:00:00")),
            Selection::Convert(Scope::default())
        );
        // Containers of strings are walked; their elements are converted.
        assert_eq!(
            selector.select(&plain, &vec![String::from("2025-05-20 10:00:00")]),
            Selection::Descend(Scope::default())
        );
    }
}
