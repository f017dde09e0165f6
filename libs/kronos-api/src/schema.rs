use crate::walk::Walk;

/// One convertible field of a composite type.
///
/// Produced by `#[derive(Temporal)]`: a pure function of the type's
/// shape, so the engine computes it once per type and caches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name (`"0"`, `"1"` for tuple structs).
    pub name: &'static str,
    /// Declared type as written in the source.
    pub declared_type: &'static str,
    /// Field carries `#[time]`.
    pub has_marker: bool,
    /// Format from `#[time(format = "...")]`.
    pub marker_format: Option<&'static str>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, declared_type: &'static str) -> Self {
        Self {
            name,
            declared_type,
            has_marker: false,
            marker_format: None,
        }
    }

    pub const fn marked(mut self, format: Option<&'static str>) -> Self {
        self.has_marker = true;
        self.marker_format = format;
        self
    }
}

/// A user-defined struct whose fields the walker can visit.
///
/// Implemented by `#[derive(Temporal)]`. Fields embedded with
/// `#[time(base)]` play the role of a supertype: their fields are
/// listed after the struct's own fields, and a name declared on the
/// struct itself shadows the same name on a base.
pub trait Composite {
    /// Ordered field list: own fields, then unshadowed base fields.
    fn describe(&self) -> Vec<FieldDescriptor>;

    /// Whether `name` resolves to a field of this type or one of its bases.
    fn has_field(&self, name: &str) -> bool;

    /// Mutable access to the field called `name`.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Walk>;
}

/// Append the fields of a base to `fields`, skipping names already present.
pub fn merge_base(fields: &mut Vec<FieldDescriptor>, base: Vec<FieldDescriptor>) {
    for field in base {
        if !fields.iter().any(|f| f.name == field.name) {
            fields.push(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_base_keeps_most_derived() {
        let mut own = vec![
            FieldDescriptor::new("created_at", "String").marked(Some("yyyy/MM/dd")),
            FieldDescriptor::new("title", "String"),
        ];
        merge_base(
            &mut own,
            vec![
                FieldDescriptor::new("id", "u64"),
                FieldDescriptor::new("created_at", "NaiveDateTime").marked(None),
            ],
        );
        let names: Vec<_> = own.iter().map(|f| f.name).collect();
        assert_eq!(names, ["created_at", "title", "id"]);
        assert_eq!(own[0].declared_type, "String");
        assert_eq!(own[0].marker_format, Some("yyyy/MM/dd"));
    }
}
