use crate::zone::Zone;

/// Leaf converter for one temporal type.
///
/// Solves one task: re-express a value observed in zone `from` as the
/// equivalent value in zone `to`. `format` is the effective pattern for
/// textual values (field override or the configured default); converters
/// of structured types ignore it.
///
/// Converters never fail: a value that cannot be converted is returned
/// unchanged.
pub trait TypeConverter<T>: Send + Sync {
    fn convert(&self, value: &T, from: &Zone, to: &Zone, format: &str) -> T;

    /// A struct field holding this type directly is only selected when it
    /// carries `#[time]`. Elements of collections and top-level values are
    /// converted regardless. Used for types like `String` that are temporal
    /// only by declaration.
    fn requires_marker(&self) -> bool {
        false
    }
}

impl<T, F> TypeConverter<T> for F
where
    F: Fn(&T, &Zone, &Zone, &str) -> T + Send + Sync,
{
    fn convert(&self, value: &T, from: &Zone, to: &Zone, format: &str) -> T {
        self(value, from, to, format)
    }
}
