use chrono::{DateTime, FixedOffset, Utc};

use kronos_api::{TypeConverter, Zone};

/// Same instant, with the offset `to` has at that instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetDateTimeConverter;

impl TypeConverter<DateTime<FixedOffset>> for OffsetDateTimeConverter {
    fn convert(
        &self,
        value: &DateTime<FixedOffset>,
        _from: &Zone,
        to: &Zone,
        _format: &str,
    ) -> DateTime<FixedOffset> {
        to.at(&value.with_timezone(&Utc))
    }
}
