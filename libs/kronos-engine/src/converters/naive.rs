use chrono::{NaiveDateTime, Utc};

use kronos_api::{TypeConverter, Zone};

/// Wall-clock time: attach `from`, shift to `to`, detach.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveDateTimeConverter;

impl TypeConverter<NaiveDateTime> for NaiveDateTimeConverter {
    fn convert(&self, value: &NaiveDateTime, from: &Zone, to: &Zone, _format: &str) -> NaiveDateTime {
        let instant = from.resolve_local(value).with_timezone(&Utc);
        to.at(&instant).naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn shifts_wall_clock() {
        let shanghai = Zone::parse("Asia/Shanghai").unwrap();
        let converted = NaiveDateTimeConverter.convert(&local("2025-05-20 02:00:00"), &Zone::utc(), &shanghai, "");
        assert_eq!(converted, local("2025-05-20 10:00:00"));
    }

    #[test]
    fn crosses_midnight_and_dst() {
        let new_york = Zone::parse("America/New_York").unwrap();
        // EDT (-4) in July, EST (-5) in January.
        let summer = NaiveDateTimeConverter.convert(&local("2025-07-01 02:00:00"), &Zone::utc(), &new_york, "");
        let winter = NaiveDateTimeConverter.convert(&local("2025-01-01 02:00:00"), &Zone::utc(), &new_york, "");
        assert_eq!(summer, local("2025-06-30 22:00:00"));
        assert_eq!(winter, local("2024-12-31 21:00:00"));
    }
}
