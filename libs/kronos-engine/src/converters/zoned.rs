use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use kronos_api::{TypeConverter, Zone, ZonedDateTime};

/// Same instant, presented in `to`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZonedDateTimeConverter;

impl TypeConverter<ZonedDateTime> for ZonedDateTimeConverter {
    fn convert(&self, value: &ZonedDateTime, _from: &Zone, to: &Zone, _format: &str) -> ZonedDateTime {
        value.with_zone_same_instant(to)
    }
}

/// Same instant, presented in `to`.
///
/// `DateTime<Tz>` can only carry zones known to `chrono-tz`; when `to`
/// has no counterpart (e.g. `+05:30`) the value is returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TzDateTimeConverter;

impl TypeConverter<DateTime<Tz>> for TzDateTimeConverter {
    fn convert(&self, value: &DateTime<Tz>, _from: &Zone, to: &Zone, _format: &str) -> DateTime<Tz> {
        match to.as_tz() {
            Some(tz) => value.with_timezone(&Utc).with_timezone(&tz),
            None => {
                tracing::debug!(zone = %to, "zone has no chrono-tz counterpart, DateTime<Tz> left unchanged");
                *value
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn zoned_keeps_instant_and_takes_target_zone() {
        let tokyo = Zone::parse("Asia/Tokyo").unwrap();
        let instant = Utc.with_ymd_and_hms(2025, 5, 20, 0, 0, 0).unwrap();
        let value = ZonedDateTime::new(instant, Zone::utc());
        let converted = ZonedDateTimeConverter.convert(&value, &Zone::utc(), &tokyo, "");
        assert_eq!(converted.instant(), instant);
        assert_eq!(converted.zone(), &tokyo);
        assert_eq!(converted.local().to_string(), "2025-05-20 09:00:00");
    }

    #[test]
    fn tz_date_time_moves_to_region() {
        let value = chrono_tz::UTC.with_ymd_and_hms(2025, 5, 20, 0, 0, 0).unwrap();
        let shanghai = Zone::parse("Asia/Shanghai").unwrap();
        let converted = TzDateTimeConverter.convert(&value, &Zone::utc(), &shanghai, "");
        assert_eq!(converted.timezone(), chrono_tz::Asia::Shanghai);
        assert_eq!(converted, value);

        let odd = Zone::parse("+05:30").unwrap();
        let unchanged = TzDateTimeConverter.convert(&value, &Zone::utc(), &odd, "");
        assert_eq!(unchanged.timezone(), chrono_tz::UTC);
    }
}
