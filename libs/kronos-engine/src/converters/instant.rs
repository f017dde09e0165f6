use std::time::SystemTime;

use chrono::{DateTime, Utc};

use kronos_api::{TypeConverter, Zone};

/// Absolute instants carry no zone: returned unchanged.
///
/// Registered so that instants are treated as leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantConverter;

impl TypeConverter<DateTime<Utc>> for InstantConverter {
    fn convert(&self, value: &DateTime<Utc>, _from: &Zone, _to: &Zone, _format: &str) -> DateTime<Utc> {
        *value
    }
}

/// Epoch-backed timestamps: reinterpreting in `to` keeps the instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeConverter;

impl TypeConverter<SystemTime> for SystemTimeConverter {
    fn convert(&self, value: &SystemTime, _from: &Zone, _to: &Zone, _format: &str) -> SystemTime {
        *value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instants_are_invariant() {
        let tokyo = Zone::parse("Asia/Tokyo").unwrap();
        let now = Utc::now();
        assert_eq!(InstantConverter.convert(&now, &Zone::utc(), &tokyo, ""), now);
        let sys = SystemTime::now();
        assert_eq!(SystemTimeConverter.convert(&sys, &Zone::utc(), &tokyo, ""), sys);
    }
}
