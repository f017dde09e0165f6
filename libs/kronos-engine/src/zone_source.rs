use kronos_api::{KronosError, Zone};

/// Caller zone for one unit of work.
///
/// Owned by the unit of work (one per request); falls back to the
/// configured default client zone when nothing was set.
#[derive(Debug, Clone)]
pub struct ZoneSource {
    zone: Option<Zone>,
    default_zone: Zone,
}

impl ZoneSource {
    pub fn new(default_zone: Zone) -> Self {
        Self {
            zone: None,
            default_zone,
        }
    }

    /// Resolve and set the caller zone. An unknown identifier leaves the
    /// current zone as it was.
    pub fn set_zone(&mut self, id: &str) -> Result<(), KronosError> {
        self.zone = Some(Zone::parse(id)?);
        Ok(())
    }

    pub fn set(&mut self, zone: Zone) {
        self.zone = Some(zone);
    }

    pub fn zone(&self) -> Zone {
        self.zone.clone().unwrap_or_else(|| self.default_zone.clone())
    }

    pub fn is_set(&self) -> bool {
        self.zone.is_some()
    }

    pub fn clear(&mut self) {
        self.zone = None;
    }

    /// Set the zone from an optional header value; blank or missing
    /// values select the default.
    pub fn establish(&mut self, header: Option<&str>) -> Result<Zone, KronosError> {
        match header.map(str::trim).filter(|v| !v.is_empty()) {
            Some(id) => self.set_zone(id)?,
            None => self.clear(),
        }
        Ok(self.zone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ZoneSource {
        ZoneSource::new(Zone::parse("Asia/Shanghai").unwrap())
    }

    #[test]
    fn missing_zone_falls_back_to_default_client_zone() {
        let mut source = source();
        assert_eq!(source.zone().id(), "Asia/Shanghai");
        assert_eq!(source.establish(None).unwrap().id(), "Asia/Shanghai");
        assert_eq!(source.establish(Some("  ")).unwrap().id(), "Asia/Shanghai");
        assert!(!source.is_set());
    }

    #[test]
    fn header_value_wins_until_cleared() {
        let mut source = source();
        assert_eq!(source.establish(Some("Europe/Paris")).unwrap().id(), "Europe/Paris");
        assert!(source.is_set());
        source.clear();
        assert_eq!(source.zone().id(), "Asia/Shanghai");
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let mut source = source();
        source.set(Zone::utc());
        let err = source.set_zone("Mars/Olympus").unwrap_err();
        assert_eq!(err.kind(), kronos_api::ErrorKind::Zone);
        assert_eq!(source.zone(), Zone::utc());
    }
}
