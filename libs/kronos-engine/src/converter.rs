use std::sync::Arc;

use kronos_api::walk::Walk;
use kronos_api::{TypeConverter, Zone};

use crate::config::KronosConfig;
use crate::context::ConversionContext;
use crate::descriptor::DescriptorCache;
use crate::error::EngineError;
use crate::registry::{ConverterEntry, ConverterRegistry};
use crate::walker::{ObjectWalker, Scope};

/// Entry point for zone conversion of whole object graphs.
///
/// Values are converted in place; the owned variants return the value they
/// were given after converting it. A call with equal zones, or on a null
/// value, changes nothing.
#[derive(Debug)]
pub struct TimeZoneConverter {
    registry: ConverterRegistry,
    descriptors: DescriptorCache,
    backend_zone: Zone,
    default_format: Arc<str>,
}

impl TimeZoneConverter {
    /// Converter with the built-in leaf converters.
    pub fn new(config: &KronosConfig) -> Result<Self, EngineError> {
        Self::with_converters(config, Vec::new())
    }

    /// Converter with the built-ins plus `custom`, which replace built-ins
    /// registered for the same type.
    pub fn with_converters(config: &KronosConfig, custom: Vec<ConverterEntry>) -> Result<Self, EngineError> {
        Self::with_registry(config, ConverterRegistry::with_defaults(), custom)
    }

    pub fn with_registry(
        config: &KronosConfig,
        registry: ConverterRegistry,
        custom: Vec<ConverterEntry>,
    ) -> Result<Self, EngineError> {
        let backend_zone = config.backend_zone()?;
        for entry in custom {
            tracing::info!(r#type = entry.type_name(), "custom converter");
            registry.insert(entry);
        }
        Ok(Self {
            registry,
            descriptors: DescriptorCache::new(),
            backend_zone,
            default_format: Arc::from(config.default_date_time_format.as_str()),
        })
    }

    /// Register a leaf converter for exactly `T`.
    pub fn register_converter<T, C>(&self, converter: C)
    where
        T: Walk,
        C: TypeConverter<T> + 'static,
    {
        self.registry.register::<T, C>(converter);
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn backend_zone(&self) -> &Zone {
        &self.backend_zone
    }

    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// Convert `value` from `from` to `to`.
    pub fn convert<T: Walk>(&self, mut value: T, from: &Zone, to: &Zone) -> T {
        self.convert_in_place(&mut value, from, to);
        value
    }

    pub fn convert_in_place(&self, value: &mut dyn Walk, from: &Zone, to: &Zone) {
        self.convert_in_place_with(value, from, to, None);
    }

    /// Convert with `format` in place of the configured default pattern.
    pub fn convert_in_place_with(&self, value: &mut dyn Walk, from: &Zone, to: &Zone, format: Option<&str>) {
        if from == to {
            return;
        }
        let default_format = match format {
            Some(f) => Arc::from(f),
            None => Arc::clone(&self.default_format),
        };
        let mut ctx = ConversionContext::new(from.clone(), to.clone(), default_format);
        ObjectWalker::new(&self.registry, &self.descriptors).process(value, &mut ctx, Scope::default());
    }

    /// Client values → backend zone.
    pub fn to_backend<T: Walk>(&self, value: T, client: &Zone) -> T {
        self.convert(value, client, &self.backend_zone)
    }

    /// Backend values → client zone.
    pub fn to_client<T: Walk>(&self, value: T, client: &Zone) -> T {
        self.convert(value, &self.backend_zone, client)
    }

    pub fn to_backend_in_place(&self, value: &mut dyn Walk, client: &Zone) {
        self.convert_in_place(value, client, &self.backend_zone);
    }

    pub fn to_client_in_place(&self, value: &mut dyn Walk, client: &Zone) {
        self.convert_in_place(value, &self.backend_zone, client);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn converter() -> TimeZoneConverter {
        TimeZoneConverter::new(&KronosConfig::default()).unwrap()
    }

    #[test]
    fn backend_and_client_directions() {
        let converter = converter();
        let shanghai = Zone::parse("Asia/Shanghai").unwrap();
        let backend = converter.to_backend(at("2025-05-20 18:00:00"), &shanghai);
        assert_eq!(backend, at("2025-05-20 10:00:00"));
        assert_eq!(converter.to_client(backend, &shanghai), at("2025-05-20 18:00:00"));
    }

    #[test]
    fn equal_zones_change_nothing() {
        let converter = converter();
        let text = converter.convert("2025-05-20 18:00:00".to_string(), &Zone::utc(), &Zone::utc());
        assert_eq!(text, "2025-05-20 18:00:00");
    }

    #[test]
    fn explicit_format_overrides_default() {
        let converter = converter();
        let mut text = "20/05/2025 18:00".to_string();
        let tokyo = Zone::parse("Asia/Tokyo").unwrap();
        converter.convert_in_place_with(&mut text, &tokyo, &Zone::utc(), Some("dd/MM/yyyy HH:mm"));
        assert_eq!(text, "20/05/2025 09:00");
    }

    #[test]
    fn custom_converters_replace_builtins() {
        let custom = ConverterEntry::new::<NaiveDateTime, _>(|v: &NaiveDateTime, _: &Zone, _: &Zone, _: &str| {
            v.date().and_hms_opt(0, 0, 0).unwrap_or(*v)
        });
        let converter = TimeZoneConverter::with_converters(&KronosConfig::default(), vec![custom]).unwrap();
        let shanghai = Zone::parse("Asia/Shanghai").unwrap();
        assert_eq!(converter.to_backend(at("2025-05-20 18:00:00"), &shanghai), at("2025-05-20 00:00:00"));
    }

    #[test]
    fn invalid_backend_zone_is_rejected() {
        let config = KronosConfig {
            backend_zone_id: "Nowhere".into(),
            ..KronosConfig::default()
        };
        assert!(TimeZoneConverter::new(&config).is_err());
    }
}
