use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use kronos_api::{KronosError, TypeConverter, Zone};

use crate::pattern::Pattern;

/// Textual date-times: parse with the effective pattern, shift, re-render
/// with the same pattern.
///
/// Anything that does not parse (blank text, free text, a pattern that
/// cannot be compiled) is returned unchanged. A bare `String` field must
/// carry `#[time]` to be selected.
#[derive(Debug, Default)]
pub struct StringConverter {
    patterns: RwLock<HashMap<String, Arc<Pattern>>>,
}

impl StringConverter {
    fn pattern(&self, format: &str) -> Result<Arc<Pattern>, KronosError> {
        if let Ok(cache) = self.patterns.read() {
            if let Some(pattern) = cache.get(format) {
                return Ok(Arc::clone(pattern));
            }
        }
        let pattern = Arc::new(Pattern::compile(format)?);
        if let Ok(mut cache) = self.patterns.write() {
            cache.insert(format.to_string(), Arc::clone(&pattern));
        }
        Ok(pattern)
    }

    fn try_convert(&self, value: &str, from: &Zone, to: &Zone, format: &str) -> Result<String, KronosError> {
        let pattern = self.pattern(format)?;
        let instant = pattern.parse(value, from)?;
        pattern.format(&instant, to)
    }
}

impl TypeConverter<String> for StringConverter {
    fn convert(&self, value: &String, from: &Zone, to: &Zone, format: &str) -> String {
        if value.trim().is_empty() {
            return value.clone();
        }
        match self.try_convert(value, from, to, format) {
            Ok(converted) => converted,
            Err(e) => {
                tracing::trace!(value = %value, format, error = %e, "not a date-time, left unchanged");
                value.clone()
            }
        }
    }

    fn requires_marker(&self) -> bool {
        true
    }
}
