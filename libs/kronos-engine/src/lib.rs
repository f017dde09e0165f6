pub mod config;
pub mod context;
pub mod converter;
pub mod converters;
pub mod descriptor;
pub mod error;
pub mod gate;
pub mod pattern;
pub mod registry;
pub mod selector;
pub mod walker;
pub mod zone_source;

pub use config::KronosConfig;
pub use converter::TimeZoneConverter;
pub use error::EngineError;
pub use gate::{Argument, ConvertPolicy, InvocationGate};
pub use registry::{ConverterEntry, ConverterRegistry};
pub use zone_source::ZoneSource;
