extern crate self as kronos_api;

pub mod converter;
pub mod error;
pub mod schema;
pub mod walk;
pub mod zone;

pub use kronos_api_derive::Temporal;

pub use converter::TypeConverter;
pub use error::{ErrorKind, KronosError};
pub use schema::{Composite, FieldDescriptor};
pub use walk::{NodeKind, Shape, Walk};
pub use zone::{Zone, ZonedDateTime};
