//! Built-in leaf converters.
//!
//! | Type                         | Behaviour                                  |
//! |------------------------------|--------------------------------------------|
//! | `NaiveDateTime`              | wall-clock in `from` → wall-clock in `to`  |
//! | `ZonedDateTime`              | same instant, zone replaced by `to`        |
//! | `DateTime<Tz>`               | same instant, zone replaced by `to`        |
//! | `DateTime<FixedOffset>`      | same instant, offset `to` has at it        |
//! | `DateTime<Utc>`              | unchanged                                  |
//! | `SystemTime`                 | unchanged                                  |
//! | `String`                     | parsed with the pattern, re-rendered       |

mod instant;
mod naive;
mod offset;
mod string;
mod zoned;

pub use instant::{InstantConverter, SystemTimeConverter};
pub use naive::NaiveDateTimeConverter;
pub use offset::OffsetDateTimeConverter;
pub use string::StringConverter;
pub use zoned::{TzDateTimeConverter, ZonedDateTimeConverter};

use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;

use kronos_api::ZonedDateTime;

use crate::registry::ConverterEntry;

pub(crate) fn builtin() -> Vec<ConverterEntry> {
    vec![
        ConverterEntry::new::<NaiveDateTime, _>(NaiveDateTimeConverter),
        ConverterEntry::new::<ZonedDateTime, _>(ZonedDateTimeConverter),
        ConverterEntry::new::<DateTime<Tz>, _>(TzDateTimeConverter),
        ConverterEntry::new::<DateTime<FixedOffset>, _>(OffsetDateTimeConverter),
        ConverterEntry::new::<DateTime<Utc>, _>(InstantConverter),
        ConverterEntry::new::<SystemTime, _>(SystemTimeConverter),
        ConverterEntry::new::<String, _>(StringConverter::default()),
    ]
}
