use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::KronosError;

/// Offset rule set behind a zone identifier.
#[derive(Debug, Clone, Copy)]
enum Rules {
    /// Constant offset: `Z`, `+08:00`, `UTC+8`.
    Fixed(FixedOffset),
    /// IANA region with DST history: `Asia/Shanghai`, `Europe/Berlin`.
    Region(Tz),
}

/// Immutable time zone identifier resolved to its offset rules.
///
/// Accepted identifiers:
/// - `Z` and signed offsets (`+8`, `+08`, `+0800`, `+08:00`, `-05:30:15`)
/// - `UTC`/`GMT`/`UT` followed by a signed offset (`UTC+8`, `GMT-03:00`)
/// - any IANA region known to `chrono-tz` (`UTC`, `Asia/Shanghai`)
///
/// Offsets are normalised (`+8` → `+08:00`). Two zones are equal iff their
/// identifiers are equal: `Z` and `UTC` are different zones with the same
/// rules.
#[derive(Clone)]
pub struct Zone {
    id: Arc<str>,
    rules: Rules,
}

impl Zone {
    /// The `UTC` region.
    pub fn utc() -> Self {
        Self::region(Tz::UTC)
    }

    pub fn region(tz: Tz) -> Self {
        Self {
            id: Arc::from(tz.name()),
            rules: Rules::Region(tz),
        }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            id: Arc::from(offset_id(offset)),
            rules: Rules::Fixed(offset),
        }
    }

    /// Resolve an identifier. Unknown or malformed identifiers are
    /// reported as `ErrorKind::Zone`.
    pub fn parse(id: &str) -> Result<Self, KronosError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(KronosError::zone("empty zone identifier"));
        }
        if id == "Z" || id.starts_with('+') || id.starts_with('-') {
            return parse_offset(id).map(Self::fixed);
        }
        for prefix in ["UTC", "GMT", "UT"] {
            if let Some(rest) = id.strip_prefix(prefix) {
                if rest.starts_with('+') || rest.starts_with('-') {
                    let offset = parse_offset(rest)?;
                    let id = if offset.local_minus_utc() == 0 {
                        prefix.to_string()
                    } else {
                        format!("{prefix}{}", offset_id(offset))
                    };
                    return Ok(Self {
                        id: Arc::from(id),
                        rules: Rules::Fixed(offset),
                    });
                }
            }
        }
        id.parse::<Tz>()
            .map(Self::region)
            .map_err(|_| KronosError::zone(format!("unknown zone id '{id}'")))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.rules, Rules::Fixed(_))
    }

    /// The `chrono-tz` zone with the same rules, if one exists.
    ///
    /// Whole-hour fixed offsets map onto the `Etc/GMT±N` regions (whose
    /// sign is inverted by convention); other fixed offsets have no
    /// `chrono-tz` counterpart.
    pub fn as_tz(&self) -> Option<Tz> {
        match self.rules {
            Rules::Region(tz) => Some(tz),
            Rules::Fixed(offset) => {
                let secs = offset.local_minus_utc();
                if secs == 0 {
                    return Some(Tz::UTC);
                }
                if secs % 3600 != 0 {
                    return None;
                }
                let hours = secs / 3600;
                let name = if hours > 0 {
                    format!("Etc/GMT-{hours}")
                } else {
                    format!("Etc/GMT+{}", -hours)
                };
                name.parse::<Tz>().ok()
            }
        }
    }

    /// Offset in effect at `instant`.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match self.rules {
            Rules::Fixed(offset) => offset,
            Rules::Region(tz) => tz.offset_from_utc_datetime(&instant.naive_utc()).fix(),
        }
    }

    /// Represent `instant` in this zone.
    pub fn at(&self, instant: &DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset_at(instant))
    }

    /// Attach this zone to a wall-clock value.
    ///
    /// In an overlap the earlier offset wins. In a gap the wall-clock is
    /// moved forward by the length of the gap.
    pub fn resolve_local(&self, local: &NaiveDateTime) -> DateTime<FixedOffset> {
        match self.rules {
            Rules::Fixed(offset) => attach(local, offset),
            Rules::Region(tz) => match tz.from_local_datetime(local) {
                LocalResult::Single(dt) => dt.fixed_offset(),
                LocalResult::Ambiguous(earlier, _) => earlier.fixed_offset(),
                LocalResult::None => {
                    let day_before = local
                        .checked_sub_signed(TimeDelta::days(1))
                        .unwrap_or(*local);
                    let before = tz.offset_from_utc_datetime(&day_before).fix();
                    let instant = attach(local, before).with_timezone(&Utc);
                    self.at(&instant)
                }
            },
        }
    }
}

/// `local` at `offset`, saturating at the representable range.
fn attach(local: &NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = local
        .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
        .unwrap_or(*local);
    DateTime::from_naive_utc_and_offset(utc, offset)
}

fn offset_id(offset: FixedOffset) -> String {
    let total = offset.local_minus_utc();
    if total == 0 {
        return "Z".to_string();
    }
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.abs();
    let (h, m, s) = (abs / 3600, abs / 60 % 60, abs % 60);
    if s == 0 {
        format!("{sign}{h:02}:{m:02}")
    } else {
        format!("{sign}{h:02}:{m:02}:{s:02}")
    }
}

fn parse_offset(text: &str) -> Result<FixedOffset, KronosError> {
    let invalid = || KronosError::zone(format!("invalid offset '{text}'"));
    if text == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    if !text.is_ascii() {
        return Err(invalid());
    }
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'+') => (1, &text[1..]),
        Some(b'-') => (-1, &text[1..]),
        _ => return Err(invalid()),
    };

    let parts: Vec<&str> = if digits.contains(':') {
        digits.split(':').collect()
    } else {
        match digits.len() {
            1 | 2 => vec![digits],
            4 => vec![&digits[..2], &digits[2..]],
            6 => vec![&digits[..2], &digits[2..4], &digits[4..]],
            _ => return Err(invalid()),
        }
    };
    if parts.len() > 3 {
        return Err(invalid());
    }

    let mut secs = 0i32;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let n: i32 = part.parse().map_err(|_| invalid())?;
        let (limit, unit) = match i {
            0 => (18, 3600),
            1 => (59, 60),
            _ => (59, 1),
        };
        if n > limit {
            return Err(invalid());
        }
        secs += n * unit;
    }
    if secs > 18 * 3600 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * secs).ok_or_else(invalid)
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Zone {}

impl Hash for Zone {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone({})", self.id)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl FromStr for Zone {
    type Err = KronosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Zone {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> serde::Deserialize<'de> for Zone {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Zone::parse(&id).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════
//  ZonedDateTime
// ═══════════════════════════════════════════════════════════════

/// An instant together with the zone it is presented in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonedDateTime {
    instant: DateTime<Utc>,
    zone: Zone,
}

impl ZonedDateTime {
    pub fn new(instant: DateTime<Utc>, zone: Zone) -> Self {
        Self { instant, zone }
    }

    /// Wall-clock `local` as observed in `zone`.
    pub fn from_local(local: &NaiveDateTime, zone: Zone) -> Self {
        let instant = zone.resolve_local(local).with_timezone(&Utc);
        Self { instant, zone }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    pub fn offset(&self) -> FixedOffset {
        self.zone.offset_at(&self.instant)
    }

    pub fn local(&self) -> NaiveDateTime {
        self.to_fixed().naive_local()
    }

    pub fn to_fixed(&self) -> DateTime<FixedOffset> {
        self.zone.at(&self.instant)
    }

    /// Same instant, presented in `zone`.
    pub fn with_zone_same_instant(&self, zone: &Zone) -> Self {
        Self {
            instant: self.instant,
            zone: zone.clone(),
        }
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.to_fixed().format("%Y-%m-%dT%H:%M:%S%:z"), self.zone)
    }
}
