use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use kronos_api::{KronosError, Zone};

/// A date-time pattern in `yyyy-MM-dd HH:mm:ss` notation, compiled to
/// chrono's strftime syntax.
///
/// Supported letters: `y u M d D H h m s S a E X x Z`. Text in single
/// quotes is literal, `''` is a quote. Zone-name letters (`z`, `V`, `O`)
/// and anything else is rejected.
///
/// Offset fields parse leniently: `Z`, `+08`, `+0800` and `+08:00` are all
/// accepted. When rendering, `X` letters and `ZZZZZ` write `Z` for a zero
/// offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
    parse: String,
    has_offset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Offset(OffsetStyle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OffsetStyle {
    width: OffsetWidth,
    zulu: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OffsetWidth {
    /// `+08`, minutes only when non-zero.
    Hours,
    /// `+0800`
    Compact,
    /// `+08:00`
    Colon,
}

impl OffsetStyle {
    fn render(self, out: &mut String, offset: FixedOffset) {
        let seconds = offset.local_minus_utc();
        if seconds == 0 && self.zulu {
            out.push('Z');
            return;
        }
        let sign = if seconds < 0 { '-' } else { '+' };
        let minutes = seconds.unsigned_abs() / 60;
        let (hh, mm) = (minutes / 60, minutes % 60);
        // Writing into a String cannot fail.
        let _ = match self.width {
            OffsetWidth::Hours if mm == 0 => write!(out, "{sign}{hh:02}"),
            OffsetWidth::Hours | OffsetWidth::Compact => write!(out, "{sign}{hh:02}{mm:02}"),
            OffsetWidth::Colon => write!(out, "{sign}{hh:02}:{mm:02}"),
        };
    }
}

impl Pattern {
    pub fn compile(pattern: &str) -> Result<Self, KronosError> {
        let segments = translate(pattern)?;
        let mut parse = String::new();
        let mut has_offset = false;
        for segment in &segments {
            match segment {
                Segment::Text(text) => parse.push_str(text),
                Segment::Offset(_) => {
                    parse.push_str("%#z");
                    has_offset = true;
                }
            }
        }
        if StrftimeItems::new(&parse).any(|item| matches!(item, Item::Error)) {
            return Err(KronosError::format(format!("pattern '{pattern}' is not representable")));
        }
        Ok(Self {
            source: pattern.to_string(),
            segments,
            parse,
            has_offset,
        })
    }

    /// The strftime string used when reading text.
    pub fn parse_strftime(&self) -> &str {
        &self.parse
    }

    /// The pattern carries an explicit UTC offset.
    pub fn has_offset(&self) -> bool {
        self.has_offset
    }

    /// Parse `text` into an instant.
    ///
    /// Text with an offset carries its own instant; wall-clock text is
    /// read as observed in `zone`.
    pub fn parse(&self, text: &str, zone: &Zone) -> Result<DateTime<Utc>, KronosError> {
        if self.has_offset {
            let parsed = DateTime::parse_from_str(text, &self.parse)?;
            return Ok(parsed.with_timezone(&Utc));
        }
        let local = NaiveDateTime::parse_from_str(text, &self.parse)?;
        Ok(zone.resolve_local(&local).with_timezone(&Utc))
    }

    /// Render `instant` as seen in `zone`.
    pub fn format(&self, instant: &DateTime<Utc>, zone: &Zone) -> Result<String, KronosError> {
        let value: DateTime<FixedOffset> = zone.at(instant);
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => write!(out, "{}", value.format(text))
                    .map_err(|_| KronosError::format(format!("cannot render '{}'", self.source)))?,
                Segment::Offset(style) => style.render(&mut out, *value.offset()),
            }
        }
        Ok(out)
    }
}

fn translate(pattern: &str) -> Result<Vec<Segment>, KronosError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut segments = Vec::new();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            i += 1;
            if chars.get(i) == Some(&'\'') {
                out.push('\'');
                i += 1;
                continue;
            }
            loop {
                match chars.get(i) {
                    None => {
                        return Err(KronosError::format(format!(
                            "unterminated literal in pattern '{pattern}'"
                        )));
                    }
                    Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                        out.push('\'');
                        i += 2;
                    }
                    Some('\'') => {
                        i += 1;
                        break;
                    }
                    Some(&ch) => {
                        push_literal(&mut out, ch);
                        i += 1;
                    }
                }
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }
        let offset = |width, zulu| Some(OffsetStyle { width, zulu });
        let (item, style) = match (c, run) {
            ('y' | 'u', 2) => ("%y", None),
            ('y' | 'u', _) => ("%Y", None),
            ('M', 1) => ("%-m", None),
            ('M', 2) => ("%m", None),
            ('M', 3) => ("%b", None),
            ('M', 4) => ("%B", None),
            ('d', 1) => ("%-d", None),
            ('d', 2) => ("%d", None),
            ('D', 1..=3) => ("%j", None),
            ('H', 1) => ("%-H", None),
            ('H', 2) => ("%H", None),
            ('h', 1) => ("%-I", None),
            ('h', 2) => ("%I", None),
            ('m', 1) => ("%-M", None),
            ('m', 2) => ("%M", None),
            ('s', 1) => ("%-S", None),
            ('s', 2) => ("%S", None),
            ('S', 3) => ("%3f", None),
            ('S', 6) => ("%6f", None),
            ('S', 9) => ("%9f", None),
            ('a', 1) => ("%p", None),
            ('E', 1..=3) => ("%a", None),
            ('E', 4) => ("%A", None),
            ('X', 1) => ("", offset(OffsetWidth::Hours, true)),
            ('X', 2) => ("", offset(OffsetWidth::Compact, true)),
            ('X', 3) => ("", offset(OffsetWidth::Colon, true)),
            ('x', 1) => ("", offset(OffsetWidth::Hours, false)),
            ('x', 2) | ('Z', 1..=3) => ("", offset(OffsetWidth::Compact, false)),
            ('x', 3) => ("", offset(OffsetWidth::Colon, false)),
            ('Z', 5) => ("", offset(OffsetWidth::Colon, true)),
            _ => {
                let letters: String = std::iter::repeat_n(c, run).collect();
                return Err(KronosError::format(format!(
                    "unsupported field '{letters}' in pattern '{pattern}'"
                )));
            }
        };
        match style {
            Some(style) => {
                if !out.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut out)));
                }
                segments.push(Segment::Offset(style));
            }
            None => out.push_str(item),
        }
        i += run;
    }

    if !out.is_empty() {
        segments.push(Segment::Text(out));
    }
    Ok(segments)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kronos_api::ErrorKind;

    #[test]
    fn translates_common_patterns() {
        let p = Pattern::compile("yyyy-MM-dd HH:mm:ss").unwrap();
        assert_eq!(p.parse_strftime(), "%Y-%m-%d %H:%M:%S");
        assert!(!p.has_offset());

        let p = Pattern::compile("yyyy-MM-dd'T'HH:mm:ss.SSSXXX").unwrap();
        assert_eq!(p.parse_strftime(), "%Y-%m-%dT%H:%M:%S.%3f%#z");
        assert!(p.has_offset());

        let p = Pattern::compile("dd/MM/yy h:mm a '100%' ''").unwrap();
        assert_eq!(p.parse_strftime(), "%d/%m/%y %-I:%M %p 100%% '");
    }

    #[test]
    fn rejects_unsupported_letters() {
        for bad in ["yyyy-MM-dd HH:mm z", "VV", "QQQ", "'open"] {
            let err = Pattern::compile(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{bad}");
        }
    }

    #[test]
    fn wall_clock_text_is_read_in_zone() {
        let p = Pattern::compile("yyyy-MM-dd HH:mm:ss").unwrap();
        let shanghai = Zone::parse("Asia/Shanghai").unwrap();
        let instant = p.parse("2025-05-20 18:00:00", &shanghai).unwrap();
        assert_eq!(p.format(&instant, &Zone::utc()).unwrap(), "2025-05-20 10:00:00");
    }

    #[test]
    fn offset_text_keeps_its_own_instant() {
        let p = Pattern::compile("yyyy-MM-dd HH:mm:ssXXX").unwrap();
        let instant = p.parse("2025-05-20 18:00:00+08:00", &Zone::utc()).unwrap();
        let tokyo = Zone::parse("Asia/Tokyo").unwrap();
        assert_eq!(p.format(&instant, &tokyo).unwrap(), "2025-05-20 19:00:00+09:00");
    }

    #[test]
    fn non_matching_text_fails() {
        let p = Pattern::compile("yyyy-MM-dd HH:mm:ss").unwrap();
        assert!(p.parse("hello world", &Zone::utc()).is_err());
        assert!(p.parse("2025-05-20", &Zone::utc()).is_err());
    }

    #[test]
    fn zulu_offsets_are_read_and_written() {
        let p = Pattern::compile("yyyy-MM-dd'T'HH:mm:ssXXX").unwrap();
        let instant = p.parse("2025-05-20T00:00:00Z", &Zone::utc()).unwrap();
        let shanghai = Zone::parse("Asia/Shanghai").unwrap();
        assert_eq!(p.format(&instant, &shanghai).unwrap(), "2025-05-20T08:00:00+08:00");
        assert_eq!(p.format(&instant, &Zone::utc()).unwrap(), "2025-05-20T00:00:00Z");

        let short = Pattern::compile("yyyy-MM-dd HH:mmX").unwrap();
        assert_eq!(short.format(&instant, &Zone::utc()).unwrap(), "2025-05-20 00:00Z");
        assert_eq!(short.format(&instant, &shanghai).unwrap(), "2025-05-20 08:00+08");
        let kolkata = Zone::parse("Asia/Kolkata").unwrap();
        assert_eq!(short.format(&instant, &kolkata).unwrap(), "2025-05-20 05:30+0530");
        assert_eq!(short.parse("2025-05-20 08:00+08", &Zone::utc()).unwrap(), instant);
    }

    #[test]
    fn plain_offset_letters_never_write_zulu() {
        let instant = DateTime::parse_from_rfc3339("2025-05-20T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let rfc822 = Pattern::compile("yyyy-MM-dd HH:mm:ss Z").unwrap();
        assert_eq!(rfc822.format(&instant, &Zone::utc()).unwrap(), "2025-05-20 00:00:00 +0000");
        let iso = Pattern::compile("yyyy-MM-dd HH:mm:ssxxx").unwrap();
        assert_eq!(iso.format(&instant, &Zone::utc()).unwrap(), "2025-05-20 00:00:00+00:00");
        // Lenient on the way in.
        assert_eq!(iso.parse("2025-05-20 00:00:00Z", &Zone::utc()).unwrap(), instant);
    }
}
