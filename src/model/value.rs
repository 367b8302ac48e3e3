//! Typed scalar values and the XML Schema value-type vocabulary.
//!
//! Every typed attribute of the metamodel (property values, range bounds,
//! qualifier and extension values) is declared with a [`DataTypeDefXsd`] and
//! stored as a canonical [`Value`]. Both wire formats carry values as the
//! rendered lexical string, so the two functions that matter are:
//!
//! - [`Value::parse`] - lexical string under a declared type → canonical value
//! - [`Value::render`] - canonical value → canonical lexical string
//!
//! `Value::parse(t, &v.render()) == Ok(v)` holds for every value `v` that
//! conforms to `t`.

use std::str::FromStr;
use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::error::ModelError;

// ============================================================================
// VALUE TYPES
// ============================================================================

/// The closed set of XML Schema primitive types a value may be declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataTypeDefXsd {
    AnyUri,
    Base64Binary,
    Boolean,
    Byte,
    Date,
    DateTime,
    Decimal,
    Double,
    Duration,
    Float,
    GDay,
    GMonth,
    GMonthDay,
    GYear,
    GYearMonth,
    HexBinary,
    Int,
    Integer,
    Long,
    NegativeInteger,
    NonNegativeInteger,
    NonPositiveInteger,
    PositiveInteger,
    Short,
    String,
    Time,
    UnsignedByte,
    UnsignedInt,
    UnsignedLong,
    UnsignedShort,
}

impl DataTypeDefXsd {
    /// Every value type, in vocabulary order.
    pub const ALL: [Self; 30] = [
        Self::AnyUri,
        Self::Base64Binary,
        Self::Boolean,
        Self::Byte,
        Self::Date,
        Self::DateTime,
        Self::Decimal,
        Self::Double,
        Self::Duration,
        Self::Float,
        Self::GDay,
        Self::GMonth,
        Self::GMonthDay,
        Self::GYear,
        Self::GYearMonth,
        Self::HexBinary,
        Self::Int,
        Self::Integer,
        Self::Long,
        Self::NegativeInteger,
        Self::NonNegativeInteger,
        Self::NonPositiveInteger,
        Self::PositiveInteger,
        Self::Short,
        Self::String,
        Self::Time,
        Self::UnsignedByte,
        Self::UnsignedInt,
        Self::UnsignedLong,
        Self::UnsignedShort,
    ];

    /// The prefixed wire name, e.g. `xs:int`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnyUri => "xs:anyURI",
            Self::Base64Binary => "xs:base64Binary",
            Self::Boolean => "xs:boolean",
            Self::Byte => "xs:byte",
            Self::Date => "xs:date",
            Self::DateTime => "xs:dateTime",
            Self::Decimal => "xs:decimal",
            Self::Double => "xs:double",
            Self::Duration => "xs:duration",
            Self::Float => "xs:float",
            Self::GDay => "xs:gDay",
            Self::GMonth => "xs:gMonth",
            Self::GMonthDay => "xs:gMonthDay",
            Self::GYear => "xs:gYear",
            Self::GYearMonth => "xs:gYearMonth",
            Self::HexBinary => "xs:hexBinary",
            Self::Int => "xs:int",
            Self::Integer => "xs:integer",
            Self::Long => "xs:long",
            Self::NegativeInteger => "xs:negativeInteger",
            Self::NonNegativeInteger => "xs:nonNegativeInteger",
            Self::NonPositiveInteger => "xs:nonPositiveInteger",
            Self::PositiveInteger => "xs:positiveInteger",
            Self::Short => "xs:short",
            Self::String => "xs:string",
            Self::Time => "xs:time",
            Self::UnsignedByte => "xs:unsignedByte",
            Self::UnsignedInt => "xs:unsignedInt",
            Self::UnsignedLong => "xs:unsignedLong",
            Self::UnsignedShort => "xs:unsignedShort",
        }
    }

    /// Look up a value type by wire name.
    ///
    /// The unprefixed spelling (`int`) of older documents is accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        let local = name.strip_prefix("xs:").unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|t| &t.as_str()["xs:".len()..] == local)
    }

    /// Returns true for `xs:integer` and all of its restrictions.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::Long
                | Self::Int
                | Self::Short
                | Self::Byte
                | Self::UnsignedLong
                | Self::UnsignedInt
                | Self::UnsignedShort
                | Self::UnsignedByte
                | Self::PositiveInteger
                | Self::NonNegativeInteger
                | Self::NegativeInteger
                | Self::NonPositiveInteger
        )
    }

    /// Range check for the integer family.
    fn admits_integer(&self, n: i128) -> bool {
        match self {
            Self::Integer => true,
            Self::Long => i64::try_from(n).is_ok(),
            Self::Int => i32::try_from(n).is_ok(),
            Self::Short => i16::try_from(n).is_ok(),
            Self::Byte => i8::try_from(n).is_ok(),
            Self::UnsignedLong => u64::try_from(n).is_ok(),
            Self::UnsignedInt => u32::try_from(n).is_ok(),
            Self::UnsignedShort => u16::try_from(n).is_ok(),
            Self::UnsignedByte => u8::try_from(n).is_ok(),
            Self::PositiveInteger => n > 0,
            Self::NonNegativeInteger => n >= 0,
            Self::NegativeInteger => n < 0,
            Self::NonPositiveInteger => n <= 0,
            _ => false,
        }
    }

    /// Sign check for integers outside the `i128` range; only the unbounded
    /// types admit them.
    fn admits_unbounded(&self, negative: bool) -> bool {
        match self {
            Self::Integer => true,
            Self::PositiveInteger | Self::NonNegativeInteger => !negative,
            Self::NegativeInteger | Self::NonPositiveInteger => negative,
            _ => false,
        }
    }
}

impl std::fmt::Display for DataTypeDefXsd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TIMEZONES
// ============================================================================

/// Timezone suffix of a date/time value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeZone {
    /// `Z`
    Utc,
    /// `±hh:mm`, in minutes east of UTC.
    Offset(i16),
}

impl TimeZone {
    fn render(&self) -> String {
        match self {
            Self::Utc => "Z".to_string(),
            Self::Offset(minutes) => {
                let sign = if *minutes < 0 { '-' } else { '+' };
                let abs = minutes.unsigned_abs();
                format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
            }
        }
    }

    /// Split a trailing timezone off a lexical date/time.
    fn split(text: &str) -> Option<(&str, Option<TimeZone>)> {
        if let Some(rest) = text.strip_suffix('Z') {
            return Some((rest, Some(Self::Utc)));
        }
        let bytes = text.as_bytes();
        if bytes.len() < 6 {
            return Some((text, None));
        }
        let at = bytes.len() - 6;
        if !matches!(bytes[at], b'+' | b'-') || bytes[at + 3] != b':' {
            return Some((text, None));
        }
        let digits = [bytes[at + 1], bytes[at + 2], bytes[at + 4], bytes[at + 5]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let hours = i16::from(digits[0] - b'0') * 10 + i16::from(digits[1] - b'0');
        let minutes = i16::from(digits[2] - b'0') * 10 + i16::from(digits[3] - b'0');
        if minutes > 59 || hours > 14 || (hours == 14 && minutes != 0) {
            return None;
        }
        let offset = hours * 60 + minutes;
        let offset = if bytes[at] == b'-' { -offset } else { offset };
        Some((&text[..at], Some(Self::Offset(offset))))
    }
}

// ============================================================================
// LEXICAL GRAMMARS
// ============================================================================

fn grammar(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in grammar {pattern}: {e}"))
}

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| grammar(r"^[+-]?(\d+(\.\d*)?|\.\d+)$"));
static FLOATING: LazyLock<Regex> =
    LazyLock::new(|| grammar(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$"));
static DATE: LazyLock<Regex> = LazyLock::new(|| grammar(r"^-?\d{4,}-\d{2}-\d{2}$"));
static TIME: LazyLock<Regex> = LazyLock::new(|| grammar(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$"));
static DATE_TIME: LazyLock<Regex> =
    LazyLock::new(|| grammar(r"^-?\d{4,}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?$"));
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    grammar(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
});
static G_YEAR: LazyLock<Regex> =
    LazyLock::new(|| grammar(r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$"));
static G_YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| grammar(r"^-?\d{4,}-(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$"));
static G_MONTH: LazyLock<Regex> =
    LazyLock::new(|| grammar(r"^--(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$"));
static G_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    grammar(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$")
});
static G_DAY: LazyLock<Regex> =
    LazyLock::new(|| grammar(r"^---(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$"));

/// Checks the `xs:duration` lexical form.
pub(crate) fn is_duration(text: &str) -> bool {
    DURATION.is_match(text) && !text.ends_with('P') && !text.ends_with('T')
}

/// Checks the `xs:dateTime` lexical form.
pub(crate) fn is_date_time(text: &str) -> bool {
    Value::parse(DataTypeDefXsd::DateTime, text).is_ok()
}

// ============================================================================
// VALUES
// ============================================================================

/// A canonical typed value.
///
/// The integer family shares one variant and is range-checked against the
/// declared type; so do `xs:string` and `xs:anyURI`. Integers beyond `i128`
/// and all decimals are kept as canonical lexical strings, so neither has a
/// precision limit. Durations and the
/// Gregorian fragments (`xs:gYear` ...) are validated lexically and kept
/// verbatim together with their type.
#[derive(Clone, Debug)]
pub enum Value {
    Boolean(bool),
    Integer(i128),
    /// Canonical digits of an unbounded integer outside the `i128` range.
    BigInteger(String),
    /// Canonical `xs:decimal` lexical form.
    Decimal(String),
    Float(f32),
    Double(f64),
    String(String),
    Date(NaiveDate, Option<TimeZone>),
    DateTime(NaiveDateTime, Option<TimeZone>),
    Time(NaiveTime, Option<TimeZone>),
    Lexical(DataTypeDefXsd, String),
    Base64(Vec<u8>),
    Hex(Vec<u8>),
}

impl Value {
    /// Parse a lexical string under a declared value type.
    pub fn parse(value_type: DataTypeDefXsd, text: &str) -> Result<Self, ModelError> {
        let mismatch = || ModelError::mismatch(value_type, text);
        match value_type {
            DataTypeDefXsd::String | DataTypeDefXsd::AnyUri => Ok(Self::String(text.to_string())),
            DataTypeDefXsd::Boolean => match text {
                "true" | "1" => Ok(Self::Boolean(true)),
                "false" | "0" => Ok(Self::Boolean(false)),
                _ => Err(mismatch()),
            },
            t if t.is_integer() => parse_integer(t, text).ok_or_else(mismatch),
            DataTypeDefXsd::Decimal => parse_decimal(text).map(Self::Decimal).ok_or_else(mismatch),
            DataTypeDefXsd::Double => parse_floating::<f64>(text)
                .map(Self::Double)
                .ok_or_else(mismatch),
            DataTypeDefXsd::Float => parse_floating::<f32>(text)
                .map(Self::Float)
                .ok_or_else(mismatch),
            DataTypeDefXsd::Date => {
                let (body, tz) = TimeZone::split(text).ok_or_else(mismatch)?;
                if !DATE.is_match(body) {
                    return Err(mismatch());
                }
                NaiveDate::parse_from_str(body, "%Y-%m-%d")
                    .map(|d| Self::Date(d, tz))
                    .map_err(|_| mismatch())
            }
            DataTypeDefXsd::DateTime => {
                let (body, tz) = TimeZone::split(text).ok_or_else(mismatch)?;
                if !DATE_TIME.is_match(body) {
                    return Err(mismatch());
                }
                NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|dt| Self::DateTime(dt, tz))
                    .map_err(|_| mismatch())
            }
            DataTypeDefXsd::Time => {
                let (body, tz) = TimeZone::split(text).ok_or_else(mismatch)?;
                if !TIME.is_match(body) {
                    return Err(mismatch());
                }
                NaiveTime::parse_from_str(body, "%H:%M:%S%.f")
                    .map(|t| Self::Time(t, tz))
                    .map_err(|_| mismatch())
            }
            DataTypeDefXsd::Duration => {
                if is_duration(text) {
                    Ok(Self::Lexical(value_type, text.to_string()))
                } else {
                    Err(mismatch())
                }
            }
            DataTypeDefXsd::GDay
            | DataTypeDefXsd::GMonth
            | DataTypeDefXsd::GMonthDay
            | DataTypeDefXsd::GYear
            | DataTypeDefXsd::GYearMonth => {
                let grammar = match value_type {
                    DataTypeDefXsd::GDay => &G_DAY,
                    DataTypeDefXsd::GMonth => &G_MONTH,
                    DataTypeDefXsd::GMonthDay => &G_MONTH_DAY,
                    DataTypeDefXsd::GYear => &G_YEAR,
                    _ => &G_YEAR_MONTH,
                };
                if grammar.is_match(text) {
                    Ok(Self::Lexical(value_type, text.to_string()))
                } else {
                    Err(mismatch())
                }
            }
            DataTypeDefXsd::Base64Binary => {
                let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                BASE64
                    .decode(compact.as_bytes())
                    .map(Self::Base64)
                    .map_err(|_| mismatch())
            }
            DataTypeDefXsd::HexBinary => hex::decode(text).map(Self::Hex).map_err(|_| mismatch()),
            // the integer family is handled by the guard arm above
            _ => Err(mismatch()),
        }
    }

    /// Render the canonical lexical string.
    pub fn render(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::BigInteger(digits) | Self::Decimal(digits) => digits.clone(),
            Self::Float(f) => render_floating(f64::from(*f), || f.to_string()),
            Self::Double(d) => render_floating(*d, || d.to_string()),
            Self::String(s) => s.clone(),
            Self::Date(d, tz) => with_timezone(d.format("%Y-%m-%d").to_string(), tz),
            Self::DateTime(dt, tz) => {
                with_timezone(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(), tz)
            }
            Self::Time(t, tz) => with_timezone(t.format("%H:%M:%S%.f").to_string(), tz),
            Self::Lexical(_, text) => text.clone(),
            Self::Base64(bytes) => BASE64.encode(bytes),
            Self::Hex(bytes) => hex::encode_upper(bytes),
        }
    }

    /// Returns true if this value is a member of the declared type's value space.
    pub fn conforms_to(&self, value_type: DataTypeDefXsd) -> bool {
        use DataTypeDefXsd as T;
        match (self, value_type) {
            (Self::Boolean(_), T::Boolean) => true,
            (Self::Integer(n), t) => t.admits_integer(*n),
            (Self::BigInteger(digits), t) => t.admits_unbounded(digits.starts_with('-')),
            (Self::Decimal(_), T::Decimal) => true,
            (Self::Float(_), T::Float) | (Self::Double(_), T::Double) => true,
            (Self::String(_), T::String | T::AnyUri) => true,
            (Self::Date(..), T::Date) | (Self::DateTime(..), T::DateTime) => true,
            (Self::Time(..), T::Time) => true,
            (Self::Lexical(declared, _), t) => *declared == t,
            (Self::Base64(_), T::Base64Binary) | (Self::Hex(_), T::HexBinary) => true,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::BigInteger(a), Self::BigInteger(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            // NaN must compare equal to itself for structural equality
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a, x), Self::Date(b, y)) => a == b && x == y,
            (Self::DateTime(a, x), Self::DateTime(b, y)) => a == b && x == y,
            (Self::Time(a, x), Self::Time(b, y)) => a == b && x == y,
            (Self::Lexical(s, a), Self::Lexical(t, b)) => s == t && a == b,
            (Self::Base64(a), Self::Base64(b)) => a == b,
            (Self::Hex(a), Self::Hex(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn parse_integer(value_type: DataTypeDefXsd, text: &str) -> Option<Value> {
    let (negative, digits) = split_sign(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = match digits.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let signed = if negative && digits != "0" {
        format!("-{digits}")
    } else {
        digits.to_string()
    };
    // digits are validated, so the only failure left is overflow
    match signed.parse::<i128>() {
        Ok(n) => value_type.admits_integer(n).then_some(Value::Integer(n)),
        Err(_) => value_type
            .admits_unbounded(negative)
            .then_some(Value::BigInteger(signed)),
    }
}

/// Canonical form: no `+`, no leading zeros in the whole part, no trailing
/// zeros in the fraction, no `.` without a fraction, and no negative zero.
fn parse_decimal(text: &str) -> Option<String> {
    if !DECIMAL.is_match(text) {
        return None;
    }
    let (negative, magnitude) = split_sign(text);
    let (whole, fraction) = magnitude.split_once('.').unwrap_or((magnitude, ""));
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let fraction = fraction.trim_end_matches('0');
    let sign = if negative && (whole != "0" || !fraction.is_empty()) {
        "-"
    } else {
        ""
    };
    Some(if fraction.is_empty() {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{fraction}")
    })
}

fn parse_floating<F>(text: &str) -> Option<F>
where
    F: FromStr + From<f32>,
{
    match text {
        "INF" | "+INF" => Some(F::from(f32::INFINITY)),
        "-INF" => Some(F::from(f32::NEG_INFINITY)),
        "NaN" => Some(F::from(f32::NAN)),
        _ if FLOATING.is_match(text) => text.parse::<F>().ok(),
        _ => None,
    }
}

fn render_floating(v: f64, finite: impl FnOnce() -> String) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        finite()
    }
}

fn with_timezone(mut text: String, tz: &Option<TimeZone>) -> String {
    if let Some(tz) = tz {
        text.push_str(&tz.render());
    }
    text
}
