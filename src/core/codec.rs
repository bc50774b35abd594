//! String encoding of setting values.
//!
//! Settings keep their value as a canonical string so that the backing file
//! and the console stay text based. This module decides which strings are
//! acceptable for a [`SettingType`], how they compare against a range, and
//! how typed values are read back out.

use std::fmt::{self, Display};

use bevy::color::Srgba;
use bevy::math::{Vec2, Vec3};
use thiserror::Error;

/// Declared type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SettingType {
    /// No type. Every write is rejected.
    #[default]
    None,
    Bool,
    Byte,
    Int32,
    Int64,
    Float,
    String,
    Color,
    Rotator,
    Vector2D,
    Vector3D,
}

impl SettingType {
    /// Display name of the type.
    pub fn name(&self) -> &'static str {
        match self {
            SettingType::None => "none",
            SettingType::Bool => "bool",
            SettingType::Byte => "byte",
            SettingType::Int32 => "int32",
            SettingType::Int64 => "int64",
            SettingType::Float => "float",
            SettingType::String => "string",
            SettingType::Color => "color",
            SettingType::Rotator => "rotator",
            SettingType::Vector2D => "vector2d",
            SettingType::Vector3D => "vector3d",
        }
    }

    /// Human readable description of the accepted syntax.
    pub fn expected(&self) -> &'static str {
        match self {
            SettingType::None => "nothing (setting has no type)",
            SettingType::Bool => "one of 0, 1, true, false",
            SettingType::Byte => "an integer between 0 and 255",
            SettingType::Int32 => "a 32-bit integer",
            SettingType::Int64 => "a 64-bit integer",
            SettingType::Float => "a decimal number",
            SettingType::String => "any text",
            SettingType::Color => "up to 8 hex digits, optionally prefixed with #",
            SettingType::Rotator => "3 space separated integers",
            SettingType::Vector2D => "2 space separated decimal numbers",
            SettingType::Vector3D => "3 space separated decimal numbers",
        }
    }

    /// Whether a range can be meaningfully applied to this type.
    pub fn supports_range(&self) -> bool {
        !matches!(self, SettingType::None | SettingType::Bool | SettingType::String)
    }
}

impl Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reason a raw string was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("\"{raw}\" is not a valid {ty} value, expected {}", .ty.expected())]
    InvalidSyntax { ty: SettingType, raw: String },

    #[error("{ty} value {raw:?} contains a line break")]
    LineBreak { ty: SettingType, raw: String },

    #[error("\"{raw}\" is out of range, expected a value between \"{min}\" and \"{max}\"")]
    OutOfRange {
        raw: String,
        min: String,
        max: String,
    },
}

/// RGBA color stored as hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::rgba(0, 0, 0, 255)
    }
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse `RRGGBB` / `RRGGBBAA`, with or without a leading `#`.
    ///
    /// Up to six digits are read as an opaque `0xRRGGBB` value, seven or eight
    /// as `0xRRGGBBAA`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let digits = raw.trim().strip_prefix('#').unwrap_or(raw.trim());
        if digits.is_empty() || digits.len() > 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        if digits.len() <= 6 {
            Some(Self::from_rgba_u32((value << 8) | 0xFF))
        } else {
            Some(Self::from_rgba_u32(value))
        }
    }

    /// Canonical `#RRGGBBAA` form.
    pub fn to_hex(&self) -> String {
        format!("#{:08X}", self.to_rgba_u32())
    }

    pub const fn to_rgba_u32(&self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    pub const fn from_rgba_u32(value: u32) -> Self {
        let [r, g, b, a] = value.to_be_bytes();
        Self { r, g, b, a }
    }
}

impl From<Color> for Srgba {
    fn from(color: Color) -> Self {
        Srgba::rgba_u8(color.r, color.g, color.b, color.a)
    }
}

impl From<Color> for bevy::color::Color {
    fn from(color: Color) -> Self {
        bevy::color::Color::Srgba(color.into())
    }
}

/// Integer rotation in engine units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rotator {
    pub pitch: i32,
    pub yaw: i32,
    pub roll: i32,
}

impl Rotator {
    pub const fn new(pitch: i32, yaw: i32, roll: i32) -> Self {
        Self { pitch, yaw, roll }
    }
}

fn is_integer_syntax(raw: &str, allow_negative: bool) -> bool {
    let digits = match raw.strip_prefix('-') {
        Some(rest) if allow_negative => rest,
        Some(_) => return false,
        None => raw,
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn strip_float_suffix(raw: &str) -> &str {
    raw.strip_suffix(['f', 'F']).unwrap_or(raw)
}

fn is_float_syntax(raw: &str) -> bool {
    let body = strip_float_suffix(raw);
    let body = body.strip_prefix('-').unwrap_or(body);
    let mut digits = 0;
    let mut dots = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

pub(crate) fn parse_int<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if is_integer_syntax(raw, true) { raw.parse().ok() } else { None }
}

pub(crate) fn parse_float(raw: &str) -> Option<f32> {
    let raw = raw.trim();
    if !is_float_syntax(raw) {
        return None;
    }
    strip_float_suffix(raw)
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
}

fn parse_byte(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    if is_integer_syntax(raw, false) { raw.parse().ok() } else { None }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Parse exactly `N` whitespace separated components.
fn parse_components<T, const N: usize>(raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<[T; N]>
where
    T: Copy + Default,
{
    let mut out = [T::default(); N];
    let mut parts = raw.split_whitespace();
    for slot in out.iter_mut() {
        *slot = parse(parts.next()?)?;
    }
    match parts.next() {
        Some(_) => None,
        None => Some(out),
    }
}

pub(crate) fn parse_rotator(raw: &str) -> Option<Rotator> {
    parse_components::<i32, 3>(raw, parse_int::<i32>).map(|[p, y, r]| Rotator::new(p, y, r))
}

pub(crate) fn parse_vec2(raw: &str) -> Option<Vec2> {
    parse_components::<f32, 2>(raw, parse_float).map(Vec2::from_array)
}

pub(crate) fn parse_vec3(raw: &str) -> Option<Vec3> {
    parse_components::<f32, 3>(raw, parse_float).map(Vec3::from_array)
}

/// Check `raw` against the syntax of `ty`.
///
/// Line breaks are rejected for every type, since a stored value must fit on
/// one line of the settings file.
pub fn validate(ty: SettingType, raw: &str) -> Result<(), ValueError> {
    if has_line_break(raw) {
        return Err(ValueError::LineBreak {
            ty,
            raw: raw.to_string(),
        });
    }
    let ok = match ty {
        SettingType::None => false,
        SettingType::Bool => parse_bool(raw).is_some(),
        SettingType::Byte => parse_byte(raw).is_some(),
        SettingType::Int32 => parse_int::<i32>(raw).is_some(),
        SettingType::Int64 => parse_int::<i64>(raw).is_some(),
        SettingType::Float => parse_float(raw).is_some(),
        SettingType::String => true,
        SettingType::Color => Color::from_hex(raw).is_some(),
        SettingType::Rotator => parse_rotator(raw).is_some(),
        SettingType::Vector2D => parse_vec2(raw).is_some(),
        SettingType::Vector3D => parse_vec3(raw).is_some(),
    };
    if ok {
        Ok(())
    } else {
        Err(ValueError::InvalidSyntax {
            ty,
            raw: raw.to_string(),
        })
    }
}

#[inline]
pub(crate) fn has_line_break(raw: &str) -> bool {
    raw.contains(['\n', '\r'])
}

/// Boolean form of [`validate`].
#[inline]
pub fn is_valid(ty: SettingType, raw: &str) -> bool {
    validate(ty, raw).is_ok()
}

fn within<T: PartialOrd>(value: T, min: T, max: T) -> bool {
    min <= value && value <= max
}

fn within_all<T: PartialOrd + Copy, const N: usize>(value: [T; N], min: [T; N], max: [T; N]) -> bool {
    (0..N).all(|i| within(value[i], min[i], max[i]))
}

/// Check whether `raw` lies in the inclusive range `[min, max]`.
///
/// Bool values only get their syntax checked. Composite values are compared
/// component-wise and fail if any component is outside. Anything that does
/// not parse, bounds included, counts as out of range.
pub fn is_in_range(ty: SettingType, raw: &str, min: &str, max: &str) -> bool {
    let check = || -> Option<bool> {
        Some(match ty {
            SettingType::None => false,
            SettingType::Bool => parse_bool(raw).is_some(),
            SettingType::String => true,
            SettingType::Byte => within(parse_byte(raw)?, parse_byte(min)?, parse_byte(max)?),
            SettingType::Int32 => within(
                parse_int::<i32>(raw)?,
                parse_int::<i32>(min)?,
                parse_int::<i32>(max)?,
            ),
            SettingType::Int64 => within(
                parse_int::<i64>(raw)?,
                parse_int::<i64>(min)?,
                parse_int::<i64>(max)?,
            ),
            SettingType::Float => within(parse_float(raw)?, parse_float(min)?, parse_float(max)?),
            SettingType::Color => within(
                Color::from_hex(raw)?.to_rgba_u32(),
                Color::from_hex(min)?.to_rgba_u32(),
                Color::from_hex(max)?.to_rgba_u32(),
            ),
            SettingType::Rotator => {
                let [v, lo, hi] = [parse_rotator(raw)?, parse_rotator(min)?, parse_rotator(max)?]
                    .map(|r| [r.pitch, r.yaw, r.roll]);
                within_all(v, lo, hi)
            }
            SettingType::Vector2D => within_all(
                parse_vec2(raw)?.to_array(),
                parse_vec2(min)?.to_array(),
                parse_vec2(max)?.to_array(),
            ),
            SettingType::Vector3D => within_all(
                parse_vec3(raw)?.to_array(),
                parse_vec3(min)?.to_array(),
                parse_vec3(max)?.to_array(),
            ),
        })
    };
    check().unwrap_or(false)
}

/// Normalize an already validated value.
///
/// Invalid input is returned unchanged.
pub fn canonicalize(ty: SettingType, raw: &str) -> String {
    let canonical = match ty {
        SettingType::Bool => parse_bool(raw).map(|b| b.to_string()),
        SettingType::Byte => parse_byte(raw).map(|v| v.to_string()),
        SettingType::Int32 => parse_int::<i32>(raw).map(|v| v.to_string()),
        SettingType::Int64 => parse_int::<i64>(raw).map(|v| v.to_string()),
        SettingType::Float => is_float_syntax(raw.trim()).then(|| strip_float_suffix(raw.trim()).to_string()),
        SettingType::Color => Color::from_hex(raw).map(|c| c.to_hex()),
        SettingType::Rotator => parse_rotator(raw).map(|r| r.to_setting_string()),
        SettingType::Vector2D | SettingType::Vector3D => is_valid(ty, raw).then(|| {
            raw.split_whitespace()
                .map(strip_float_suffix)
                .collect::<Vec<_>>()
                .join(" ")
        }),
        SettingType::None | SettingType::String => None,
    };
    canonical.unwrap_or_else(|| raw.to_string())
}

/// Values that can be read from and written to a setting.
///
/// Reading never fails: a value that does not convert yields `Default::default()`.
pub trait SettingValue: Default + Sized {
    /// The setting type this Rust type maps onto.
    const TYPE: SettingType;

    /// Convert the stored string of a setting declared as `ty`.
    fn from_setting(ty: SettingType, raw: &str) -> Option<Self>;

    /// Encode for storage.
    fn to_setting_string(&self) -> String;
}

impl SettingValue for bool {
    const TYPE: SettingType = SettingType::Bool;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Bool => parse_bool(raw),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for u8 {
    const TYPE: SettingType = SettingType::Byte;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Byte => parse_byte(raw),
            SettingType::Int32 | SettingType::Int64 => parse_int::<i64>(raw).and_then(|v| u8::try_from(v).ok()),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for i32 {
    const TYPE: SettingType = SettingType::Int32;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Byte => parse_byte(raw).map(i32::from),
            SettingType::Int32 => parse_int(raw),
            // Values that do not fit read as zero.
            SettingType::Int64 => parse_int::<i64>(raw).map(|v| i32::try_from(v).unwrap_or(0)),
            SettingType::Float => parse_float(raw).map(|v| v as i32),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for i64 {
    const TYPE: SettingType = SettingType::Int64;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Byte => parse_byte(raw).map(i64::from),
            SettingType::Int32 | SettingType::Int64 => parse_int(raw),
            SettingType::Float => parse_float(raw).map(|v| v as i64),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for f32 {
    const TYPE: SettingType = SettingType::Float;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Byte => parse_byte(raw).map(f32::from),
            SettingType::Int32 => parse_int::<i32>(raw).map(|v| v as f32),
            SettingType::Int64 => parse_int::<i64>(raw).map(|v| v as f32),
            SettingType::Float => parse_float(raw),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for String {
    const TYPE: SettingType = SettingType::String;

    fn from_setting(_ty: SettingType, raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn to_setting_string(&self) -> String {
        self.clone()
    }
}

impl SettingValue for Color {
    const TYPE: SettingType = SettingType::Color;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Color => Color::from_hex(raw),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        self.to_hex()
    }
}

impl SettingValue for Rotator {
    const TYPE: SettingType = SettingType::Rotator;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Rotator => parse_rotator(raw),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        format!("{} {} {}", self.pitch, self.yaw, self.roll)
    }
}

impl SettingValue for Vec2 {
    const TYPE: SettingType = SettingType::Vector2D;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Vector2D => parse_vec2(raw),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        format!("{} {}", self.x, self.y)
    }
}

impl SettingValue for Vec3 {
    const TYPE: SettingType = SettingType::Vector3D;

    fn from_setting(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::Vector3D => parse_vec3(raw),
            _ => None,
        }
    }

    fn to_setting_string(&self) -> String {
        format!("{} {} {}", self.x, self.y, self.z)
    }
}
