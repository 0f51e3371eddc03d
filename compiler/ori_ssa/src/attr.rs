//! Constant attributes and per-operation attribute maps.

use std::fmt;

use smallvec::SmallVec;

use crate::types::Type;

/// Immutable literal payload, tagged with the type of the value it would
/// produce when materialized.
///
/// Compared by value. There is no pooling: two constant ops holding equal
/// attributes are still two distinct ops.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    /// Integer literal. `value` is kept normalized to `ty`'s width: `i1` is
    /// `0` or `1`, other widths are sign-extended into the `i64`.
    Int { value: i64, ty: Type },
    /// Float literal stored as `f64` bits so the attribute stays `Eq + Hash`.
    Float { bits: u64, ty: Type },
    /// String payload (callee names and similar). Never a constant result.
    Str(String),
}

impl Attribute {
    /// Integer attribute, wrapping `value` to the width of `ty`.
    pub fn int(value: i64, ty: Type) -> Self {
        let width = ty.int_width().unwrap_or(64);
        Attribute::Int {
            value: wrap_to_width(value, width),
            ty,
        }
    }

    pub fn bool(value: bool) -> Self {
        Attribute::Int {
            value: i64::from(value),
            ty: Type::I1,
        }
    }

    /// Float attribute. `f32`-typed values are rounded through `f32` first.
    pub fn float(value: f64, ty: Type) -> Self {
        let value = if ty == Type::F32 {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "rounding to single precision is intended"
            )]
            let narrowed = value as f32;
            f64::from(narrowed)
        } else {
            value
        };
        Attribute::Float {
            bits: value.to_bits(),
            ty,
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Attribute::Str(value.into())
    }

    /// The value type this attribute materializes as, if any.
    pub fn ty(&self) -> Option<Type> {
        match self {
            Attribute::Int { ty, .. } | Attribute::Float { ty, .. } => Some(*ty),
            Attribute::Str(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Attribute::Float { bits, .. } => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Truncate `value` to `width` bits. `i1` is zero-extended so booleans read
/// as `0`/`1`; every other width is sign-extended.
pub(crate) fn wrap_to_width(value: i64, width: u32) -> i64 {
    match width {
        0 => 0,
        1 => value & 1,
        w if w >= 64 => value,
        w => {
            let shift = 64 - w;
            (value << shift) >> shift
        }
    }
}

/// Two's-complement reading of a stored `width`-bit value. Unlike
/// [`wrap_to_width`], `i1` sign-extends too, so `true` reads as `-1`.
pub(crate) fn sign_extend(value: i64, width: u32) -> i64 {
    match width {
        0 => 0,
        1 => -(value & 1),
        w => wrap_to_width(value, w),
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Int { value, ty } if *ty == Type::I1 => {
                write!(f, "{}", if *value == 0 { "false" } else { "true" })
            }
            Attribute::Int { value, ty } => write!(f, "{value} : {ty}"),
            Attribute::Float { bits, ty } => write!(f, "{:?} : {ty}", f64::from_bits(*bits)),
            Attribute::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Insertion-ordered mapping from attribute name to payload.
///
/// Operations carry only a handful of attributes, so a linear scan over a
/// small vector beats hashing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: SmallVec<[(String, Attribute); 2]>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// Insert or overwrite `name`, returning the previous payload.
    pub fn set(&mut self, name: impl Into<String>, attr: Attribute) -> Option<Attribute> {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, attr));
        }
        self.entries.push((name, attr));
        None
    }

    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Attribute)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (S, Attribute)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, attr) in iter {
            attrs.set(name, attr);
        }
        attrs
    }
}
