//! Value types.

use std::fmt;

/// Type of an SSA value.
///
/// The catalogue is deliberately small: enough to type arithmetic,
/// comparisons, and loop bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    /// Signless integer of the given bit width (`i1`, `i32`, ...). Widths
    /// above 64 are not representable.
    Int(u8),
    /// Target index type; 64 bits wide for folding purposes.
    Index,
    F32,
    F64,
}

impl Type {
    pub const I1: Type = Type::Int(1);
    pub const I8: Type = Type::Int(8);
    pub const I32: Type = Type::Int(32);
    pub const I64: Type = Type::Int(64);

    /// Bit width of integer-like types, `None` for floats.
    pub fn int_width(self) -> Option<u32> {
        match self {
            Type::Int(w) => Some(u32::from(w)),
            Type::Index => Some(64),
            Type::F32 | Type::F64 => None,
        }
    }

    #[inline]
    pub fn is_integer_like(self) -> bool {
        self.int_width().is_some()
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int(w) => write!(f, "i{w}"),
            Type::Index => f.write_str("index"),
            Type::F32 => f.write_str("f32"),
            Type::F64 => f.write_str("f64"),
        }
    }
}
