//! Arena handles for IR entities.
//!
//! Every value, operation, use, block, and region of a [`Function`] lives in
//! an arena owned by that function and is referenced by a 32-bit handle.
//! Slots are never reused within a function, so a handle to an erased
//! entity stays detectably dead instead of aliasing a newer one.
//!
//! [`Function`]: crate::Function

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create a new handle from a raw index.
            #[inline]
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Handle for the next slot of an arena currently holding `len` entries.
            pub(crate) fn from_len(len: usize) -> Self {
                Self(
                    u32::try_from(len).unwrap_or_else(|_| {
                        panic!(concat!(stringify!($name), " count exceeds u32::MAX"))
                    }),
                )
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// An SSA value: an operation result, block argument, function
    /// argument, or induction variable.
    ValueId,
    "%"
);

define_id!(
    /// An operation.
    OpId,
    "op"
);

define_id!(
    /// A single operand slot's reference to a value.
    UseId,
    "use"
);

define_id!(
    /// A block inside a region.
    BlockId,
    "^bb"
);

define_id!(
    /// A region: an ordered list of blocks owned by an operation or a function body.
    RegionId,
    "region"
);
