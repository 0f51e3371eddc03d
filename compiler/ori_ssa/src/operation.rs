//! Operations: the consumers and producers of SSA values.

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::attr::{Attribute, Attributes};
use crate::ids::{BlockId, OpId, RegionId, UseId, ValueId};
use crate::span::Span;

/// Name of the attribute holding a constant op's payload.
pub const VALUE_ATTR: &str = "value";

/// Name of the attribute holding a call's target.
pub const CALLEE_ATTR: &str = "callee";

// ── Kinds ───────────────────────────────────────────────────────────

/// Integer comparison predicate for [`OpKind::CmpI`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum CmpPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl CmpPredicate {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpPredicate::Eq => "eq",
            CmpPredicate::Ne => "ne",
            CmpPredicate::Slt => "slt",
            CmpPredicate::Sle => "sle",
            CmpPredicate::Sgt => "sgt",
            CmpPredicate::Sge => "sge",
        }
    }
}

/// Discriminator that selects an operation's fold rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum OpKind {
    /// Zero operands, one result, payload in the `value` attribute.
    Constant,
    AddI,
    SubI,
    MulI,
    DivSI,
    RemSI,
    /// Signed division producing `(quotient, remainder)`.
    DivRemSI,
    AndI,
    OrI,
    XorI,
    CmpI(CmpPredicate),
    AddF,
    SubF,
    MulF,
    DivF,
    /// `select(cond, a, b)`.
    Select,
    /// Call to the function named by the `callee` attribute.
    Call,
    Return,
    /// Terminator of a structured region body.
    Yield,
    /// Structured loop `for %iv = lb to ub step s`. One region whose entry
    /// block carries the induction variable.
    For,
    /// Structured conditional with a then-region and an else-region.
    If,
    /// Kind not known to this crate. Never folded.
    Custom(String),
}

bitflags! {
    /// Static properties of an operation kind.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct OpTraits: u8 {
        /// Materializes its `value` attribute; never folded itself.
        const CONSTANT_LIKE = 1 << 0;
        /// Operand order does not affect the result.
        const COMMUTATIVE = 1 << 1;
        /// Ends a block.
        const TERMINATOR = 1 << 2;
        /// Owns nested regions.
        const HAS_REGIONS = 1 << 3;
    }
}

impl OpKind {
    pub fn mnemonic(&self) -> &str {
        match self {
            OpKind::Constant => "constant",
            OpKind::AddI => "addi",
            OpKind::SubI => "subi",
            OpKind::MulI => "muli",
            OpKind::DivSI => "divsi",
            OpKind::RemSI => "remsi",
            OpKind::DivRemSI => "divremsi",
            OpKind::AndI => "andi",
            OpKind::OrI => "ori",
            OpKind::XorI => "xori",
            OpKind::CmpI(_) => "cmpi",
            OpKind::AddF => "addf",
            OpKind::SubF => "subf",
            OpKind::MulF => "mulf",
            OpKind::DivF => "divf",
            OpKind::Select => "select",
            OpKind::Call => "call",
            OpKind::Return => "return",
            OpKind::Yield => "yield",
            OpKind::For => "for",
            OpKind::If => "if",
            OpKind::Custom(name) => name,
        }
    }

    pub fn traits(&self) -> OpTraits {
        match self {
            OpKind::Constant => OpTraits::CONSTANT_LIKE,
            OpKind::AddI
            | OpKind::MulI
            | OpKind::AndI
            | OpKind::OrI
            | OpKind::XorI
            | OpKind::AddF
            | OpKind::MulF => OpTraits::COMMUTATIVE,
            OpKind::CmpI(CmpPredicate::Eq | CmpPredicate::Ne) => OpTraits::COMMUTATIVE,
            OpKind::Return | OpKind::Yield => OpTraits::TERMINATOR,
            OpKind::For | OpKind::If => OpTraits::HAS_REGIONS,
            OpKind::SubI
            | OpKind::DivSI
            | OpKind::RemSI
            | OpKind::DivRemSI
            | OpKind::CmpI(_)
            | OpKind::SubF
            | OpKind::DivF
            | OpKind::Select
            | OpKind::Call
            | OpKind::Custom(_) => OpTraits::empty(),
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::CmpI(pred) => write!(f, "cmpi {}", pred.as_str()),
            other => f.write_str(other.mnemonic()),
        }
    }
}

// ── Operations ──────────────────────────────────────────────────────

/// An operation: ordered operand uses, ordered result values, attributes,
/// nested regions, and a source span.
///
/// Operand and result arity are fixed at construction. The operation owns
/// its operand [`Use`](crate::Use)s and its result values, not the values
/// its operands read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    kind: OpKind,
    pub(crate) operands: SmallVec<[UseId; 4]>,
    pub(crate) results: SmallVec<[ValueId; 2]>,
    pub(crate) attrs: Attributes,
    span: Span,
    pub(crate) regions: SmallVec<[RegionId; 1]>,
    pub(crate) parent: Option<BlockId>,
    pub(crate) prev: Option<OpId>,
    pub(crate) next: Option<OpId>,
}

impl Operation {
    pub(crate) fn new(kind: OpKind, attrs: Attributes, span: Span) -> Self {
        Operation {
            kind,
            operands: SmallVec::new(),
            results: SmallVec::new(),
            attrs,
            span,
            regions: SmallVec::new(),
            parent: None,
            prev: None,
            next: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Operand uses in operand order.
    #[inline]
    pub fn operands(&self) -> &[UseId] {
        &self.operands
    }

    #[inline]
    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    #[inline]
    pub fn results(&self) -> &[ValueId] {
        &self.results
    }

    #[inline]
    pub fn num_results(&self) -> usize {
        self.results.len()
    }

    pub fn result(&self, index: usize) -> Option<ValueId> {
        self.results.get(index).copied()
    }

    #[inline]
    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    #[inline]
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attrs.get(name)
    }

    /// Block containing this operation.
    #[inline]
    pub fn parent_block(&self) -> Option<BlockId> {
        self.parent
    }

    #[inline]
    pub fn traits(&self) -> OpTraits {
        self.kind.traits()
    }

    /// The payload if this is a constant-producing operation: constant-like
    /// kind, no operands, exactly one result, and a `value` attribute.
    pub fn constant_value(&self) -> Option<&Attribute> {
        if !self.traits().contains(OpTraits::CONSTANT_LIKE)
            || !self.operands.is_empty()
            || self.results.len() != 1
        {
            return None;
        }
        self.attrs.get(VALUE_ATTR)
    }

    #[inline]
    pub fn is_terminator(&self) -> bool {
        self.traits().contains(OpTraits::TERMINATOR)
    }
}
