//! SSA values, uses, and use-lists.
//!
//! A [`Value`] is defined exactly once and consumed by any number of
//! operand slots. Each consuming slot is a [`Use`] owned by the consuming
//! operation; the value keeps the handles of all uses that target it in its
//! [`UseList`], so every consumer can be found without scanning the
//! function.
//!
//! Uses and use-lists are arena records linked by handles rather than
//! pointers. Each `Use` remembers its slot inside the target's list, which
//! makes unlinking O(1) (swap-remove plus one slot fix-up) and redirection
//! O(k) in the number of moved uses. All mutation goes through
//! [`Function`](crate::Function), which owns the arenas and keeps both sides
//! of the link in sync.

use std::fmt;

use smallvec::SmallVec;

use crate::function::Function;
use crate::ids::{BlockId, OpId, UseId, ValueId};
use crate::types::Type;

// ── Kinds ───────────────────────────────────────────────────────────

/// The five ways a value can be defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// Argument of a basic block in a CFG function.
    BlockArgument,
    /// Result of an operation in a CFG function.
    OperationResult,
    /// Argument of a structured function.
    FunctionArgument,
    /// Result of an operation (statement) in a structured function.
    StatementResult,
    /// Induction variable of a structured `for` loop.
    InductionVariable,
}

/// Which of the two value hierarchies a kind belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hierarchy {
    /// Basic-block (CFG) functions.
    Cfg,
    /// Structured (statement-level) functions.
    Structured,
}

impl ValueKind {
    pub fn hierarchy(self) -> Hierarchy {
        match self {
            ValueKind::BlockArgument | ValueKind::OperationResult => Hierarchy::Cfg,
            ValueKind::FunctionArgument
            | ValueKind::StatementResult
            | ValueKind::InductionVariable => Hierarchy::Structured,
        }
    }

    /// `true` for kinds produced by an operation.
    pub fn is_result(self) -> bool {
        matches!(self, ValueKind::OperationResult | ValueKind::StatementResult)
    }
}

/// Definition site of a value. The [`ValueKind`] is derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueDef {
    BlockArgument { block: BlockId, index: u32 },
    OperationResult { op: OpId, index: u32 },
    FunctionArgument { index: u32 },
    StatementResult { op: OpId, index: u32 },
    InductionVariable { block: BlockId },
}

impl ValueDef {
    pub fn kind(self) -> ValueKind {
        match self {
            ValueDef::BlockArgument { .. } => ValueKind::BlockArgument,
            ValueDef::OperationResult { .. } => ValueKind::OperationResult,
            ValueDef::FunctionArgument { .. } => ValueKind::FunctionArgument,
            ValueDef::StatementResult { .. } => ValueKind::StatementResult,
            ValueDef::InductionVariable { .. } => ValueKind::InductionVariable,
        }
    }
}

// ── Uses ────────────────────────────────────────────────────────────

/// One operand slot of `owner` reading `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Use {
    owner: OpId,
    target: ValueId,
    operand_index: u32,
    /// Position of this use inside `target`'s use-list.
    pub(crate) slot: u32,
}

impl Use {
    pub(crate) fn new(owner: OpId, target: ValueId, operand_index: u32) -> Self {
        Use {
            owner,
            target,
            operand_index,
            slot: 0,
        }
    }

    /// The consuming operation.
    #[inline]
    pub fn owner(&self) -> OpId {
        self.owner
    }

    /// The value read through this operand slot.
    #[inline]
    pub fn target(&self) -> ValueId {
        self.target
    }

    /// Position of this use in the owner's operand list.
    #[inline]
    pub fn operand_index(&self) -> u32 {
        self.operand_index
    }

    pub(crate) fn retarget(&mut self, target: ValueId, slot: u32) {
        self.target = target;
        self.slot = slot;
    }
}

/// Set of uses targeting one value.
///
/// Order is an implementation detail: unlinking swap-removes, and merging
/// through `replace_all_uses_with` appends. Callers must not rely on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UseList {
    uses: SmallVec<[UseId; 4]>,
}

impl UseList {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.uses.len()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = UseId> + '_ {
        self.uses.iter().copied()
    }

    pub fn contains(&self, id: UseId) -> bool {
        self.uses.contains(&id)
    }

    pub(crate) fn get(&self, slot: u32) -> Option<UseId> {
        self.uses.get(slot as usize).copied()
    }

    /// Append `id`, returning the slot it landed in.
    pub(crate) fn push(&mut self, id: UseId) -> u32 {
        let slot = u32::try_from(self.uses.len())
            .unwrap_or_else(|_| panic!("use-list length exceeds u32::MAX"));
        self.uses.push(id);
        slot
    }

    /// Remove the entry at `slot`. Returns the use that was moved into
    /// `slot` to fill the hole, if any; its recorded slot must be updated.
    pub(crate) fn swap_remove(&mut self, slot: u32) -> Option<UseId> {
        let slot = slot as usize;
        self.uses.swap_remove(slot);
        self.uses.get(slot).copied()
    }

    pub(crate) fn take(&mut self) -> SmallVec<[UseId; 4]> {
        std::mem::take(&mut self.uses)
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// A typed SSA value and its use-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Value {
    def: ValueDef,
    ty: Type,
    pub(crate) uses: UseList,
}

impl Value {
    pub(crate) fn new(def: ValueDef, ty: Type) -> Self {
        Value {
            def,
            ty,
            uses: UseList::default(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.def.kind()
    }

    #[inline]
    pub fn ty(&self) -> Type {
        self.ty
    }

    #[inline]
    pub fn def(&self) -> ValueDef {
        self.def
    }

    /// The operation producing this value, or `None` for arguments and
    /// induction variables.
    pub fn defining_op(&self) -> Option<OpId> {
        match self.def {
            ValueDef::OperationResult { op, .. } | ValueDef::StatementResult { op, .. } => Some(op),
            ValueDef::BlockArgument { .. }
            | ValueDef::FunctionArgument { .. }
            | ValueDef::InductionVariable { .. } => None,
        }
    }

    #[inline]
    pub fn uses(&self) -> &UseList {
        &self.uses
    }

    #[inline]
    pub fn use_empty(&self) -> bool {
        self.uses.is_empty()
    }

    #[inline]
    pub fn has_one_use(&self) -> bool {
        self.uses.len() == 1
    }
}

// ── Hierarchy views ─────────────────────────────────────────────────

/// Kinds a [`CfgValue`] can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CfgValueKind {
    BlockArgument,
    InstResult,
}

/// Kinds a [`StmtValue`] can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StmtValueKind {
    FunctionArgument,
    StmtResult,
    InductionVar,
}

/// A value known to belong to a CFG function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CfgValue(ValueId);

impl CfgValue {
    /// View `id` as a CFG value, or `None` if it is dead or belongs to the
    /// structured hierarchy.
    pub fn new(func: &Function, id: ValueId) -> Option<Self> {
        let value = func.try_value(id)?;
        (value.kind().hierarchy() == Hierarchy::Cfg).then_some(CfgValue(id))
    }

    #[inline]
    pub fn id(self) -> ValueId {
        self.0
    }

    pub fn kind(self, func: &Function) -> CfgValueKind {
        match func.value(self.0).kind() {
            ValueKind::BlockArgument => CfgValueKind::BlockArgument,
            _ => CfgValueKind::InstResult,
        }
    }

    pub fn ty(self, func: &Function) -> Type {
        func.value(self.0).ty()
    }

    /// The instruction defining this value, `None` for block arguments.
    pub fn defining_inst(self, func: &Function) -> Option<OpId> {
        func.value(self.0).defining_op()
    }

    pub fn uses(self, func: &Function) -> &UseList {
        func.value(self.0).uses()
    }
}

/// A value known to belong to a structured function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StmtValue(ValueId);

impl StmtValue {
    /// View `id` as a structured value, or `None` if it is dead or belongs
    /// to the CFG hierarchy.
    pub fn new(func: &Function, id: ValueId) -> Option<Self> {
        let value = func.try_value(id)?;
        (value.kind().hierarchy() == Hierarchy::Structured).then_some(StmtValue(id))
    }

    #[inline]
    pub fn id(self) -> ValueId {
        self.0
    }

    pub fn kind(self, func: &Function) -> StmtValueKind {
        match func.value(self.0).kind() {
            ValueKind::FunctionArgument => StmtValueKind::FunctionArgument,
            ValueKind::InductionVariable => StmtValueKind::InductionVar,
            _ => StmtValueKind::StmtResult,
        }
    }

    pub fn ty(self, func: &Function) -> Type {
        func.value(self.0).ty()
    }

    /// The statement defining this value, `None` for arguments and
    /// induction variables.
    pub fn defining_stmt(self, func: &Function) -> Option<OpId> {
        func.value(self.0).defining_op()
    }

    pub fn uses(self, func: &Function) -> &UseList {
        func.value(self.0).uses()
    }
}

impl fmt::Display for CfgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for StmtValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
