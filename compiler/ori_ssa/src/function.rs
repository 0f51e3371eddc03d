//! Function bodies: the arenas owning every IR entity, and the edits that
//! keep operands and use-lists in sync.
//!
//! # Structure
//!
//! - A [`Function`] has a body [`Region`].
//! - A region is an ordered list of [`Block`]s and is owned either by the
//!   function (the body) or by an operation (`for`, `if`).
//! - A block has arguments and a doubly linked list of operations.
//!
//! # Invariants
//!
//! - For every live use `u`, `u.target`'s use-list holds `u` at `u.slot`.
//! - Every entry of a live value's use-list is a live use targeting it.
//! - An operation is erased only once no surviving operation reads any value
//!   it defines (checked by [`Function::erase_op`]).
//!
//! `check_use_lists` verifies the first two in full.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::attr::{Attribute, Attributes};
use crate::error::IrError;
use crate::ids::{BlockId, OpId, RegionId, UseId, ValueId};
use crate::operation::{OpKind, Operation};
use crate::span::Span;
use crate::types::Type;
use crate::value::{Use, Value, ValueDef};
use crate::walk::Walker;

/// Which value hierarchy a function's values belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Basic-block function: arguments are entry-block arguments, op
    /// results are `OperationResult`s.
    Cfg,
    /// Structured function: arguments are `FunctionArgument`s, op results
    /// are `StatementResult`s, loops define `InductionVariable`s.
    Structured,
}

/// A basic block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub(crate) args: SmallVec<[ValueId; 2]>,
    pub(crate) first: Option<OpId>,
    pub(crate) last: Option<OpId>,
    pub(crate) parent: RegionId,
}

impl Block {
    #[inline]
    pub fn args(&self) -> &[ValueId] {
        &self.args
    }

    #[inline]
    pub fn first_op(&self) -> Option<OpId> {
        self.first
    }

    #[inline]
    pub fn last_op(&self) -> Option<OpId> {
        self.last
    }

    #[inline]
    pub fn parent_region(&self) -> RegionId {
        self.parent
    }
}

/// An ordered list of blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub(crate) blocks: SmallVec<[BlockId; 1]>,
    /// Owning operation; `None` for the function body.
    pub(crate) parent: Option<OpId>,
}

impl Region {
    #[inline]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    #[inline]
    pub fn parent_op(&self) -> Option<OpId> {
        self.parent
    }
}

/// Where a new operation is linked into a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertPoint {
    /// Immediately before an existing operation.
    Before(OpId),
    /// At the start of a block.
    AtStart(BlockId),
    /// At the end of a block.
    AtEnd(BlockId),
}

/// Everything needed to create an operation.
#[derive(Clone, Debug)]
pub struct OpSpec {
    pub kind: OpKind,
    pub operands: SmallVec<[ValueId; 4]>,
    pub result_types: SmallVec<[Type; 2]>,
    pub attrs: Attributes,
    pub span: Span,
    /// Number of (initially empty) regions the operation owns.
    pub num_regions: usize,
}

impl OpSpec {
    pub fn new(kind: OpKind) -> Self {
        OpSpec {
            kind,
            operands: SmallVec::new(),
            result_types: SmallVec::new(),
            attrs: Attributes::new(),
            span: Span::DUMMY,
            num_regions: 0,
        }
    }

    #[must_use]
    pub fn operands(mut self, operands: &[ValueId]) -> Self {
        self.operands = operands.iter().copied().collect();
        self
    }

    #[must_use]
    pub fn results(mut self, types: &[Type]) -> Self {
        self.result_types = types.iter().copied().collect();
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, attr: Attribute) -> Self {
        self.attrs.set(name, attr);
        self
    }

    #[must_use]
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn regions(mut self, count: usize) -> Self {
        self.num_regions = count;
        self
    }
}

/// A function and the arenas owning all of its IR.
#[derive(Clone, Debug)]
pub struct Function {
    name: String,
    kind: FunctionKind,
    args: Vec<ValueId>,
    body: RegionId,
    values: Vec<Option<Value>>,
    ops: Vec<Option<Operation>>,
    uses: Vec<Option<Use>>,
    blocks: Vec<Option<Block>>,
    regions: Vec<Option<Region>>,
}

impl Function {
    /// Create a function with an empty entry block.
    pub fn new(name: impl Into<String>, kind: FunctionKind, arg_types: &[Type]) -> Self {
        let mut func = Function {
            name: name.into(),
            kind,
            args: Vec::with_capacity(arg_types.len()),
            body: RegionId::new(0),
            values: Vec::new(),
            ops: Vec::new(),
            uses: Vec::new(),
            blocks: Vec::new(),
            regions: Vec::new(),
        };
        func.body = func.alloc_region(None);
        match kind {
            FunctionKind::Cfg => {
                let entry = func.add_block(func.body, arg_types);
                func.args = func.block(entry).args.to_vec();
            }
            FunctionKind::Structured => {
                func.add_block(func.body, &[]);
                for (index, &ty) in (0u32..).zip(arg_types) {
                    let arg = func.alloc_value(ValueDef::FunctionArgument { index }, ty);
                    func.args.push(arg);
                }
            }
        }
        func
    }

    // ── Accessors ───────────────────────────────────────────────

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    #[inline]
    pub fn args(&self) -> &[ValueId] {
        &self.args
    }

    #[inline]
    pub fn body(&self) -> RegionId {
        self.body
    }

    /// First block of the body region.
    pub fn entry_block(&self) -> BlockId {
        self.region(self.body).blocks[0]
    }

    /// Look up a live value.
    ///
    /// # Panics
    ///
    /// Panics if `id` was erased or never allocated.
    pub fn value(&self, id: ValueId) -> &Value {
        self.try_value(id)
            .unwrap_or_else(|| panic!("{id} is not a live value"))
    }

    pub fn try_value(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.index()).and_then(Option::as_ref)
    }

    /// Look up a live operation.
    ///
    /// # Panics
    ///
    /// Panics if `id` was erased or never allocated.
    pub fn op(&self, id: OpId) -> &Operation {
        self.try_op(id)
            .unwrap_or_else(|| panic!("{id} is not a live operation"))
    }

    pub fn try_op(&self, id: OpId) -> Option<&Operation> {
        self.ops.get(id.index()).and_then(Option::as_ref)
    }

    /// Look up a live use.
    ///
    /// # Panics
    ///
    /// Panics if `id` was erased or never allocated.
    pub fn get_use(&self, id: UseId) -> &Use {
        self.try_use(id)
            .unwrap_or_else(|| panic!("{id} is not a live use"))
    }

    pub fn try_use(&self, id: UseId) -> Option<&Use> {
        self.uses.get(id.index()).and_then(Option::as_ref)
    }

    /// # Panics
    ///
    /// Panics if `id` was erased or never allocated.
    pub fn block(&self, id: BlockId) -> &Block {
        self.blocks
            .get(id.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("{id} is not a live block"))
    }

    /// # Panics
    ///
    /// Panics if `id` was erased or never allocated.
    pub fn region(&self, id: RegionId) -> &Region {
        self.regions
            .get(id.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("{id} is not a live region"))
    }

    #[inline]
    pub fn is_live_op(&self, id: OpId) -> bool {
        self.try_op(id).is_some()
    }

    #[inline]
    pub fn is_live_value(&self, id: ValueId) -> bool {
        self.try_value(id).is_some()
    }

    /// Number of live operations, nested ones included.
    pub fn num_ops(&self) -> usize {
        self.ops.iter().flatten().count()
    }

    /// Live operations satisfying `pred`, in pre-order.
    pub fn ops_where(&self, mut pred: impl FnMut(&Operation) -> bool) -> Vec<OpId> {
        self.walk_ops()
            .into_iter()
            .filter(|&id| pred(self.op(id)))
            .collect()
    }

    /// The `index`-th result of `op`.
    pub fn result(&self, op: OpId, index: usize) -> Option<ValueId> {
        self.try_op(op)?.result(index)
    }

    /// The value read by operand `index` of `op`.
    pub fn operand(&self, op: OpId, index: usize) -> Option<ValueId> {
        let use_id = *self.try_op(op)?.operands.get(index)?;
        Some(self.try_use(use_id)?.target())
    }

    /// The values read by `op`, in operand order.
    pub fn operand_values(&self, op: OpId) -> SmallVec<[ValueId; 4]> {
        self.op(op)
            .operands
            .iter()
            .map(|&u| self.get_use(u).target())
            .collect()
    }

    /// Every use targeting `value`.
    pub fn uses(&self, value: ValueId) -> impl Iterator<Item = &Use> + '_ {
        self.value(value).uses.iter().map(|u| self.get_use(u))
    }

    /// Operations reading `value`, one entry per use.
    pub fn users(&self, value: ValueId) -> impl Iterator<Item = OpId> + '_ {
        self.uses(value).map(Use::owner)
    }

    /// Operations of `block` in order.
    pub fn block_ops(&self, block: BlockId) -> BlockOps<'_> {
        BlockOps {
            func: self,
            next: self.block(block).first,
        }
    }

    /// Pre-order snapshot of every live operation.
    pub fn walk_ops(&self) -> Vec<OpId> {
        let mut walker = Walker::new(self);
        let mut out = Vec::new();
        while let Some(op) = walker.next(self) {
            out.push(op);
        }
        out
    }

    // ── Construction ────────────────────────────────────────────

    /// Append a block with arguments of the given types to `region`.
    pub fn add_block(&mut self, region: RegionId, arg_types: &[Type]) -> BlockId {
        let block = self.alloc_block(region);
        for (index, &ty) in (0u32..).zip(arg_types) {
            let arg = self.alloc_value(ValueDef::BlockArgument { block, index }, ty);
            self.block_mut(block).args.push(arg);
        }
        block
    }

    /// Append a loop body block to `region` carrying one induction variable.
    pub(crate) fn add_loop_body(&mut self, region: RegionId, iv_type: Type) -> (BlockId, ValueId) {
        let block = self.alloc_block(region);
        let iv = self.alloc_value(ValueDef::InductionVariable { block }, iv_type);
        self.block_mut(block).args.push(iv);
        (block, iv)
    }

    /// Create an operation and link it at `at`.
    ///
    /// Results are `OperationResult`s in CFG functions and
    /// `StatementResult`s in structured functions. Each operand becomes a
    /// use linked into its target's use-list.
    ///
    /// # Panics
    ///
    /// Panics if an operand or the insertion anchor is not live.
    pub fn create_op(&mut self, spec: OpSpec, at: InsertPoint) -> OpId {
        let OpSpec {
            kind,
            operands,
            result_types,
            attrs,
            span,
            num_regions,
        } = spec;

        let op = OpId::from_len(self.ops.len());
        self.ops.push(Some(Operation::new(kind, attrs, span)));

        for (index, ty) in (0u32..).zip(result_types) {
            let def = match self.kind {
                FunctionKind::Cfg => ValueDef::OperationResult { op, index },
                FunctionKind::Structured => ValueDef::StatementResult { op, index },
            };
            let value = self.alloc_value(def, ty);
            self.op_mut(op).results.push(value);
        }

        for (index, target) in (0u32..).zip(operands) {
            let use_id = UseId::from_len(self.uses.len());
            self.uses.push(Some(Use::new(op, target, index)));
            self.link_use(use_id);
            self.op_mut(op).operands.push(use_id);
        }

        for _ in 0..num_regions {
            let region = self.alloc_region(Some(op));
            self.op_mut(op).regions.push(region);
        }

        self.link_op(op, at);
        op
    }

    // ── Use-list edits ──────────────────────────────────────────

    /// Point operand `index` of `op` at `value`.
    pub fn set_operand(&mut self, op: OpId, index: usize, value: ValueId) -> Result<(), IrError> {
        let use_id = *self
            .try_op(op)
            .ok_or(IrError::DeadOperation(op))?
            .operands
            .get(index)
            .unwrap_or_else(|| panic!("{op} has no operand {index}"));
        if !self.is_live_value(value) {
            return Err(IrError::DeadValue(value));
        }
        if self.get_use(use_id).target() == value {
            return Ok(());
        }
        self.unlink_use(use_id);
        self.use_mut(use_id).retarget(value, 0);
        self.link_use(use_id);
        Ok(())
    }

    /// Redirect every use of `old` to `new`.
    ///
    /// Afterwards `old` has no uses. Uses are appended to `new`'s list in
    /// no promised order. `old == new` is a no-op. Runs in O(uses of `old`)
    /// and never inspects or erases the owning operations.
    ///
    /// # Panics
    ///
    /// Panics if either value is not live.
    pub fn replace_all_uses_with(&mut self, old: ValueId, new: ValueId) {
        if old == new {
            return;
        }
        assert!(self.is_live_value(new), "{new} is not a live value");
        let moved = self.value_mut(old).uses.take();
        for use_id in moved {
            let slot = self.value_mut(new).uses.push(use_id);
            self.use_mut(use_id).retarget(new, slot);
        }
    }

    // ── Erasure ─────────────────────────────────────────────────

    /// Remove `op`, its nested regions, and every value they define.
    ///
    /// Fails without modifying anything if `op` is already erased, if one
    /// of its results still has uses, or if a value defined inside its
    /// regions is read from outside them.
    pub fn erase_op(&mut self, op: OpId) -> Result<(), IrError> {
        let root = self.try_op(op).ok_or(IrError::DeadOperation(op))?;
        for &result in &root.results {
            let uses = self.value(result).uses.len();
            if uses > 0 {
                return Err(IrError::ResultStillInUse {
                    op,
                    value: result,
                    uses,
                });
            }
        }

        let doomed = self.collect_nested(op);
        let doomed_set: FxHashSet<OpId> = doomed.iter().copied().collect();
        for &nested in &doomed[1..] {
            for &result in &self.op(nested).results {
                self.check_contained(op, result, &doomed_set)?;
            }
        }
        for block in self.nested_blocks(op) {
            for &arg in &self.block(block).args {
                self.check_contained(op, arg, &doomed_set)?;
            }
        }

        // Drop every operand use first so no use-list refers to a freed op.
        for &id in &doomed {
            let operands = std::mem::take(&mut self.op_mut(id).operands);
            for use_id in operands {
                self.unlink_use(use_id);
                self.uses[use_id.index()] = None;
            }
        }

        self.unlink_op(op);

        let blocks = self.nested_blocks(op);
        for &id in &doomed {
            if let Some(removed) = self.ops[id.index()].take() {
                for value in removed.results {
                    self.values[value.index()] = None;
                }
                for region in removed.regions {
                    self.regions[region.index()] = None;
                }
            }
        }
        for block in blocks {
            if let Some(removed) = self.blocks[block.index()].take() {
                for arg in removed.args {
                    self.values[arg.index()] = None;
                }
            }
        }

        tracing::trace!(function = %self.name, %op, nested = doomed.len() - 1, "erased op");
        Ok(())
    }

    fn check_contained(
        &self,
        op: OpId,
        value: ValueId,
        inside: &FxHashSet<OpId>,
    ) -> Result<(), IrError> {
        let outside = self
            .uses(value)
            .filter(|u| !inside.contains(&u.owner()))
            .count();
        if outside > 0 {
            return Err(IrError::ResultStillInUse {
                op,
                value,
                uses: outside,
            });
        }
        Ok(())
    }

    /// `op` followed by every operation nested in its regions, pre-order.
    fn collect_nested(&self, op: OpId) -> Vec<OpId> {
        let mut out = vec![op];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            for &region in &self.op(current).regions {
                for &block in &self.region(region).blocks {
                    out.extend(self.block_ops(block));
                }
            }
            i += 1;
        }
        out
    }

    fn nested_blocks(&self, op: OpId) -> Vec<BlockId> {
        self.collect_nested(op)
            .into_iter()
            .flat_map(|id| self.op(id).regions.iter().copied())
            .flat_map(|region| self.region(region).blocks.iter().copied())
            .collect()
    }

    // ── Consistency ─────────────────────────────────────────────

    /// Verify every use/use-list link in the function.
    pub fn check_use_lists(&self) -> Result<(), IrError> {
        for (index, slot) in self.uses.iter().enumerate() {
            let Some(u) = slot else { continue };
            let use_id = UseId::from_len(index);
            let corrupted = |reason| IrError::UseListCorrupted {
                value: u.target(),
                use_id,
                reason,
            };
            let owner = self
                .try_op(u.owner())
                .ok_or_else(|| corrupted("owner is erased"))?;
            if owner.operands.get(u.operand_index() as usize) != Some(&use_id) {
                return Err(corrupted("owner's operand slot does not hold this use"));
            }
            let target = self
                .try_value(u.target())
                .ok_or_else(|| corrupted("target is erased"))?;
            if target.uses.get(u.slot) != Some(use_id) {
                return Err(corrupted("target's use-list does not hold this use at its slot"));
            }
        }

        for (index, slot) in self.values.iter().enumerate() {
            let Some(value) = slot else { continue };
            let value_id = ValueId::from_len(index);
            for (pos, use_id) in (0u32..).zip(value.uses.iter()) {
                let corrupted = |reason| IrError::UseListCorrupted {
                    value: value_id,
                    use_id,
                    reason,
                };
                let u = self
                    .try_use(use_id)
                    .ok_or_else(|| corrupted("listed use is erased"))?;
                if u.target() != value_id {
                    return Err(corrupted("listed use targets another value"));
                }
                if u.slot != pos {
                    return Err(corrupted("listed use records a different slot"));
                }
            }
        }

        for op in self.ops.iter().flatten() {
            for &use_id in &op.operands {
                if self.try_use(use_id).is_none() {
                    return Err(IrError::UseListCorrupted {
                        value: ValueId::new(u32::MAX),
                        use_id,
                        reason: "live operation owns an erased use",
                    });
                }
            }
        }
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────

    fn alloc_value(&mut self, def: ValueDef, ty: Type) -> ValueId {
        let id = ValueId::from_len(self.values.len());
        self.values.push(Some(Value::new(def, ty)));
        id
    }

    fn alloc_block(&mut self, region: RegionId) -> BlockId {
        let id = BlockId::from_len(self.blocks.len());
        self.blocks.push(Some(Block {
            args: SmallVec::new(),
            first: None,
            last: None,
            parent: region,
        }));
        self.region_mut(region).blocks.push(id);
        id
    }

    fn alloc_region(&mut self, parent: Option<OpId>) -> RegionId {
        let id = RegionId::from_len(self.regions.len());
        self.regions.push(Some(Region {
            blocks: SmallVec::new(),
            parent,
        }));
        id
    }

    fn value_mut(&mut self, id: ValueId) -> &mut Value {
        self.values
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{id} is not a live value"))
    }

    pub(crate) fn op_mut(&mut self, id: OpId) -> &mut Operation {
        self.ops
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{id} is not a live operation"))
    }

    fn use_mut(&mut self, id: UseId) -> &mut Use {
        self.uses
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{id} is not a live use"))
    }

    fn block_mut(&mut self, id: BlockId) -> &mut Block {
        self.blocks
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{id} is not a live block"))
    }

    fn region_mut(&mut self, id: RegionId) -> &mut Region {
        self.regions
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("{id} is not a live region"))
    }

    /// Append `use_id` to its target's use-list and record the slot.
    fn link_use(&mut self, use_id: UseId) {
        let target = self.get_use(use_id).target();
        let slot = self.value_mut(target).uses.push(use_id);
        self.use_mut(use_id).slot = slot;
    }

    /// Remove `use_id` from its target's use-list.
    fn unlink_use(&mut self, use_id: UseId) {
        let u = *self.get_use(use_id);
        if let Some(moved) = self.value_mut(u.target()).uses.swap_remove(u.slot) {
            self.use_mut(moved).slot = u.slot;
        }
    }

    fn link_op(&mut self, op: OpId, at: InsertPoint) {
        let (block, prev, next) = match at {
            InsertPoint::Before(anchor) => {
                let anchor_op = self.op(anchor);
                let block = anchor_op
                    .parent
                    .unwrap_or_else(|| panic!("{anchor} is not linked into a block"));
                (block, anchor_op.prev, Some(anchor))
            }
            InsertPoint::AtStart(block) => (block, None, self.block(block).first),
            InsertPoint::AtEnd(block) => (block, self.block(block).last, None),
        };

        {
            let node = self.op_mut(op);
            node.parent = Some(block);
            node.prev = prev;
            node.next = next;
        }
        match prev {
            Some(p) => self.op_mut(p).next = Some(op),
            None => self.block_mut(block).first = Some(op),
        }
        match next {
            Some(n) => self.op_mut(n).prev = Some(op),
            None => self.block_mut(block).last = Some(op),
        }
    }

    fn unlink_op(&mut self, op: OpId) {
        let node = self.op_mut(op);
        let (block, prev, next) = (node.parent.take(), node.prev.take(), node.next.take());
        let Some(block) = block else { return };
        match prev {
            Some(p) => self.op_mut(p).next = next,
            None => self.block_mut(block).first = next,
        }
        match next {
            Some(n) => self.op_mut(n).prev = prev,
            None => self.block_mut(block).last = prev,
        }
    }
}

/// Iterator over the operations of one block.
pub struct BlockOps<'a> {
    func: &'a Function,
    next: Option<OpId>,
}

impl Iterator for BlockOps<'_> {
    type Item = OpId;

    fn next(&mut self) -> Option<OpId> {
        let current = self.next?;
        self.next = self.func.op(current).next;
        Some(current)
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
