//! Constant folding.
//!
//! One top-down walk over a function. Every operation whose fold hook can
//! compute its results from its constant operands is replaced: a constant
//! op is materialized before it for each result that has uses, those uses
//! are redirected to the new constant, and the operation is queued for
//! erasure.
//!
//! # Algorithm
//!
//! 1. Start with empty `existing_constants` / `pending_erasure` lists.
//! 2. Walk in pre-order. Constant ops are recorded and skipped. For other
//!    ops, collect each operand's constant (or `None`) and ask the hook:
//!    - `Decline` leaves the op untouched;
//!    - `Folded` with a wrong count stops the run with
//!      [`PassError::ResultCountMismatch`];
//!    - otherwise materialize, redirect, and queue the op.
//! 3. Once the walk is over, erase queued ops in queue order. The walker
//!    does not tolerate erasure.
//! 4. Sweep the recorded constants once and erase those left without uses.
//!
//! # Limitations
//!
//! - Block arguments are never treated as constants.
//! - Branches are not folded and no facts flow across control flow.
//! - One walk, no fixpoint: a chain that only becomes foldable in reverse
//!   document order collapses partially.
//! - Folded ops are erased without a side-effect check; foldable kinds are
//!   assumed effect-free.

use smallvec::SmallVec;

use crate::attr::Attribute;
use crate::builder::OpBuilder;
use crate::fold::{FoldHook, FoldOutcome, StandardFolder};
use crate::function::Function;
use crate::ids::{OpId, ValueId};
use crate::walk::Walker;

use super::{Pass, PassContext, PassError, PassResult};

/// Counts reported by one folding run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FoldSummary {
    /// Operations folded and queued for erasure.
    pub folded: usize,
    /// Constant operations created.
    pub materialized: usize,
    /// Folded operations erased after the walk.
    pub erased: usize,
    /// Unused constants erased by the final sweep.
    pub swept: usize,
}

impl FoldSummary {
    pub fn changed(&self) -> bool {
        self.folded + self.materialized + self.erased + self.swept > 0
    }
}

/// Per-run bookkeeping. Never outlives a `run_on_function` call.
#[derive(Default)]
struct FoldState {
    /// Every constant seen or created, pre-existing ones included.
    existing_constants: Vec<ValueId>,
    /// Folded operations, erased once the walk is over.
    pending_erasure: Vec<OpId>,
    summary: FoldSummary,
}

/// The constant folding pass.
pub struct ConstantFold {
    hook: Box<dyn FoldHook>,
}

impl Default for ConstantFold {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantFold {
    pub const NAME: &'static str = "constant-fold";

    /// Fold with the built-in rules.
    pub fn new() -> Self {
        Self::with_hook(StandardFolder)
    }

    /// Fold with a custom hook.
    pub fn with_hook(hook: impl FoldHook + 'static) -> Self {
        ConstantFold {
            hook: Box::new(hook),
        }
    }

    /// Fold `func` in place.
    ///
    /// On `Err` the function is partially folded but consistent: every
    /// completed redirection left the use-lists valid, and nothing queued
    /// for erasure has been erased.
    pub fn run_on_function(&self, func: &mut Function) -> Result<FoldSummary, PassError> {
        let mut state = FoldState::default();

        let mut walker = Walker::new(func);
        while let Some(op) = walker.next(func) {
            self.fold_operation(func, op, &mut state)?;
        }

        for op in std::mem::take(&mut state.pending_erasure) {
            // Already gone if it was nested in an earlier folded op.
            if !func.is_live_op(op) {
                continue;
            }
            func.erase_op(op).map_err(|source| PassError::Ir {
                pass: Self::NAME,
                source,
            })?;
            state.summary.erased += 1;
        }

        for &constant in &state.existing_constants {
            let Some(value) = func.try_value(constant) else {
                continue;
            };
            if !value.use_empty() {
                continue;
            }
            if let Some(def) = value.defining_op() {
                func.erase_op(def).map_err(|source| PassError::Ir {
                    pass: Self::NAME,
                    source,
                })?;
                state.summary.swept += 1;
            }
        }

        let summary = state.summary;
        tracing::debug!(
            function = func.name(),
            folded = summary.folded,
            materialized = summary.materialized,
            erased = summary.erased,
            swept = summary.swept,
            "constant folding finished",
        );
        Ok(summary)
    }

    fn fold_operation(
        &self,
        func: &mut Function,
        op: OpId,
        state: &mut FoldState,
    ) -> Result<(), PassError> {
        let operation = func.op(op);

        if operation.constant_value().is_some() {
            state.existing_constants.push(operation.results()[0]);
            return Ok(());
        }

        let operands: SmallVec<[Option<Attribute>; 4]> = operation
            .operands()
            .iter()
            .map(|&u| constant_of(func, func.get_use(u).target()))
            .collect();

        let folded = match self.hook.fold(func, op, &operands) {
            FoldOutcome::Decline => {
                tracing::trace!(%op, kind = %func.op(op).kind(), "fold declined");
                return Ok(());
            }
            FoldOutcome::Folded(attrs) => attrs,
        };

        let operation = func.op(op);
        if folded.len() != operation.num_results() {
            tracing::error!(
                %op,
                kind = %operation.kind(),
                expected = operation.num_results(),
                found = folded.len(),
                "fold hook returned the wrong number of constants",
            );
            return Err(PassError::ResultCountMismatch {
                pass: Self::NAME,
                op,
                kind: operation.kind().to_string(),
                expected: operation.num_results(),
                found: folded.len(),
            });
        }

        let span = operation.span();
        let results: SmallVec<[ValueId; 2]> = operation.results().iter().copied().collect();
        for (result, attr) in results.into_iter().zip(folded) {
            let value = func.value(result);
            if value.use_empty() {
                continue;
            }
            let ty = value.ty();
            let constant = OpBuilder::before(func, op).create_constant(span, ty, attr);
            state.existing_constants.push(constant);
            state.summary.materialized += 1;
            func.replace_all_uses_with(result, constant);
        }

        tracing::trace!(%op, "folded");
        state.pending_erasure.push(op);
        state.summary.folded += 1;
        Ok(())
    }
}

/// The constant `value` holds, if it is produced by a constant operation.
fn constant_of(func: &Function, value: ValueId) -> Option<Attribute> {
    let def = func.value(value).defining_op()?;
    func.op(def).constant_value().cloned()
}

impl Pass for ConstantFold {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Constant fold operations in functions"
    }

    fn run(&self, func: &mut Function, _ctx: &mut PassContext) -> Result<PassResult, PassError> {
        let summary = self.run_on_function(func)?;
        if summary.changed() {
            Ok(PassResult::changed(summary.folded + summary.swept))
        } else {
            Ok(PassResult::unchanged())
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;
