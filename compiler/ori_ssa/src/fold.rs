//! Fold hooks: per-kind rules computing result constants from operand
//! constants.
//!
//! A hook is a pure function of the operation and its operand constants.
//! It receives the function by shared reference so it can read result types
//! and attributes, but it cannot edit the graph; materializing the folded
//! results is the caller's job.

use smallvec::{smallvec, SmallVec};

use crate::attr::{sign_extend, Attribute};
use crate::function::Function;
use crate::ids::OpId;
use crate::operation::{CmpPredicate, OpKind};
use crate::types::Type;

/// Result of asking a hook to fold an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FoldOutcome {
    /// Nothing can be folded with these operands. Not an error.
    Decline,
    /// One constant per result of the operation, in result order.
    Folded(SmallVec<[Attribute; 2]>),
}

impl FoldOutcome {
    pub fn single(attr: Attribute) -> Self {
        FoldOutcome::Folded(smallvec![attr])
    }
}

/// Folding rule for operations.
///
/// `operands` has one entry per operand: the constant it reads, or `None`
/// when the operand is not produced by a constant operation. A `Folded`
/// outcome must carry exactly one attribute per result of `op`; anything
/// else is a bug in the hook and aborts the folding pass.
pub trait FoldHook {
    fn fold(&self, func: &Function, op: OpId, operands: &[Option<Attribute>]) -> FoldOutcome;
}

impl<F> FoldHook for F
where
    F: Fn(&Function, OpId, &[Option<Attribute>]) -> FoldOutcome,
{
    fn fold(&self, func: &Function, op: OpId, operands: &[Option<Attribute>]) -> FoldOutcome {
        self(func, op, operands)
    }
}

/// Fold rules for the built-in operation kinds.
///
/// - Integer arithmetic wraps to the result type's width. Signed division
///   and remainder decline on a zero divisor and on overflow.
/// - `cmpi` produces an `i1`.
/// - Float arithmetic follows IEEE semantics in `f64`, rounded to `f32` for
///   `f32` results.
/// - `select` folds as soon as its condition and the chosen operand are
///   known, whatever the other operand is.
/// - Everything else declines.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardFolder;

impl FoldHook for StandardFolder {
    fn fold(&self, func: &Function, op: OpId, operands: &[Option<Attribute>]) -> FoldOutcome {
        let operation = func.op(op);
        let result_ty = operation
            .result(0)
            .map(|r| func.value(r).ty());

        match (operation.kind(), result_ty) {
            (OpKind::Select, _) => fold_select(operands),
            (OpKind::CmpI(pred), _) => fold_cmp(*pred, operands),
            (kind, Some(ty)) if ty.is_integer_like() => fold_int(kind, ty, operands),
            (kind, Some(ty)) if ty.is_float() => fold_float(kind, ty, operands),
            _ => FoldOutcome::Decline,
        }
    }
}

/// Both operands as integers of one type, if known, with that type's width.
/// Values come back in storage form, so `i1` reads as `0`/`1`.
fn int_operands(operands: &[Option<Attribute>]) -> Option<(i64, i64, u32)> {
    match operands {
        [Some(Attribute::Int { value: a, ty: ta }), Some(Attribute::Int { value: b, ty: tb })]
            if ta == tb =>
        {
            Some((*a, *b, ta.int_width().unwrap_or(64)))
        }
        _ => None,
    }
}

fn float_operands(operands: &[Option<Attribute>]) -> Option<(f64, f64)> {
    match operands {
        [Some(a @ Attribute::Float { ty: ta, .. }), Some(b @ Attribute::Float { ty: tb, .. })]
            if ta == tb =>
        {
            Some((a.as_float()?, b.as_float()?))
        }
        _ => None,
    }
}

fn fold_int(kind: &OpKind, ty: Type, operands: &[Option<Attribute>]) -> FoldOutcome {
    let Some((a, b, width)) = int_operands(operands) else {
        return FoldOutcome::Decline;
    };
    // Signed rules see two's-complement values; the quotient must fit the
    // signed range of the width.
    let (sa, sb) = (sign_extend(a, width), sign_extend(b, width));
    let fits = |v: i64| sign_extend(v, width) == v;

    let value = match kind {
        OpKind::AddI => a.wrapping_add(b),
        OpKind::SubI => a.wrapping_sub(b),
        OpKind::MulI => a.wrapping_mul(b),
        OpKind::AndI => a & b,
        OpKind::OrI => a | b,
        OpKind::XorI => a ^ b,
        OpKind::DivSI => match sa.checked_div(sb) {
            Some(q) if fits(q) => q,
            _ => return FoldOutcome::Decline,
        },
        OpKind::RemSI => match sa.checked_rem(sb) {
            Some(r) => r,
            None => return FoldOutcome::Decline,
        },
        OpKind::DivRemSI => {
            return match (sa.checked_div(sb), sa.checked_rem(sb)) {
                (Some(q), Some(r)) if fits(q) => {
                    FoldOutcome::Folded(smallvec![Attribute::int(q, ty), Attribute::int(r, ty)])
                }
                _ => FoldOutcome::Decline,
            };
        }
        _ => return FoldOutcome::Decline,
    };
    FoldOutcome::single(Attribute::int(value, ty))
}

fn fold_float(kind: &OpKind, ty: Type, operands: &[Option<Attribute>]) -> FoldOutcome {
    let Some((a, b)) = float_operands(operands) else {
        return FoldOutcome::Decline;
    };
    let value = match kind {
        OpKind::AddF => a + b,
        OpKind::SubF => a - b,
        OpKind::MulF => a * b,
        OpKind::DivF => a / b,
        _ => return FoldOutcome::Decline,
    };
    FoldOutcome::single(Attribute::float(value, ty))
}

fn fold_cmp(pred: CmpPredicate, operands: &[Option<Attribute>]) -> FoldOutcome {
    let Some((a, b, width)) = int_operands(operands) else {
        return FoldOutcome::Decline;
    };
    let (sa, sb) = (sign_extend(a, width), sign_extend(b, width));
    let result = match pred {
        CmpPredicate::Eq => a == b,
        CmpPredicate::Ne => a != b,
        CmpPredicate::Slt => sa < sb,
        CmpPredicate::Sle => sa <= sb,
        CmpPredicate::Sgt => sa > sb,
        CmpPredicate::Sge => sa >= sb,
    };
    FoldOutcome::single(Attribute::bool(result))
}

fn fold_select(operands: &[Option<Attribute>]) -> FoldOutcome {
    let [Some(Attribute::Int { value: cond, .. }), on_true, on_false] = operands else {
        return FoldOutcome::Decline;
    };
    let chosen = if *cond != 0 { on_true } else { on_false };
    match chosen {
        Some(attr) => FoldOutcome::single(attr.clone()),
        None => FoldOutcome::Decline,
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
