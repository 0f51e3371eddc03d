//! Operation builder with an insertion point.

use crate::attr::Attribute;
use crate::function::{Function, InsertPoint, OpSpec};
use crate::ids::{BlockId, OpId, ValueId};
use crate::operation::{CmpPredicate, OpKind, CALLEE_ATTR, VALUE_ATTR};
use crate::span::Span;
use crate::types::Type;

/// Creates operations at a fixed insertion point.
///
/// Consecutive creations keep their creation order: inserting before an
/// anchor places each new op between the previously created one and the
/// anchor, and appending to a block places it after them.
pub struct OpBuilder<'f> {
    func: &'f mut Function,
    at: InsertPoint,
    span: Span,
}

impl<'f> OpBuilder<'f> {
    /// Insert immediately before `op`, inheriting its span.
    pub fn before(func: &'f mut Function, op: OpId) -> Self {
        let span = func.op(op).span();
        OpBuilder {
            func,
            at: InsertPoint::Before(op),
            span,
        }
    }

    /// Append to the end of `block`.
    pub fn at_end(func: &'f mut Function, block: BlockId) -> Self {
        OpBuilder {
            func,
            at: InsertPoint::AtEnd(block),
            span: Span::DUMMY,
        }
    }

    /// Set the span attached to subsequently created operations.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn func(&self) -> &Function {
        self.func
    }

    pub fn insertion_point(&self) -> InsertPoint {
        self.at
    }

    /// Create an operation from a spec at the insertion point. The spec's
    /// own span is kept unless it is [`Span::DUMMY`].
    pub fn create(&mut self, mut spec: OpSpec) -> OpId {
        if spec.span.is_dummy() {
            spec.span = self.span;
        }
        self.func.create_op(spec, self.at)
    }

    /// Materialize a constant operation of type `ty` holding `attr` at
    /// `span`, returning its single result.
    pub fn create_constant(&mut self, span: Span, ty: Type, attr: Attribute) -> ValueId {
        let op = self.func.create_op(
            OpSpec::new(OpKind::Constant)
                .results(&[ty])
                .attr(VALUE_ATTR, attr)
                .span(span),
            self.at,
        );
        self.func.op(op).results()[0]
    }

    pub fn constant(&mut self, attr: Attribute) -> ValueId {
        let ty = attr.ty().unwrap_or(Type::I64);
        let span = self.span;
        self.create_constant(span, ty, attr)
    }

    pub fn constant_int(&mut self, value: i64, ty: Type) -> ValueId {
        self.constant(Attribute::int(value, ty))
    }

    pub fn constant_float(&mut self, value: f64, ty: Type) -> ValueId {
        self.constant(Attribute::float(value, ty))
    }

    /// Two-operand op whose result has the type of `lhs`.
    pub fn binary(&mut self, kind: OpKind, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.func.value(lhs).ty();
        self.single_result(OpSpec::new(kind).operands(&[lhs, rhs]).results(&[ty]))
    }

    pub fn addi(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(OpKind::AddI, lhs, rhs)
    }

    pub fn subi(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(OpKind::SubI, lhs, rhs)
    }

    pub fn muli(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(OpKind::MulI, lhs, rhs)
    }

    pub fn cmpi(&mut self, pred: CmpPredicate, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.single_result(
            OpSpec::new(OpKind::CmpI(pred))
                .operands(&[lhs, rhs])
                .results(&[Type::I1]),
        )
    }

    pub fn select(&mut self, cond: ValueId, on_true: ValueId, on_false: ValueId) -> ValueId {
        let ty = self.func.value(on_true).ty();
        self.single_result(
            OpSpec::new(OpKind::Select)
                .operands(&[cond, on_true, on_false])
                .results(&[ty]),
        )
    }

    /// Signed division returning `(quotient, remainder)`.
    pub fn divrem(&mut self, lhs: ValueId, rhs: ValueId) -> (OpId, ValueId, ValueId) {
        let ty = self.func.value(lhs).ty();
        let op = self.create(
            OpSpec::new(OpKind::DivRemSI)
                .operands(&[lhs, rhs])
                .results(&[ty, ty]),
        );
        let results = self.func.op(op).results();
        (op, results[0], results[1])
    }

    pub fn call(&mut self, callee: &str, args: &[ValueId], result_types: &[Type]) -> OpId {
        self.create(
            OpSpec::new(OpKind::Call)
                .operands(args)
                .results(result_types)
                .attr(CALLEE_ATTR, Attribute::str(callee)),
        )
    }

    pub fn ret(&mut self, values: &[ValueId]) -> OpId {
        self.create(OpSpec::new(OpKind::Return).operands(values))
    }

    pub fn yield_(&mut self, values: &[ValueId]) -> OpId {
        self.create(OpSpec::new(OpKind::Yield).operands(values))
    }

    /// Structured loop. Returns the op, its body block, and the induction
    /// variable (typed like `lower`).
    pub fn for_loop(
        &mut self,
        lower: ValueId,
        upper: ValueId,
        step: ValueId,
    ) -> (OpId, BlockId, ValueId) {
        let iv_type = self.func.value(lower).ty();
        let op = self.create(
            OpSpec::new(OpKind::For)
                .operands(&[lower, upper, step])
                .regions(1),
        );
        let region = self.func.op(op).regions()[0];
        let (body, iv) = self.func.add_loop_body(region, iv_type);
        (op, body, iv)
    }

    /// Structured conditional. Returns the op and its then/else blocks.
    pub fn if_(&mut self, cond: ValueId) -> (OpId, BlockId, BlockId) {
        let op = self.create(OpSpec::new(OpKind::If).operands(&[cond]).regions(2));
        let regions = self.func.op(op).regions();
        let (then_region, else_region) = (regions[0], regions[1]);
        let then_block = self.func.add_block(then_region, &[]);
        let else_block = self.func.add_block(else_region, &[]);
        (op, then_block, else_block)
    }

    fn single_result(&mut self, spec: OpSpec) -> ValueId {
        let op = self.create(spec);
        self.func.op(op).results()[0]
    }
}
