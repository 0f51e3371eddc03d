use pretty_assertions::assert_eq;
use smallvec::smallvec;

use super::*;
use crate::builder::OpBuilder;
use crate::function::OpSpec;
use crate::operation::{CmpPredicate, OpKind};
use crate::passes::PassContext;
use crate::printer::print_function;
use crate::span::Span;
use crate::test_helpers::{block_kinds, cfg_function, constant_payloads, structured_function};
use crate::types::Type;
use crate::value::ValueKind;

// ── Basic folding ───────────────────────────────────────────────────

#[test]
fn folds_add_of_two_constants() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let three = b.constant_int(3, Type::I32);
    let four = b.constant_int(4, Type::I32);
    let sum = b.addi(three, four);
    b.ret(&[sum]);

    let summary = ConstantFold::new().run_on_function(&mut func).unwrap();

    assert_eq!(
        summary,
        FoldSummary {
            folded: 1,
            materialized: 1,
            erased: 1,
            swept: 2,
        }
    );
    assert_eq!(
        print_function(&func),
        "\
func @f() {
^bb0:
  %3 = constant 7 : i32
  return %3
}
"
    );
    func.check_use_lists().unwrap();
}

#[test]
fn non_constant_operand_is_left_alone() {
    let mut func = cfg_function(&[Type::I32]);
    let x = func.args()[0];
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let one = b.constant_int(1, Type::I32);
    let sum = b.addi(x, one);
    b.ret(&[sum]);
    let before = print_function(&func);

    let summary = ConstantFold::new().run_on_function(&mut func).unwrap();

    assert!(!summary.changed());
    assert_eq!(print_function(&func), before);
}

#[test]
fn folds_chains_in_one_walk() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let three = b.constant_int(3, Type::I32);
    let four = b.constant_int(4, Type::I32);
    let sum = b.addi(three, four);
    let two = b.constant_int(2, Type::I32);
    let product = b.muli(sum, two);
    b.ret(&[product]);

    let summary = ConstantFold::new().run_on_function(&mut func).unwrap();

    assert_eq!(summary.folded, 2);
    assert_eq!(summary.swept, 4);
    assert_eq!(
        print_function(&func),
        "\
func @f() {
^bb0:
  %6 = constant 14 : i32
  return %6
}
"
    );
}

#[test]
fn materialized_constant_takes_the_folded_span() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let three = b.constant_int(3, Type::I32);
    let four = b.constant_int(4, Type::I32);
    let sum = OpBuilder::at_end(&mut func, entry)
        .with_span(Span::new(10, 15))
        .addi(three, four);
    OpBuilder::at_end(&mut func, entry).ret(&[sum]);

    ConstantFold::new().run_on_function(&mut func).unwrap();

    let first = func.block(entry).first_op().unwrap();
    assert_eq!(func.op(first).kind(), &OpKind::Constant);
    assert_eq!(func.op(first).span(), Span::new(10, 15));
}

// ── Multi-result folding ────────────────────────────────────────────

#[test]
fn materializes_only_used_results() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let seven = b.constant_int(7, Type::I32);
    let two = b.constant_int(2, Type::I32);
    let (divrem, quotient, remainder) = b.divrem(seven, two);
    b.ret(&[remainder]);

    let summary = ConstantFold::new().run_on_function(&mut func).unwrap();

    assert_eq!(summary.materialized, 1);
    assert!(!func.is_live_op(divrem));
    assert!(!func.is_live_value(quotient));
    assert_eq!(
        print_function(&func),
        "\
func @f() {
^bb0:
  %4 = constant 1 : i32
  return %4
}
"
    );
}

#[test]
fn folded_op_without_used_results_is_still_erased() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let seven = b.constant_int(7, Type::I32);
    let two = b.constant_int(2, Type::I32);
    b.divrem(seven, two);
    b.ret(&[]);

    let summary = ConstantFold::new().run_on_function(&mut func).unwrap();

    assert_eq!(summary.folded, 1);
    assert_eq!(summary.materialized, 0);
    assert_eq!(block_kinds(&func, entry), vec![OpKind::Return]);
}

// ── Sweep ───────────────────────────────────────────────────────────

#[test]
fn sweeps_unused_constants_and_keeps_used_ones() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    b.constant_int(9, Type::I32);
    let five = b.constant_int(5, Type::I32);
    b.call("g", &[five], &[]);
    b.ret(&[]);

    let summary = ConstantFold::new().run_on_function(&mut func).unwrap();

    assert_eq!(summary.folded, 0);
    assert_eq!(summary.swept, 1);
    assert!(summary.changed());
    assert_eq!(constant_payloads(&func), vec![Attribute::int(5, Type::I32)]);
    assert_eq!(
        block_kinds(&func, entry),
        vec![OpKind::Constant, OpKind::Call, OpKind::Return]
    );
}

#[test]
fn second_run_is_a_no_op() {
    let mut func = cfg_function(&[Type::I32]);
    let x = func.args()[0];
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let three = b.constant_int(3, Type::I32);
    let four = b.constant_int(4, Type::I32);
    let sum = b.addi(three, four);
    let mixed = b.addi(sum, x);
    b.constant_int(100, Type::I32);
    b.ret(&[mixed]);

    let pass = ConstantFold::new();
    assert!(pass.run_on_function(&mut func).unwrap().changed());
    let once = print_function(&func);

    let again = pass.run_on_function(&mut func).unwrap();
    assert_eq!(again, FoldSummary::default());
    assert_eq!(print_function(&func), once);
}

#[test]
fn chain_in_reverse_block_order_needs_another_run() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let later = func.add_block(func.body(), &[]);

    // ^bb1 defines the sum; ^bb0, walked first, multiplies it.
    let mut b = OpBuilder::at_end(&mut func, later);
    let three = b.constant_int(3, Type::I32);
    let four = b.constant_int(4, Type::I32);
    let sum = b.addi(three, four);
    let mut b = OpBuilder::at_end(&mut func, entry);
    let two = b.constant_int(2, Type::I32);
    let product = b.muli(sum, two);
    b.ret(&[product]);
    let mul = func.value(product).defining_op().unwrap();

    let pass = ConstantFold::new();
    let first = pass.run_on_function(&mut func).unwrap();

    assert_eq!(
        first,
        FoldSummary {
            folded: 1,
            materialized: 1,
            erased: 1,
            swept: 2,
        }
    );
    assert!(func.is_live_op(mul));
    assert_eq!(
        block_kinds(&func, entry),
        vec![OpKind::Constant, OpKind::MulI, OpKind::Return]
    );
    assert_eq!(block_kinds(&func, later), vec![OpKind::Constant]);
    let lhs = func.operand(mul, 0).unwrap();
    let lhs_def = func.value(lhs).defining_op().unwrap();
    assert_eq!(
        func.op(lhs_def).constant_value(),
        Some(&Attribute::int(7, Type::I32))
    );
    func.check_use_lists().unwrap();

    let second = pass.run_on_function(&mut func).unwrap();

    assert_eq!(second.folded, 1);
    assert!(!func.is_live_op(mul));
    assert_eq!(
        block_kinds(&func, entry),
        vec![OpKind::Constant, OpKind::Return]
    );
    assert!(block_kinds(&func, later).is_empty());
    assert_eq!(constant_payloads(&func), vec![Attribute::int(14, Type::I32)]);
    func.check_use_lists().unwrap();
}

// ── Hooks ───────────────────────────────────────────────────────────

#[test]
fn wrong_result_count_stops_without_corrupting() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let three = b.constant_int(3, Type::I32);
    let four = b.constant_int(4, Type::I32);
    let sum = b.addi(three, four);
    b.ret(&[sum]);
    let ops_before = func.num_ops();

    let pass = ConstantFold::with_hook(
        |func: &Function, op: OpId, _: &[Option<Attribute>]| -> FoldOutcome {
            if func.op(op).kind() == &OpKind::AddI {
                FoldOutcome::Folded(smallvec![
                    Attribute::int(1, Type::I32),
                    Attribute::int(2, Type::I32),
                ])
            } else {
                FoldOutcome::Decline
            }
        },
    );
    let err = pass.run_on_function(&mut func).unwrap_err();

    let sum_op = func.value(sum).defining_op().unwrap();
    assert_eq!(
        err,
        PassError::ResultCountMismatch {
            pass: ConstantFold::NAME,
            op: sum_op,
            kind: "addi".into(),
            expected: 1,
            found: 2,
        }
    );
    assert_eq!(func.num_ops(), ops_before);
    assert!(func.is_live_op(sum_op));
    func.check_use_lists().unwrap();
}

#[test]
fn custom_hook_sees_operand_constants() {
    let mut func = cfg_function(&[Type::I32]);
    let x = func.args()[0];
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let six = b.constant_int(6, Type::I32);
    let op = b.create(
        OpSpec::new(OpKind::Custom("test.first".into()))
            .operands(&[six, x])
            .results(&[Type::I32]),
    );
    let result = b.func().op(op).results()[0];
    b.ret(&[result]);

    // Folds to its first operand when that one is known.
    let pass = ConstantFold::with_hook(
        |_: &Function, _: OpId, operands: &[Option<Attribute>]| -> FoldOutcome {
            match operands {
                [Some(first), None] => FoldOutcome::single(first.clone()),
                _ => FoldOutcome::Decline,
            }
        },
    );
    let summary = pass.run_on_function(&mut func).unwrap();

    assert_eq!(summary.folded, 1);
    assert!(!func.is_live_op(op));
    assert_eq!(constant_payloads(&func), vec![Attribute::int(6, Type::I32)]);
}

// ── Structured functions ────────────────────────────────────────────

#[test]
fn folds_inside_nested_regions() {
    let mut func = structured_function(&[Type::Index]);
    let n = func.args()[0];
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let zero = b.constant_int(0, Type::Index);
    let one = b.constant_int(1, Type::Index);
    let (_, body, _) = b.for_loop(zero, n, one);
    let mut inner = OpBuilder::at_end(&mut func, body);
    let two = inner.addi(one, one);
    inner.call("consume", &[two], &[]);
    inner.yield_(&[]);

    let summary = ConstantFold::new().run_on_function(&mut func).unwrap();

    assert_eq!(summary.folded, 1);
    assert_eq!(summary.swept, 0);
    assert_eq!(
        block_kinds(&func, body),
        vec![OpKind::Constant, OpKind::Call, OpKind::Yield]
    );
    let folded = func.block(body).first_op().unwrap();
    assert_eq!(
        func.op(folded).constant_value(),
        Some(&Attribute::int(2, Type::Index))
    );
    let result = func.op(folded).results()[0];
    assert_eq!(func.value(result).kind(), ValueKind::StatementResult);
    func.check_use_lists().unwrap();
}

#[test]
fn folded_condition_feeds_select() {
    let mut func = cfg_function(&[Type::I32]);
    let x = func.args()[0];
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let one = b.constant_int(1, Type::I32);
    let two = b.constant_int(2, Type::I32);
    let cond = b.cmpi(CmpPredicate::Slt, one, two);
    let picked = b.select(cond, two, x);
    let unknown = b.select(cond, x, two);
    let sum = b.addi(picked, unknown);
    b.ret(&[sum]);

    ConstantFold::new().run_on_function(&mut func).unwrap();

    // `picked` folds to 2; `unknown` picks the argument and stays.
    assert_eq!(
        print_function(&func),
        "\
func @f(%0: i32) {
^bb0:
  %2 = constant 2 : i32
  %7 = constant true
  %8 = constant 2 : i32
  %5 = select %7, %0, %2 : i32
  %6 = addi %8, %5 : i32
  return %6
}
"
    );
}

// ── Pass trait ──────────────────────────────────────────────────────

#[test]
fn pass_reports_folded_and_swept() {
    let mut func = cfg_function(&[]);
    let entry = func.entry_block();
    let mut b = OpBuilder::at_end(&mut func, entry);
    let three = b.constant_int(3, Type::I32);
    let four = b.constant_int(4, Type::I32);
    let sum = b.addi(three, four);
    b.ret(&[sum]);

    let pass = ConstantFold::default();
    assert_eq!(pass.name(), "constant-fold");
    let result = pass.run(&mut func, &mut PassContext::default()).unwrap();
    assert!(result.changed);
    assert_eq!(result.stats.items_transformed, 3);

    let result = pass.run(&mut func, &mut PassContext::default()).unwrap();
    assert!(!result.changed);
}
