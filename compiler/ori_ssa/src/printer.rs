//! Textual dump of a function.
//!
//! Only meant for debugging output and test expectations; there is no
//! parser for this format.
//!
//! ```text
//! func @f(%0: i32) {
//! ^bb0:
//!   %1 = constant 7 : i32
//!   %2 = addi %0, %1 : i32
//!   return %2
//! }
//! ```

use std::fmt::Write;

use crate::function::{Function, FunctionKind};
use crate::ids::{BlockId, OpId, ValueId};
use crate::operation::{OpKind, VALUE_ATTR};

/// Render `func` in the textual form shown in the module docs.
pub fn print_function(func: &Function) -> String {
    let mut out = String::new();
    let args = join(func.args().iter().map(|&a| typed(func, a)));
    let _ = writeln!(out, "func @{}({args}) {{", func.name());
    let entry = func.entry_block();
    for &block in func.region(func.body()).blocks() {
        // CFG entry-block arguments are the function arguments printed above.
        let show_args = !(block == entry && func.kind() == FunctionKind::Cfg);
        print_block(func, block, show_args, 0, &mut out);
    }
    out.push_str("}\n");
    out
}

fn print_block(func: &Function, block: BlockId, show_args: bool, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let args = func.block(block).args();
    if show_args && !args.is_empty() {
        let args = join(args.iter().map(|&a| typed(func, a)));
        let _ = writeln!(out, "{indent}{block}({args}):");
    } else {
        let _ = writeln!(out, "{indent}{block}:");
    }
    for op in func.block_ops(block) {
        print_op(func, op, depth + 1, out);
    }
}

fn print_op(func: &Function, op: OpId, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let operation = func.op(op);
    let mut line = String::new();

    if operation.num_results() > 0 {
        line.push_str(&join(operation.results().iter().map(ToString::to_string)));
        line.push_str(" = ");
    }
    line.push_str(&operation.kind().to_string());

    if let (OpKind::Constant, Some(value)) = (operation.kind(), operation.attr(VALUE_ATTR)) {
        let _ = write!(line, " {value}");
    } else {
        let operands = func.operand_values(op);
        if !operands.is_empty() {
            line.push(' ');
            line.push_str(&join(operands.iter().map(ToString::to_string)));
        }
        let attrs: Vec<String> = operation
            .attrs()
            .iter()
            .map(|(name, attr)| format!("{name} = {attr}"))
            .collect();
        if !attrs.is_empty() {
            let _ = write!(line, " {{{}}}", attrs.join(", "));
        }
        if operation.num_results() > 0 {
            let types = join(operation.results().iter().map(|&r| func.value(r).ty().to_string()));
            let _ = write!(line, " : {types}");
        }
    }

    if operation.regions().is_empty() {
        let _ = writeln!(out, "{indent}{line}");
        return;
    }
    let _ = writeln!(out, "{indent}{line} {{");
    for (i, &region) in operation.regions().iter().enumerate() {
        if i > 0 {
            let _ = writeln!(out, "{indent}}} {{");
        }
        for &block in func.region(region).blocks() {
            print_block(func, block, true, depth, out);
        }
    }
    let _ = writeln!(out, "{indent}}}");
}

fn typed(func: &Function, value: ValueId) -> String {
    format!("{value}: {}", func.value(value).ty())
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::OpBuilder;
    use crate::operation::CmpPredicate;
    use crate::types::Type;

    #[test]
    fn prints_cfg_function() {
        let mut func = Function::new("f", FunctionKind::Cfg, &[Type::I32]);
        let arg = func.args()[0];
        let entry = func.entry_block();
        let mut b = OpBuilder::at_end(&mut func, entry);
        let c = b.constant_int(7, Type::I32);
        let sum = b.addi(arg, c);
        let cmp = b.cmpi(CmpPredicate::Slt, sum, c);
        let call = b.call("g", &[cmp], &[Type::I32]);
        let r = b.func().op(call).results()[0];
        b.ret(&[r]);

        let expected = "\
func @f(%0: i32) {
^bb0:
  %1 = constant 7 : i32
  %2 = addi %0, %1 : i32
  %3 = cmpi slt %2, %1 : i1
  %4 = call %3 {callee = \"g\"} : i32
  return %4
}
";
        assert_eq!(print_function(&func), expected);
    }

    #[test]
    fn prints_nested_regions() {
        let mut func = Function::new("loop", FunctionKind::Structured, &[Type::Index]);
        let n = func.args()[0];
        let entry = func.entry_block();
        let mut b = OpBuilder::at_end(&mut func, entry);
        let zero = b.constant_int(0, Type::Index);
        let one = b.constant_int(1, Type::Index);
        let (_, body, iv) = b.for_loop(zero, n, one);
        let mut inner = OpBuilder::at_end(&mut func, body);
        inner.addi(iv, one);
        inner.yield_(&[]);

        let expected = "\
func @loop(%0: index) {
^bb0:
  %1 = constant 0 : index
  %2 = constant 1 : index
  for %1, %0, %2 {
  ^bb1(%3: index):
    %4 = addi %3, %2 : index
    yield
  }
}
";
        assert_eq!(print_function(&func), expected);
    }
}
