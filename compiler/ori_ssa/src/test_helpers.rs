//! Shared IR fixtures for unit tests.

use crate::attr::Attribute;
use crate::function::{Function, FunctionKind};
use crate::ids::BlockId;
use crate::operation::OpKind;
use crate::types::Type;

/// An empty CFG function named `f`.
pub(crate) fn cfg_function(arg_types: &[Type]) -> Function {
    Function::new("f", FunctionKind::Cfg, arg_types)
}

/// An empty structured function named `f`.
pub(crate) fn structured_function(arg_types: &[Type]) -> Function {
    Function::new("f", FunctionKind::Structured, arg_types)
}

/// Kinds of the operations in `block`, in order.
pub(crate) fn block_kinds(func: &Function, block: BlockId) -> Vec<OpKind> {
    func.block_ops(block)
        .map(|op| func.op(op).kind().clone())
        .collect()
}

/// Payload of every live constant operation, pre-order.
pub(crate) fn constant_payloads(func: &Function) -> Vec<Attribute> {
    func.walk_ops()
        .into_iter()
        .filter_map(|op| func.op(op).constant_value().cloned())
        .collect()
}
