//! SSA value/use core and constant folding for the Ori compiler.
//!
//! This crate provides:
//!
//! - **Values and uses** ([`Value`], [`Use`], [`UseList`]): every value knows
//!   every operand slot that reads it, so it can be rewired in one call
//!   ([`Function::replace_all_uses_with`]) without scanning the function.
//!
//! - **Operations** ([`Operation`], [`OpKind`]): ordered operand uses,
//!   ordered results, attributes, nested regions, a source [`Span`].
//!
//! - **Functions** ([`Function`]): the arenas owning all IR of one function,
//!   plus checked structural edits ([`Function::erase_op`]).
//!
//! - **Constant folding** ([`ConstantFold`]): a single top-down walk that
//!   folds operations through a [`FoldHook`], materializes the results as
//!   new constants, and sweeps constants left unused.
//!
//! # Value hierarchies
//!
//! Values belong to one of two hierarchies decided by the
//! [`FunctionKind`]: basic-block functions define block arguments and
//! operation results; structured functions define function arguments,
//! statement results, and induction variables. [`CfgValue`] and
//! [`StmtValue`] are typed views restricted to one hierarchy.
//!
//! # Debugging
//!
//! Call [`init_tracing`] and set `RUST_LOG=ori_ssa=debug` (or `trace`) to see
//! per-pass summaries (or per-operation fold decisions).

mod attr;
mod builder;
mod error;
mod fold;
mod function;
mod ids;
mod operation;
pub mod passes;
mod printer;
mod span;
mod types;
mod value;
mod walk;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use attr::{Attribute, Attributes};
pub use builder::OpBuilder;
pub use error::IrError;
pub use fold::{FoldHook, FoldOutcome, StandardFolder};
pub use function::{Block, BlockOps, Function, FunctionKind, InsertPoint, OpSpec, Region};
pub use ids::{BlockId, OpId, RegionId, UseId, ValueId};
pub use operation::{CmpPredicate, OpKind, OpTraits, Operation, CALLEE_ATTR, VALUE_ATTR};
pub use passes::{
    register_builtin_passes, ConstantFold, DebugConfig, FoldSummary, Pass, PassContext,
    PassError, PassInfo, PassManager, PassRegistry, PassResult, PassStats,
};
pub use printer::print_function;
pub use span::Span;
pub use types::Type;
pub use value::{
    CfgValue, CfgValueKind, Hierarchy, StmtValue, StmtValueKind, Use, UseList, Value, ValueDef,
    ValueKind,
};
pub use walk::Walker;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=ori_ssa=debug` or `RUST_LOG=ori_ssa=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
