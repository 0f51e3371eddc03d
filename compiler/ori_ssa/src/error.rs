//! Errors raised by structural IR edits.

use crate::ids::{OpId, UseId, ValueId};

/// Failure of a structural edit or a use-list consistency check.
///
/// These indicate a bug in the caller (or, for `UseListCorrupted`, in this
/// crate). Folding itself never produces them for well-formed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    /// `erase_op` on an operation whose result (or a value defined inside
    /// its regions) is still read by an operation that would survive.
    #[error("cannot erase {op}: {value} still has {uses} use(s)")]
    ResultStillInUse {
        op: OpId,
        value: ValueId,
        uses: usize,
    },

    /// The operation was already erased.
    #[error("{0} has already been erased")]
    DeadOperation(OpId),

    /// The value was already erased.
    #[error("{0} has already been erased")]
    DeadValue(ValueId),

    /// A use and its target's use-list disagree.
    #[error("use-list of {value} is inconsistent at {use_id}: {reason}")]
    UseListCorrupted {
        value: ValueId,
        use_id: UseId,
        reason: &'static str,
    },
}
