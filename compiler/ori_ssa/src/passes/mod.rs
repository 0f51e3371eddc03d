//! Pass infrastructure.
//!
//! - `mod.rs`: [`Pass`] trait, [`PassResult`], [`PassError`], [`PassContext`]
//! - `const_fold.rs`: constant folding
//! - `registry.rs`: name → factory registry populated at startup
//! - `manager.rs`: runs an ordered list of passes over a function

mod const_fold;
mod manager;
mod registry;

pub use const_fold::{ConstantFold, FoldSummary};
pub use manager::PassManager;
pub use registry::{register_builtin_passes, PassInfo, PassRegistry};

use std::time::Duration;

use crate::error::IrError;
use crate::function::Function;
use crate::ids::OpId;

/// Result of running a pass.
#[derive(Debug, Clone)]
pub struct PassResult {
    /// Whether the pass made any changes.
    pub changed: bool,
    pub stats: PassStats,
}

impl PassResult {
    pub fn unchanged() -> Self {
        PassResult {
            changed: false,
            stats: PassStats::default(),
        }
    }

    pub fn changed(items_transformed: usize) -> Self {
        PassResult {
            changed: true,
            stats: PassStats {
                duration: Duration::ZERO,
                items_transformed,
            },
        }
    }
}

/// Statistics collected during pass execution.
#[derive(Debug, Clone, Default)]
pub struct PassStats {
    /// Filled in by the [`PassManager`].
    pub duration: Duration,
    pub items_transformed: usize,
}

/// Failure of a pass run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassError {
    /// A fold hook returned a constant count different from the operation's
    /// result count. This is a bug in the hook; the run stops before the
    /// operation is touched.
    #[error(
        "{pass}: fold hook returned {found} constant(s) for {op} ({kind}) with {expected} result(s)"
    )]
    ResultCountMismatch {
        pass: &'static str,
        op: OpId,
        kind: String,
        expected: usize,
        found: usize,
    },

    /// A structural edit or consistency check failed.
    #[error("{pass}: {source}")]
    Ir {
        pass: &'static str,
        #[source]
        source: IrError,
    },

    /// A pipeline named a pass the registry does not know.
    #[error("unknown pass '{0}'")]
    UnknownPass(String),
}

/// Debug output switches for a pass pipeline.
#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    /// Log the function after each pass that changed it.
    pub dump_after_each: bool,
    /// Log each pass's duration.
    pub print_timing: bool,
    /// Log pass names as they run.
    pub verbose: bool,
    /// Check use-list consistency after each pass.
    pub verify_after_each: bool,
}

impl DebugConfig {
    pub fn quiet() -> Self {
        DebugConfig::default()
    }

    pub fn verbose() -> Self {
        DebugConfig {
            dump_after_each: false,
            print_timing: true,
            verbose: true,
            verify_after_each: true,
        }
    }
}

/// State shared by the passes of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PassContext {
    pub debug: DebugConfig,
}

impl PassContext {
    pub fn new(debug: DebugConfig) -> Self {
        PassContext { debug }
    }
}

/// A transformation over one function.
///
/// Passes receive the function by exclusive reference: one pass mutates a
/// function at a time, and functions can be processed on separate threads
/// as long as no IR is shared between them.
pub trait Pass {
    /// Registry and log name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    fn run(&self, func: &mut Function, ctx: &mut PassContext) -> Result<PassResult, PassError>;
}

impl<T: Pass + ?Sized> Pass for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn description(&self) -> &'static str {
        (**self).description()
    }

    fn run(&self, func: &mut Function, ctx: &mut PassContext) -> Result<PassResult, PassError> {
        (**self).run(func, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_result_unchanged() {
        let result = PassResult::unchanged();
        assert!(!result.changed);
        assert_eq!(result.stats.items_transformed, 0);
    }

    #[test]
    fn pass_result_changed() {
        let result = PassResult::changed(5);
        assert!(result.changed);
        assert_eq!(result.stats.items_transformed, 5);
    }

    #[test]
    fn pass_error_messages() {
        let err = PassError::ResultCountMismatch {
            pass: "constant-fold",
            op: OpId::new(3),
            kind: "addi".into(),
            expected: 1,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("op3"), "{msg}");
        assert!(msg.contains("2 constant(s)"), "{msg}");

        let err = PassError::Ir {
            pass: "constant-fold",
            source: IrError::DeadOperation(OpId::new(1)),
        };
        assert_eq!(err.to_string(), "constant-fold: op1 has already been erased");
        assert_eq!(
            PassError::UnknownPass("cse".into()).to_string(),
            "unknown pass 'cse'"
        );
    }

    #[test]
    fn debug_config_presets() {
        let quiet = DebugConfig::quiet();
        assert!(!quiet.verbose && !quiet.print_timing && !quiet.dump_after_each);
        let verbose = DebugConfig::verbose();
        assert!(verbose.verbose && verbose.print_timing && verbose.verify_after_each);
    }
}
