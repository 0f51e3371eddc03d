//! Pass manager: runs an ordered list of passes over a function.

use std::time::Instant;

use rustc_hash::FxHashSet;

use super::{Pass, PassContext, PassError, PassRegistry, PassResult};
use crate::function::Function;
use crate::printer::print_function;

/// Manages and runs passes in insertion order.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    disabled: FxHashSet<String>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from registered pass names, in order.
    pub fn from_names(registry: &PassRegistry, names: &[&str]) -> Result<Self, PassError> {
        let mut pm = PassManager::new();
        for &name in names {
            let pass = registry
                .get(name)
                .ok_or_else(|| PassError::UnknownPass(name.to_string()))?;
            pm.add_boxed(pass);
        }
        Ok(pm)
    }

    pub fn add<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    pub fn add_boxed(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Skip every pass named `name` until re-enabled.
    pub fn disable(&mut self, name: &str) {
        self.disabled.insert(name.to_string());
    }

    pub fn enable(&mut self, name: &str) {
        self.disabled.remove(name);
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.contains(name)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every enabled pass over `func`, in order.
    ///
    /// Returns one `(name, result)` entry per pass that ran, with
    /// `stats.duration` filled in. Stops at the first failing pass.
    pub fn run(
        &self,
        func: &mut Function,
        ctx: &mut PassContext,
    ) -> Result<Vec<(&'static str, PassResult)>, PassError> {
        let mut results = Vec::with_capacity(self.passes.len());

        for pass in &self.passes {
            let name = pass.name();
            if self.disabled.contains(name) {
                if ctx.debug.verbose {
                    tracing::info!(pass = name, "skipping disabled pass");
                }
                continue;
            }

            if ctx.debug.verbose {
                tracing::info!(pass = name, function = func.name(), "running pass");
            }

            let start = Instant::now();
            let mut result = pass.run(func, ctx)?;
            result.stats.duration = start.elapsed();

            if ctx.debug.print_timing {
                tracing::info!(
                    pass = name,
                    duration = ?result.stats.duration,
                    changed = result.changed,
                    items = result.stats.items_transformed,
                    "pass completed",
                );
            }

            if ctx.debug.dump_after_each && result.changed {
                tracing::debug!(pass = name, "after pass:\n{}", print_function(func));
            }

            if ctx.debug.verify_after_each {
                func.check_use_lists()
                    .map_err(|source| PassError::Ir { pass: name, source })?;
            }

            results.push((name, result));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::attr::Attribute;
    use crate::builder::OpBuilder;
    use crate::passes::{ConstantFold, DebugConfig};
    use crate::test_helpers::{cfg_function, constant_payloads};
    use crate::types::Type;

    fn foldable() -> Function {
        let mut func = cfg_function(&[]);
        let entry = func.entry_block();
        let mut b = OpBuilder::at_end(&mut func, entry);
        let three = b.constant_int(3, Type::I32);
        let four = b.constant_int(4, Type::I32);
        let sum = b.addi(three, four);
        b.ret(&[sum]);
        func
    }

    #[test]
    fn new_manager_is_empty() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn from_names_keeps_order() {
        let registry = PassRegistry::with_builtin_passes();
        let pm = PassManager::from_names(&registry, &["constant-fold", "constant-fold"]);
        let pm = pm.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(pm.pass_names(), vec!["constant-fold", "constant-fold"]);
    }

    #[test]
    fn from_names_rejects_unknown() {
        let registry = PassRegistry::with_builtin_passes();
        let err = PassManager::from_names(&registry, &["constant-fold", "cse"]).err();
        assert_eq!(err, Some(PassError::UnknownPass("cse".into())));
    }

    #[test]
    fn runs_passes_and_reports_results() {
        let mut pm = PassManager::new();
        pm.add(ConstantFold::new());
        pm.add(ConstantFold::new());
        let mut func = foldable();
        let mut ctx = PassContext::new(DebugConfig::verbose());

        let results = pm.run(&mut func, &mut ctx).unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(results.len(), 2);
        assert!(results[0].1.changed);
        assert!(!results[1].1.changed);
        assert_eq!(constant_payloads(&func), vec![Attribute::int(7, Type::I32)]);
    }

    #[test]
    fn disabled_passes_are_skipped() {
        let mut pm = PassManager::new();
        pm.add(ConstantFold::new());
        pm.disable(ConstantFold::NAME);
        assert!(!pm.is_enabled(ConstantFold::NAME));
        let mut func = foldable();

        let results = pm
            .run(&mut func, &mut PassContext::default())
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(results.is_empty());
        assert_eq!(constant_payloads(&func).len(), 2);

        pm.enable(ConstantFold::NAME);
        assert!(pm.is_enabled(ConstantFold::NAME));
    }
}
