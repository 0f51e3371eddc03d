//! Pass registry.
//!
//! Maps pass names to factories so pipelines can be assembled from names
//! (command-line flags, test fixtures). The registry is an ordinary value:
//! whoever needs one builds it and registers passes during startup. There
//! is no global instance.

use rustc_hash::FxHashMap;

use super::{ConstantFold, Pass};

/// Factory function for creating passes.
type PassFactory = Box<dyn Fn() -> Box<dyn Pass> + Send + Sync>;

/// Entry in the pass registry.
struct PassEntry {
    name: &'static str,
    description: &'static str,
    factory: PassFactory,
}

/// Name → factory map for passes.
#[derive(Default)]
pub struct PassRegistry {
    passes: FxHashMap<&'static str, PassEntry>,
}

impl PassRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the passes this crate provides.
    pub fn with_builtin_passes() -> Self {
        let mut registry = PassRegistry::new();
        register_builtin_passes(&mut registry);
        registry
    }

    /// Register a pass. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        factory: impl Fn() -> Box<dyn Pass> + Send + Sync + 'static,
    ) {
        let previous = self.passes.insert(
            name,
            PassEntry {
                name,
                description,
                factory: Box::new(factory),
            },
        );
        if previous.is_some() {
            tracing::debug!(pass = name, "replaced registered pass");
        }
    }

    /// Create a fresh instance of the pass registered as `name`.
    pub fn get(&self, name: &str) -> Option<Box<dyn Pass>> {
        self.passes.get(name).map(|entry| (entry.factory)())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.passes.contains_key(name)
    }

    /// Registered pass names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.passes.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn info(&self, name: &str) -> Option<PassInfo> {
        self.passes.get(name).map(|entry| PassInfo {
            name: entry.name,
            description: entry.description,
        })
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

/// Information about a registered pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Register the passes this crate provides.
pub fn register_builtin_passes(registry: &mut PassRegistry) {
    registry.register(
        ConstantFold::NAME,
        "Constant fold operations in functions",
        || Box::new(ConstantFold::new()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;
    use crate::passes::{PassContext, PassError, PassResult};

    struct Noop;

    impl Pass for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn run(
            &self,
            _func: &mut Function,
            _ctx: &mut PassContext,
        ) -> Result<PassResult, PassError> {
            Ok(PassResult::unchanged())
        }
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = PassRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("constant-fold").is_none());
    }

    #[test]
    fn builtin_passes() {
        let registry = PassRegistry::with_builtin_passes();
        assert_eq!(registry.names(), vec!["constant-fold"]);
        assert!(registry.contains("constant-fold"));
        let pass = registry.get("constant-fold");
        assert_eq!(pass.map(|p| p.name()), Some("constant-fold"));
    }

    #[test]
    fn register_and_describe() {
        let mut registry = PassRegistry::with_builtin_passes();
        registry.register("noop", "Does nothing", || Box::new(Noop));

        assert_eq!(registry.names(), vec!["constant-fold", "noop"]);
        assert_eq!(
            registry.info("noop"),
            Some(PassInfo {
                name: "noop",
                description: "Does nothing",
            })
        );
        assert!(!registry.contains("cse"));
        assert_eq!(registry.info("cse"), None);
    }

    #[test]
    fn re_registering_replaces() {
        let mut registry = PassRegistry::new();
        registry.register("noop", "first", || Box::new(Noop));
        registry.register("noop", "second", || Box::new(Noop));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.info("noop").map(|info| info.description),
            Some("second")
        );
    }
}
