//! Target registry for name-to-emitter mapping.
//!
//! Provides a singleton registry that maps target language names (and
//! their aliases, e.g. "py" for "python") to their [`Target`]
//! implementations.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::lang::traits::Target;
use crate::lang::{java, python};

static REGISTRY: OnceLock<TargetRegistry> = OnceLock::new();

static PYTHON: python::Python = python::Python;
static JAVA: java::Java = java::Java;

/// Registry mapping target names to language emitters.
///
/// The registry maintains two mappings:
/// - `by_name`: canonical name to implementation (e.g. "python" -> Python)
/// - `aliases`: alternative names to canonical names (e.g. "py" -> "python")
pub struct TargetRegistry {
    by_name: HashMap<&'static str, &'static dyn Target>,
    aliases: HashMap<&'static str, &'static str>,
}

impl TargetRegistry {
    /// Get the global target registry singleton.
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::new)
    }

    /// Create a new registry with all supported targets.
    fn new() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            aliases: HashMap::new(),
        };
        registry.register(&PYTHON);
        registry.register(&JAVA);
        registry
    }

    fn register(&mut self, target: &'static dyn Target) {
        let name = target.name();
        for alias in target.aliases() {
            self.aliases.insert(alias, name);
        }
        self.by_name.insert(name, target);
    }

    /// Get a target by name, resolving aliases first.
    pub fn get_by_name(&self, name: &str) -> Option<&'static dyn Target> {
        let canonical = self.aliases.get(name).copied().unwrap_or(name);
        self.by_name.get(canonical).copied()
    }

    /// List all canonical target names, sorted.
    pub fn supported_targets(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Check if a target name is supported (including aliases).
    pub fn is_supported(&self, name: &str) -> bool {
        self.by_name.contains_key(name) || self.aliases.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_name_canonical() {
        let registry = TargetRegistry::global();
        assert!(registry.get_by_name("python").is_some());
        assert!(registry.get_by_name("java").is_some());
    }

    #[test]
    fn test_python_aliases() {
        let registry = TargetRegistry::global();
        let py = registry.get_by_name("py");
        assert!(py.is_some(), "py alias should be supported");
        assert_eq!(py.unwrap().name(), "python");
        assert_eq!(registry.get_by_name("python3").unwrap().name(), "python");
    }

    #[test]
    fn test_unknown_target() {
        let registry = TargetRegistry::global();
        assert!(registry.get_by_name("cobol").is_none());
        assert!(!registry.is_supported("cobol"));
    }

    #[test]
    fn test_supported_targets_sorted() {
        let names = TargetRegistry::global().supported_targets();
        assert_eq!(names, vec!["java", "python"]);
    }
}
