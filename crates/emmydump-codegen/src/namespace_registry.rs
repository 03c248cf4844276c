//! Top-level names a flavor has to declare as tables

use emmydump_core::naming::{display_name, top_level_segment};
use indexmap::IndexMap;

/// Insertion-ordered map from top-level name to "is a namespace"
///
/// Types in a namespace register the namespace's first segment
/// (`UnityEngine.UI.Button` registers `UnityEngine`); types in the global
/// namespace register their own name. The first registration of a name wins.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    entries: IndexMap<String, bool>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the entry is new
    pub fn register(&mut self, namespace: &str, type_name: &str) -> bool {
        let (key, is_namespace) = if namespace.is_empty() {
            (display_name(type_name), false)
        } else {
            (top_level_segment(namespace).to_string(), true)
        };

        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, is_namespace);
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registration_order_and_flags() {
        let mut registry = NamespaceRegistry::new();
        assert!(registry.register("", "Color"));
        assert!(registry.register("UnityEngine.UI", "Button"));
        assert!(!registry.register("UnityEngine", "GameObject"));
        assert!(registry.register("", "Animal"));
        assert!(!registry.register("", "Color"));

        assert_eq!(
            registry.entries().collect::<Vec<_>>(),
            vec![("Color", false), ("UnityEngine", true), ("Animal", false)]
        );
    }

    #[test]
    fn test_global_generic_uses_display_name() {
        let mut registry = NamespaceRegistry::new();
        registry.register("", "Pool`1");
        assert_eq!(registry.entries().collect::<Vec<_>>(), vec![("Pool", false)]);
    }
}
