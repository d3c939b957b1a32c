use std::collections::HashMap;
use std::sync::Arc;

use blocks_core::Node;

/// Builds a fresh root body for every turn. Factories run once per
/// traversal sequence, so they should be cheap and must not capture
/// per-request state.
pub type RootFactory = Arc<dyn Fn() -> Node + Send + Sync>;

/// Routes callback ids to registered root components, the way a slash
/// command router maps verbs to handlers. The registry is immutable once
/// the host is assembled and shared across requests.
#[derive(Clone, Default)]
pub struct BlocksRegistry {
    roots: HashMap<String, RootFactory>,
}

impl BlocksRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, callback_id: impl Into<String>, factory: F)
    where
        F: Fn() -> Node + Send + Sync + 'static,
    {
        self.roots.insert(callback_id.into(), Arc::new(factory));
    }

    /// The full tree for a callback id: the registered body under a
    /// `Root` node carrying that id.
    pub fn root(&self, callback_id: &str) -> Option<Node> {
        self.roots
            .get(callback_id)
            .map(|factory| Node::root(callback_id.to_owned(), factory()))
    }

    pub fn contains(&self, callback_id: &str) -> bool {
        self.roots.contains_key(callback_id)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl std::fmt::Debug for BlocksRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlocksRegistry").field("roots", &self.roots.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use blocks_core::primitives::{Section, Text};
    use blocks_core::Node;

    use super::BlocksRegistry;

    #[test]
    fn registered_roots_are_wrapped_with_their_callback_id() {
        let mut registry = BlocksRegistry::new();
        registry.register("status", || Section::new(Text::new("ok")).into());

        assert!(registry.contains("status"));
        let root = registry.root("status").expect("registered root");
        assert!(matches!(root, Node::Root { ref callback_id, .. } if callback_id == "status"));
        assert!(registry.root("missing").is_none());
    }
}
