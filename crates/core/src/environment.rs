//! Request-scoped environment values.
//!
//! An [`EnvironmentValues`] snapshot is a typed map keyed by marker types.
//! The context keeps a non-empty stack of snapshots; an environment
//! modifier pushes a patched copy around its subtree and the engine pops
//! it on the way out, success or failure. Values are `Arc`-shared, so a
//! snapshot clone is cheap.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A typed environment slot. The implementing type is a marker; the value
/// lives in the snapshot.
pub trait EnvironmentKey: 'static {
    type Value: Clone + Send + Sync + 'static;

    /// What a read returns when nothing installed the key.
    fn default_value() -> Self::Value;
}

#[derive(Clone, Default)]
pub struct EnvironmentValues {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl EnvironmentValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<K: EnvironmentKey>(&self) -> K::Value {
        self.entries
            .get(&TypeId::of::<K>())
            .and_then(|entry| entry.downcast_ref::<K::Value>())
            .cloned()
            .unwrap_or_else(K::default_value)
    }

    pub fn set<K: EnvironmentKey>(&mut self, value: K::Value) {
        self.entries.insert(TypeId::of::<K>(), Arc::new(value));
    }

    pub fn with<K: EnvironmentKey>(mut self, value: K::Value) -> Self {
        self.set::<K>(value);
        self
    }
}

impl std::fmt::Debug for EnvironmentValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentValues").field("entries", &self.entries.len()).finish()
    }
}

macro_rules! optional_string_key {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name;

        impl EnvironmentKey for $name {
            type Value = Option<String>;

            fn default_value() -> Self::Value {
                None
            }
        }
    };
}

optional_string_key!(
    /// Slack user id of the person this turn is rendering for.
    UserId
);
optional_string_key!(
    /// Workspace/team id of the inbound request.
    TeamId
);
optional_string_key!(
    /// Channel or DM the interaction came from.
    ConversationId
);
optional_string_key!(
    /// Short-lived trigger id usable for `views.open`.
    TriggerId
);
optional_string_key!(
    /// Response URL of the inbound interaction, when Slack provided one.
    ResponseUrl
);

/// Correlates every log line of one inbound turn.
pub struct CorrelationId;

impl EnvironmentKey for CorrelationId {
    type Value = String;

    fn default_value() -> Self::Value {
        "unknown-correlation-id".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationId, CorrelationId, EnvironmentValues, UserId};

    #[test]
    fn read_of_unset_key_returns_default() {
        let environment = EnvironmentValues::new();
        assert_eq!(environment.get::<UserId>(), None);
        assert_eq!(environment.get::<CorrelationId>(), "unknown-correlation-id");
    }

    #[test]
    fn set_then_get_round_trips() {
        let environment = EnvironmentValues::new()
            .with::<UserId>(Some("U123".to_owned()))
            .with::<CorrelationId>("turn-9".to_owned());
        assert_eq!(environment.get::<UserId>(), Some("U123".to_owned()));
        assert_eq!(environment.get::<CorrelationId>(), "turn-9");
    }

    #[test]
    fn snapshots_are_independent_after_clone() {
        let base = EnvironmentValues::new().with::<ConversationId>(Some("C1".to_owned()));
        let mut patched = base.clone();
        patched.set::<ConversationId>(Some("C2".to_owned()));
        assert_eq!(base.get::<ConversationId>(), Some("C1".to_owned()));
        assert_eq!(patched.get::<ConversationId>(), Some("C2".to_owned()));
    }
}
