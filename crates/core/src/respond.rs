//! Invocation descriptions and the at-most-once completion channel.
//!
//! An `invoke` traversal carries an [`Invocation`]: which submit/close/
//! action event triggered the turn plus a [`Responder`] the matched
//! handler completes through. Consumption happens the moment a handler is
//! reached: taking the responder flips the invocation's handler slot to
//! `None`, so no other structurally-matching primitive in the same tree
//! can re-trigger it. The handler itself may move the responder into
//! asynchronous work and complete later; the channel, not the traversal,
//! enforces exactly-one delivery.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::node::Node;

/// The one completion signal of an `invoke` turn.
#[derive(Debug)]
pub enum Completion {
    /// Acknowledge and change nothing.
    End,
    /// Re-render the same root and update the surface in place.
    Update,
    /// Swap the surface for a newly specified subtree.
    Replace(Node),
    /// Open a new view on top / send a new message.
    Push(Node),
    /// Close the whole modal stack / delete the message.
    Clear,
}

impl Completion {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::End => "end",
            Self::Update => "update",
            Self::Replace(_) => "replace",
            Self::Push(_) => "push",
            Self::Clear => "clear",
        }
    }
}

pub type CompletionSink = Box<dyn FnOnce(Completion) + Send + 'static>;

/// Clonable handle delivering at most one [`Completion`]. The first
/// delivery wins; later attempts are logged and dropped.
#[derive(Clone)]
pub struct Responder {
    sink: Arc<Mutex<Option<CompletionSink>>>,
}

impl Responder {
    pub fn new(sink: CompletionSink) -> Self {
        Self { sink: Arc::new(Mutex::new(Some(sink))) }
    }

    /// A responder that records its completion for inspection. Intended
    /// for tests and embedding hosts that poll rather than block.
    pub fn recording() -> (Self, Arc<Mutex<Option<Completion>>>) {
        let slot: Arc<Mutex<Option<Completion>>> = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&slot);
        let responder = Self::new(Box::new(move |completion| {
            *captured.lock().expect("completion slot poisoned") = Some(completion);
        }));
        (responder, slot)
    }

    pub fn complete(&self, completion: Completion) {
        let sink = self.sink.lock().expect("responder sink poisoned").take();
        match sink {
            Some(sink) => sink(completion),
            None => {
                warn!(kind = completion.kind(), "duplicate completion dropped; first one won")
            }
        }
    }

    pub fn delivered(&self) -> bool {
        self.sink.lock().expect("responder sink poisoned").is_none()
    }

    pub fn end(&self) {
        self.complete(Completion::End);
    }

    pub fn update(&self) {
        self.complete(Completion::Update);
    }

    pub fn replace(&self, node: Node) {
        self.complete(Completion::Replace(node));
    }

    pub fn push(&self, node: Node) {
        self.complete(Completion::Push(node));
    }

    pub fn clear(&self) {
        self.complete(Completion::Clear);
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder").field("delivered", &self.delivered()).finish()
    }
}

/// One interactive action from a `block_actions` payload, as matched
/// against rendered action ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundAction {
    pub action_id: String,
    pub block_id: Option<String>,
    pub value: Option<String>,
}

impl InboundAction {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self { action_id: action_id.into(), block_id: None, value: None }
    }

    /// Structural match: the inbound id equals the rendered element id, or
    /// extends it by a dotted suffix (multi-part controls).
    pub fn matches(&self, element_action_id: &str) -> bool {
        self.action_id == element_action_id
            || (self.action_id.len() > element_action_id.len()
                && self.action_id.starts_with(element_action_id)
                && self.action_id.as_bytes()[element_action_id.len()] == b'.')
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationKind {
    Submit,
    ViewClose,
    Actions(Vec<InboundAction>),
}

/// The matched-invocation input to an `invoke` traversal. The responder
/// slot flipping `Some` → `None` is the at-most-once marker.
#[derive(Debug)]
pub struct Invocation {
    kind: InvocationKind,
    responder: Option<Responder>,
}

impl Invocation {
    pub fn new(kind: InvocationKind, responder: Responder) -> Self {
        Self { kind, responder: Some(responder) }
    }

    pub fn kind(&self) -> &InvocationKind {
        &self.kind
    }

    pub fn consumed(&self) -> bool {
        self.responder.is_none()
    }

    /// Consumes the invocation for the matching handler. `None` once any
    /// handler anywhere in the tree has already matched.
    pub fn take_responder(&mut self) -> Option<Responder> {
        self.responder.take()
    }

    /// Logged by the turn driver when a whole traversal matched nothing.
    pub fn log_unmatched(&self) {
        if !self.consumed() {
            info!(kind = ?self.kind, "no action matched this invocation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, InboundAction, Invocation, InvocationKind, Responder};

    #[test]
    fn first_completion_wins() {
        let (responder, slot) = Responder::recording();
        responder.update();
        responder.end();
        assert!(matches!(*slot.lock().expect("slot"), Some(Completion::Update)));
        assert!(responder.delivered());
    }

    #[test]
    fn clones_share_the_at_most_once_guarantee() {
        let (responder, slot) = Responder::recording();
        let other = responder.clone();
        other.clear();
        responder.update();
        assert!(matches!(*slot.lock().expect("slot"), Some(Completion::Clear)));
    }

    #[test]
    fn responder_can_only_be_taken_once() {
        let (responder, _slot) = Responder::recording();
        let mut invocation =
            Invocation::new(InvocationKind::Actions(vec![InboundAction::new("a.1")]), responder);
        assert!(invocation.take_responder().is_some());
        assert!(invocation.take_responder().is_none());
        assert!(invocation.consumed());
    }

    #[test]
    fn inbound_action_prefix_matching_requires_a_segment_boundary() {
        let action = InboundAction::new("view.form.2.sel");
        assert!(action.matches("view.form.2.sel"));

        let multi_part = InboundAction::new("view.form.2.sel.0");
        assert!(multi_part.matches("view.form.2.sel"));

        let lookalike = InboundAction::new("view.form.2.selector");
        assert!(!lookalike.matches("view.form.2.sel"));
    }
}
