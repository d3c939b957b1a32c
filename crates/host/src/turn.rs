//! The turn driver: sequences the traversals of one inbound interaction.
//!
//! Every turn gets a fresh [`BlocksContext`]. A `block_actions` turn runs
//! takeValues over the merged form state, then invoke over the matched
//! actions, then renders the response on a context cloned via
//! `make_response_context`. The completion channel is awaited only after
//! a handler actually consumed the invocation, so a turn that matched
//! nothing acknowledges immediately ("no action matched" is logged, not
//! an error).

use std::collections::BTreeMap;

use blocks_core::{
    BlocksContext, Completion, ConversationId, CorrelationId, EnvironmentValues, Invocation,
    InvocationKind, Mode, Node, RenderError, ResponseUrl, Responder, Surface, TeamId, TriggerId,
    UserId,
};
use blocks_kit::{Block, View};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::interaction::{BlockActionsPayload, ViewClosedPayload, ViewSubmissionPayload};
use crate::registry::BlocksRegistry;

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("no root registered for callback id `{0}`")]
    UnknownRoot(String),
    #[error("interaction carries no callback id")]
    MissingCallbackId,
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What the transport layer should answer with.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Plain acknowledgment, nothing to send.
    Ack,
    UpdateMessage { blocks: Vec<Block> },
    UpdateView { view: View },
    PushView { view: View },
    PostMessage { blocks: Vec<Block> },
    /// Close the whole modal stack / delete the message.
    Clear,
    /// Inline validation errors keyed by block id.
    Errors { errors: BTreeMap<String, String> },
}

impl TurnOutcome {
    /// The `response_action` body for a `view_submission` HTTP response,
    /// when this outcome maps to one.
    pub fn response_action_json(&self) -> Option<serde_json::Value> {
        match self {
            Self::Ack | Self::UpdateMessage { .. } | Self::PostMessage { .. } => None,
            Self::Errors { errors } => Some(serde_json::json!({
                "response_action": "errors",
                "errors": errors,
            })),
            Self::UpdateView { view } => view_response_action("update", view),
            Self::PushView { view } => view_response_action("push", view),
            Self::Clear => Some(serde_json::json!({"response_action": "clear"})),
        }
    }
}

fn view_response_action(action: &str, view: &View) -> Option<serde_json::Value> {
    match serde_json::to_value(view) {
        Ok(view) => Some(serde_json::json!({"response_action": action, "view": view})),
        Err(source) => {
            warn!(%source, "failed to encode view for a response action");
            None
        }
    }
}

/// The leading segment of a rendered action id is the root callback id.
/// Message-surface actions carry no view object, so this is how their
/// turns find their way back to the registered root.
fn callback_id_of_action(action_id: &str) -> String {
    let segment = action_id.split('.').next().unwrap_or(action_id);
    segment.replace("%2E", ".").replace("%25", "%")
}

fn base_environment() -> EnvironmentValues {
    EnvironmentValues::new().with::<CorrelationId>(Uuid::new_v4().to_string())
}

fn environment_for_actions(payload: &BlockActionsPayload) -> EnvironmentValues {
    base_environment()
        .with::<UserId>(Some(payload.user_id.clone()))
        .with::<TeamId>(payload.team_id.clone())
        .with::<ConversationId>(payload.channel_id.clone())
        .with::<TriggerId>(payload.trigger_id.clone())
        .with::<ResponseUrl>(payload.response_url.clone())
}

fn environment_for_submission(payload: &ViewSubmissionPayload) -> EnvironmentValues {
    base_environment()
        .with::<UserId>(Some(payload.user_id.clone()))
        .with::<TeamId>(payload.team_id.clone())
        .with::<TriggerId>(payload.trigger_id.clone())
}

impl BlocksRegistry {
    /// First render of a message-surface root.
    pub fn render_message(
        &self,
        callback_id: &str,
        environment: EnvironmentValues,
    ) -> Result<Vec<Block>, TurnError> {
        let root = self
            .root(callback_id)
            .ok_or_else(|| TurnError::UnknownRoot(callback_id.to_owned()))?;
        let mut ctx = BlocksContext::new(Surface::Message);
        ctx.install_environment(environment);
        ctx.render(&root)?;
        Ok(ctx.finish())
    }

    /// First render of a modal root, for `views.open`.
    pub fn open_view(
        &self,
        callback_id: &str,
        environment: EnvironmentValues,
    ) -> Result<View, TurnError> {
        let root = self
            .root(callback_id)
            .ok_or_else(|| TurnError::UnknownRoot(callback_id.to_owned()))?;
        let mut ctx = BlocksContext::new(Surface::Modal);
        ctx.install_environment(environment);
        ctx.render(&root)?;
        Ok(ctx.finish_view()?)
    }

    pub async fn block_actions_turn(
        &self,
        payload: BlockActionsPayload,
    ) -> Result<TurnOutcome, TurnError> {
        let callback_id = payload
            .view
            .as_ref()
            .and_then(|view| view.callback_id.clone())
            .or_else(|| payload.actions.first().map(|action| {
                callback_id_of_action(&action.action_id)
            }))
            .ok_or(TurnError::MissingCallbackId)?;
        let root =
            self.root(&callback_id).ok_or_else(|| TurnError::UnknownRoot(callback_id.clone()))?;

        let surface =
            if payload.view.is_some() { Surface::Modal } else { Surface::Message };
        let mut ctx = BlocksContext::new(surface);
        ctx.install_environment(environment_for_actions(&payload));
        if let Some(view) = &payload.view {
            ctx.install_metadata_string(&view.private_metadata);
        }

        info!(callback_id, actions = payload.actions.len(), "block actions turn");

        ctx.prepare_for(Mode::TakeValues(payload.form.clone()));
        ctx.render(&root)?;

        ctx.preserve_state();
        let invocation = InvocationKind::Actions(payload.actions.clone());
        self.invoke_and_respond(ctx, &root, invocation).await
    }

    pub async fn view_submission_turn(
        &self,
        payload: ViewSubmissionPayload,
    ) -> Result<TurnOutcome, TurnError> {
        let callback_id =
            payload.view.callback_id.clone().ok_or(TurnError::MissingCallbackId)?;
        let root =
            self.root(&callback_id).ok_or_else(|| TurnError::UnknownRoot(callback_id.clone()))?;

        let mut ctx = BlocksContext::new(Surface::Modal);
        ctx.install_environment(environment_for_submission(&payload));
        ctx.install_metadata_string(&payload.view.private_metadata);

        info!(callback_id, values = payload.view.state.len(), "view submission turn");

        ctx.prepare_for(Mode::TakeValues(payload.view.state.clone()));
        ctx.render(&root)?;

        ctx.preserve_state();
        self.invoke_and_respond(ctx, &root, InvocationKind::Submit).await
    }

    /// A `view_closed` turn runs handlers for their side effects; the
    /// event itself cannot be answered with new content.
    pub async fn view_closed_turn(
        &self,
        payload: ViewClosedPayload,
    ) -> Result<TurnOutcome, TurnError> {
        let callback_id =
            payload.view.callback_id.clone().ok_or(TurnError::MissingCallbackId)?;
        let root =
            self.root(&callback_id).ok_or_else(|| TurnError::UnknownRoot(callback_id.clone()))?;

        let mut ctx = BlocksContext::new(Surface::Modal);
        ctx.install_environment(
            base_environment()
                .with::<UserId>(Some(payload.user_id.clone()))
                .with::<TeamId>(payload.team_id.clone()),
        );
        ctx.install_metadata_string(&payload.view.private_metadata);

        let (responder, receiver) = channel_responder();
        ctx.prepare_for(Mode::Invoke(Invocation::new(InvocationKind::ViewClose, responder)));
        ctx.render(&root)?;

        if consumed(&ctx) {
            let completion = await_completion(receiver).await;
            if !matches!(completion, Completion::End) {
                debug!(kind = completion.kind(), "view_closed cannot carry a response; ignored");
            }
        } else if let Some(invocation) = ctx.invocation() {
            invocation.log_unmatched();
        }
        Ok(TurnOutcome::Ack)
    }

    /// Runs the invoke traversal, waits for the matched handler's
    /// completion, and renders the turn's response.
    async fn invoke_and_respond(
        &self,
        mut ctx: BlocksContext,
        root: &Node,
        kind: InvocationKind,
    ) -> Result<TurnOutcome, TurnError> {
        let (responder, receiver) = channel_responder();
        ctx.prepare_for(Mode::Invoke(Invocation::new(kind, responder)));
        ctx.render(root)?;

        if ctx.has_block_errors() {
            return Ok(TurnOutcome::Errors { errors: ctx.block_errors().clone() });
        }

        let completion = if consumed(&ctx) {
            await_completion(receiver).await
        } else {
            if let Some(invocation) = ctx.invocation() {
                invocation.log_unmatched();
            }
            Completion::End
        };

        self.respond_with(&ctx, root, completion)
    }

    fn respond_with(
        &self,
        ctx: &BlocksContext,
        root: &Node,
        completion: Completion,
    ) -> Result<TurnOutcome, TurnError> {
        match completion {
            Completion::End => Ok(TurnOutcome::Ack),
            Completion::Clear => Ok(TurnOutcome::Clear),
            Completion::Update => self.render_response(ctx, root, false),
            Completion::Replace(node) => self.render_response(ctx, &node, false),
            Completion::Push(node) => self.render_response(ctx, &node, true),
        }
    }

    fn render_response(
        &self,
        ctx: &BlocksContext,
        node: &Node,
        push: bool,
    ) -> Result<TurnOutcome, TurnError> {
        let mut response = ctx.make_response_context();
        response.render(node)?;
        Ok(match response.surface() {
            Surface::Modal | Surface::HomeTab => {
                let view = response.finish_view()?;
                if push {
                    TurnOutcome::PushView { view }
                } else {
                    TurnOutcome::UpdateView { view }
                }
            }
            Surface::Message => {
                let blocks = response.finish();
                if push {
                    TurnOutcome::PostMessage { blocks }
                } else {
                    TurnOutcome::UpdateMessage { blocks }
                }
            }
        })
    }
}

fn channel_responder() -> (Responder, oneshot::Receiver<Completion>) {
    let (sender, receiver) = oneshot::channel();
    let responder = Responder::new(Box::new(move |completion| {
        let _ = sender.send(completion);
    }));
    (responder, receiver)
}

fn consumed(ctx: &BlocksContext) -> bool {
    ctx.invocation().map(Invocation::consumed).unwrap_or(false)
}

async fn await_completion(receiver: oneshot::Receiver<Completion>) -> Completion {
    match receiver.await {
        Ok(completion) => completion,
        Err(_) => {
            // The handler ran (it may have mutated state) but never chose a
            // completion; refresh the surface so its writes become visible.
            warn!("handler consumed the invocation but dropped its responder; updating");
            Completion::Update
        }
    }
}

#[cfg(test)]
mod tests {
    use blocks_core::primitives::{Actions, Button, Section, Text, TextField, View};
    use blocks_core::{
        BlocksContext, Component, DynamicProperty, EnvironmentValues, InboundAction, Node,
        Responder, State,
    };
    use blocks_kit::Block;

    use super::{TurnError, TurnOutcome};
    use crate::interaction::{BlockActionsPayload, InboundView, ViewSubmissionPayload};
    use crate::registry::BlocksRegistry;

    #[derive(Clone)]
    struct Counter {
        count: State<i64>,
    }

    impl Component for Counter {
        fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
            vec![&mut self.count]
        }

        fn body(&self) -> Node {
            let clicks = self.count.binding();
            Node::group(vec![
                Section::new(Text::new(format!("Count: {}", self.count.value()))).into(),
                Actions::new(Button::new("Increment").on_action(
                    move |ctx: &mut BlocksContext, responder: Responder| {
                        let current = clicks.resolve(ctx).unwrap_or_default();
                        clicks.write(ctx, current + 1);
                        responder.update();
                        Ok(())
                    },
                ))
                .into(),
            ])
        }
    }

    fn counter_registry() -> BlocksRegistry {
        let mut registry = BlocksRegistry::new();
        registry.register("counter", || Node::component(Counter { count: State::new(0) }));
        registry
    }

    fn actions_payload(action_id: &str) -> BlockActionsPayload {
        BlockActionsPayload {
            user_id: "U1".to_owned(),
            team_id: Some("T1".to_owned()),
            channel_id: Some("C1".to_owned()),
            message_ts: Some("123.45".to_owned()),
            trigger_id: None,
            response_url: None,
            view: None,
            actions: vec![InboundAction::new(action_id)],
            form: blocks_core::FormState::new(),
        }
    }

    #[test]
    fn render_message_produces_the_initial_blocks() {
        let registry = counter_registry();
        let blocks = registry
            .render_message("counter", EnvironmentValues::new())
            .expect("render");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(
            &blocks[0],
            Block::Section { text: Some(text), .. } if text.text() == "Count: 0"
        ));
    }

    #[tokio::test]
    async fn matched_button_updates_the_message_with_new_state() {
        let registry = counter_registry();
        // The button sits in the actions block at group position 1.
        let outcome = registry
            .block_actions_turn(actions_payload("counter.1"))
            .await
            .expect("turn");

        let TurnOutcome::UpdateMessage { blocks } = outcome else {
            panic!("update expected, got {outcome:?}");
        };
        assert!(matches!(
            &blocks[0],
            Block::Section { text: Some(text), .. } if text.text() == "Count: 1"
        ));
    }

    #[tokio::test]
    async fn unmatched_action_acknowledges_without_side_effects() {
        let registry = counter_registry();
        let outcome = registry
            .block_actions_turn(actions_payload("counter.somewhere.else"))
            .await
            .expect("turn");
        assert!(matches!(outcome, TurnOutcome::Ack));
    }

    #[tokio::test]
    async fn unknown_callback_id_is_a_turn_error() {
        let registry = BlocksRegistry::new();
        let result = registry.block_actions_turn(actions_payload("ghost.0")).await;
        assert!(matches!(result, Err(TurnError::UnknownRoot(id)) if id == "ghost"));
    }

    #[derive(Clone)]
    struct SignupForm {
        email: State<String>,
    }

    impl Component for SignupForm {
        fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
            vec![&mut self.email]
        }

        fn body(&self) -> Node {
            let email = self.email.value().clone();
            View::new("Sign up", TextField::new("Email", self.email.binding()))
                .on_submit(move |_ctx: &mut BlocksContext, responder: Responder| {
                    if email.contains('@') {
                        responder.clear();
                        Ok(())
                    } else {
                        Err(blocks_core::InputValidationError::new(
                            "Please enter a valid email address.",
                        )
                        .into())
                    }
                })
                .into()
        }
    }

    fn submission_payload(email: &str) -> ViewSubmissionPayload {
        let mut state = blocks_core::FormState::new();
        state.insert("signup", "signup", blocks_core::FormValue::Text(email.to_owned()));
        ViewSubmissionPayload {
            user_id: "U1".to_owned(),
            team_id: None,
            trigger_id: None,
            view: InboundView {
                id: "V1".to_owned(),
                callback_id: Some("signup".to_owned()),
                private_metadata: String::new(),
                hash: None,
                state,
            },
        }
    }

    fn signup_registry() -> BlocksRegistry {
        let mut registry = BlocksRegistry::new();
        registry
            .register("signup", || Node::component(SignupForm { email: State::new(String::new()) }));
        registry
    }

    #[tokio::test]
    async fn valid_submission_clears_the_modal_stack() {
        let registry = signup_registry();
        let outcome = registry
            .view_submission_turn(submission_payload("a@example.com"))
            .await
            .expect("turn");
        assert!(matches!(outcome, TurnOutcome::Clear));
        assert_eq!(
            outcome.response_action_json(),
            Some(serde_json::json!({"response_action": "clear"}))
        );
    }

    #[derive(Clone)]
    struct QuantityForm {
        quantity: State<i64>,
    }

    impl Component for QuantityForm {
        fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
            vec![&mut self.quantity]
        }

        fn body(&self) -> Node {
            View::new(
                "Order",
                TextField::formatted(
                    "Quantity",
                    self.quantity.binding(),
                    "Quantity must be a whole number.",
                ),
            )
            .on_submit(|_ctx: &mut BlocksContext, responder: Responder| {
                responder.clear();
                Ok(())
            })
            .into()
        }
    }

    #[tokio::test]
    async fn formatter_failure_in_take_values_surfaces_as_errors() {
        let mut registry = BlocksRegistry::new();
        registry.register("order", || Node::component(QuantityForm { quantity: State::new(1) }));

        let mut state = blocks_core::FormState::new();
        state.insert("order", "order", blocks_core::FormValue::Text("twelve".to_owned()));
        let payload = ViewSubmissionPayload {
            user_id: "U1".to_owned(),
            team_id: None,
            trigger_id: None,
            view: InboundView {
                id: "V9".to_owned(),
                callback_id: Some("order".to_owned()),
                private_metadata: String::new(),
                hash: None,
                state,
            },
        };

        let outcome = registry.view_submission_turn(payload).await.expect("turn");
        let TurnOutcome::Errors { errors } = outcome else {
            panic!("errors expected, got {outcome:?}");
        };
        assert_eq!(
            errors.get("order").map(String::as_str),
            Some("Quantity must be a whole number.")
        );
    }

    #[tokio::test]
    async fn rejected_submission_surfaces_inline_errors() {
        let registry = signup_registry();
        let outcome = registry
            .view_submission_turn(submission_payload("not-an-email"))
            .await
            .expect("turn");

        let TurnOutcome::Errors { errors } = &outcome else {
            panic!("errors expected, got {outcome:?}");
        };
        assert_eq!(errors.len(), 1);
        let body = outcome.response_action_json().expect("response action");
        assert_eq!(body["response_action"], "errors");
    }
}
