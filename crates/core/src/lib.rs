//! Blocks rendering core
//!
//! A declarative component tree for Slack Block Kit surfaces and the
//! single-pass engine that renders it:
//!
//! - **Component tree** (`node`, `primitives`) - immutable node values
//!   built by application code, from `Text` and `Button` up to `View`
//! - **Rendering context** (`context`) - the mutable object threaded
//!   through one traversal: output blocks, the open-block state machine,
//!   environment stack, ElementId-keyed state store, block errors
//! - **Traversal modes** - `render` produces blocks, `takeValues` applies
//!   submitted form values through bindings, `invoke` runs the matched
//!   action handler at most once
//! - **Selection bridge** (`selection`) - round-trips picker/checkbox
//!   selections between application tags and client values
//!
//! One context serves one inbound turn; build a fresh one per request.
//!
//! ```
//! use blocks_core::{BlocksContext, Node, Surface};
//! use blocks_core::primitives::{Actions, Button, Section, Text};
//!
//! let tree = Node::root(
//!     "greeting",
//!     Node::group(vec![
//!         Section::new(Text::new("Hello!").bold()).into(),
//!         Actions::new(Button::new("Wave back")).into(),
//!     ]),
//! );
//!
//! let mut ctx = BlocksContext::new(Surface::Message);
//! ctx.render(&tree).expect("render");
//! let blocks = ctx.finish();
//! assert_eq!(blocks.len(), 2);
//! ```

pub mod context;
pub mod element_id;
pub mod environment;
pub mod error;
pub mod form;
pub mod node;
pub mod primitives;
mod render;
pub mod respond;
pub mod selection;
pub mod state;

pub use context::{BlocksContext, Level2, Mode, Surface};
pub use element_id::{ElementId, Segment};
pub use environment::{
    ConversationId, CorrelationId, EnvironmentKey, EnvironmentValues, ResponseUrl, TeamId,
    TriggerId, UserId,
};
pub use error::{
    HandlerError, InconsistencyError, InputFailure, InputValidationError, RenderError,
};
pub use form::{FormState, FormValue};
pub use node::{ActionHandler, Branch, Component, ComponentObject, Node, Primitive};
pub use respond::{
    Completion, CompletionSink, InboundAction, Invocation, InvocationKind, Responder,
};
pub use selection::{SelectionState, Tag};
pub use state::{
    Binding, ComponentValue, DynamicProperty, EnvironmentRead, MetaData, State, StateStore,
};
