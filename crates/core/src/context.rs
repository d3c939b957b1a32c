//! The rendering context: the single mutable object threaded through a
//! traversal.
//!
//! One context serves one logical turn. It owns the accumulated output
//! blocks, the at-most-one open block under construction, the level-2
//! slot marker, the environment stack, the ElementId-keyed state store,
//! the traversal mode, and the block-error map. It is not safe for
//! concurrent use; concurrency across requests comes from one fresh
//! context per request (or [`BlocksContext::make_response_context`]).

use std::collections::BTreeMap;

use blocks_kit::{
    limits, Block, BlockElement, ContextElement, ImageBlock, RichTextBlockElement, RichTextRun,
    TextObject, View as WireView, ViewKind,
};
use tracing::{debug, error, warn};

use crate::element_id::{ElementId, Segment};
use crate::environment::EnvironmentValues;
use crate::error::{HandlerError, InconsistencyError, RenderError};
use crate::form::{FormState, FormValue};
use crate::node::{ActionHandler, EnvironmentPatch};
use crate::respond::{InboundAction, Invocation, InvocationKind, Responder};
use crate::selection::SelectionState;
use crate::state::{ComponentValue, StateStore};

/// Which Slack surface this traversal renders for. Drives auto-promotion
/// (interactive elements wrap in `Input` on modal surfaces, `Actions`
/// elsewhere) and the finish pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Surface {
    #[default]
    Message,
    Modal,
    HomeTab,
}

impl Surface {
    pub fn is_view(self) -> bool {
        matches!(self, Self::Modal | Self::HomeTab)
    }
}

/// The traversal mode, fixed for the whole walk.
#[derive(Debug, Default)]
pub enum Mode {
    #[default]
    Render,
    TakeValues(FormState),
    Invoke(Invocation),
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::TakeValues(_) => "takeValues",
            Self::Invoke(_) => "invoke",
        }
    }
}

/// Which second-level slot of the open block is currently being filled.
/// Must be back to `None` by the time the slot's subtree finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Level2 {
    #[default]
    None,
    Accessory,
    Field,
    Button,
    Picker,
    Generic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RichTextPartKind {
    Paragraph,
    Quote,
    Preformatted,
}

#[derive(Clone, Debug)]
pub(crate) struct OpenRichTextPart {
    pub kind: RichTextPartKind,
    pub runs: Vec<RichTextRun>,
}

/// The at-most-one block under construction.
#[derive(Clone, Debug)]
pub(crate) enum OpenBlock {
    Section {
        block_id: String,
        text: Option<TextObject>,
        fields: Vec<TextObject>,
        accessory: Option<BlockElement>,
    },
    Actions {
        block_id: String,
        elements: Vec<BlockElement>,
    },
    Context {
        block_id: String,
        elements: Vec<ContextElement>,
    },
    Header {
        block_id: String,
        text: String,
    },
    Input {
        block_id: String,
        label: String,
        element: Option<BlockElement>,
        hint: Option<TextObject>,
        optional: bool,
        dispatch_action: bool,
    },
    RichText {
        block_id: String,
        parts: Vec<RichTextBlockElement>,
        open_part: Option<OpenRichTextPart>,
    },
}

impl OpenBlock {
    pub fn section(block_id: String) -> Self {
        Self::Section { block_id, text: None, fields: Vec::new(), accessory: None }
    }

    pub fn actions(block_id: String) -> Self {
        Self::Actions { block_id, elements: Vec::new() }
    }

    pub fn context(block_id: String) -> Self {
        Self::Context { block_id, elements: Vec::new() }
    }

    pub fn header(block_id: String) -> Self {
        Self::Header { block_id, text: String::new() }
    }

    pub fn rich_text(block_id: String) -> Self {
        Self::RichText { block_id, parts: Vec::new(), open_part: None }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Section { .. } => "section",
            Self::Actions { .. } => "actions",
            Self::Context { .. } => "context",
            Self::Header { .. } => "header",
            Self::Input { .. } => "input",
            Self::RichText { .. } => "rich_text",
        }
    }

    pub fn block_id(&self) -> &str {
        match self {
            Self::Section { block_id, .. }
            | Self::Actions { block_id, .. }
            | Self::Context { block_id, .. }
            | Self::Header { block_id, .. }
            | Self::Input { block_id, .. }
            | Self::RichText { block_id, .. } => block_id,
        }
    }

    /// Whether closing this block now would emit something useful.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Section { text, fields, accessory, .. } => {
                text.as_ref().map_or(true, TextObject::is_empty)
                    && fields.is_empty()
                    && accessory.is_none()
            }
            Self::Actions { elements, .. } => elements.is_empty(),
            Self::Context { elements, .. } => elements.is_empty(),
            Self::Header { text, .. } => text.is_empty(),
            Self::Input { element, .. } => element.is_none(),
            Self::RichText { parts, open_part, .. } => {
                parts.is_empty() && open_part.as_ref().map_or(true, |part| part.runs.is_empty())
            }
        }
    }

    fn finish(self) -> Option<Block> {
        match self {
            Self::Section { block_id, text, fields, accessory } => Some(Block::Section {
                block_id: Some(block_id),
                text,
                fields,
                accessory,
            }),
            Self::Actions { block_id, elements } => {
                Some(Block::Actions { block_id: Some(block_id), elements })
            }
            Self::Context { block_id, elements } => {
                Some(Block::Context { block_id: Some(block_id), elements })
            }
            Self::Header { block_id, text } => Some(Block::Header {
                block_id: Some(block_id),
                text: TextObject::plain(text),
            }),
            Self::Input { block_id, label, element, hint, optional, dispatch_action } => {
                // An input block without an element is unrepresentable on
                // the wire; the caller drops it before finishing.
                element.map(|element| Block::Input {
                    block_id: Some(block_id),
                    label: TextObject::plain(label),
                    element,
                    hint,
                    optional,
                    dispatch_action,
                })
            }
            Self::RichText { block_id, mut parts, open_part } => {
                if let Some(part) = open_part {
                    if !part.runs.is_empty() {
                        parts.push(part.into_wire());
                    }
                }
                Some(Block::RichText { block_id: Some(block_id), elements: parts })
            }
        }
    }

    /// The inverse of `finish`, for the "sibling arrived after its
    /// container closed" repair. Only sections are worth reopening.
    fn reopen(block: Block) -> Result<Self, Block> {
        match block {
            Block::Section { block_id, text, fields, accessory } => Ok(Self::Section {
                block_id: block_id.unwrap_or_default(),
                text,
                fields,
                accessory,
            }),
            other => Err(other),
        }
    }
}

impl OpenRichTextPart {
    pub fn new(kind: RichTextPartKind) -> Self {
        Self { kind, runs: Vec::new() }
    }

    pub fn into_wire(self) -> RichTextBlockElement {
        match self.kind {
            RichTextPartKind::Paragraph => {
                RichTextBlockElement::RichTextSection { elements: self.runs }
            }
            RichTextPartKind::Quote => RichTextBlockElement::RichTextQuote { elements: self.runs },
            RichTextPartKind::Preformatted => {
                RichTextBlockElement::RichTextPreformatted { elements: self.runs }
            }
        }
    }
}

/// View chrome captured from a `View` node, assembled by the finish pass.
#[derive(Clone, Debug, Default)]
pub(crate) struct ViewFrame {
    pub title: String,
    pub submit_title: Option<String>,
    pub close_title: Option<String>,
    pub clear_on_close: bool,
    pub notify_on_close: bool,
}

pub struct BlocksContext {
    pub(crate) mode: Mode,
    pub(crate) surface: Surface,
    pub(crate) element_id: ElementId,
    pub(crate) root_callback_id: Option<String>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) current: Option<OpenBlock>,
    pub(crate) level2: Level2,
    pub(crate) environment: Vec<EnvironmentValues>,
    pub(crate) state: StateStore,
    pub(crate) preserve_state: bool,
    pub(crate) selection: Option<SelectionState>,
    pub(crate) text_sink: Option<String>,
    pub(crate) view: Option<ViewFrame>,
    pub(crate) block_errors: BTreeMap<String, String>,
    pub(crate) incoming_metadata: BTreeMap<String, String>,
    pub(crate) outgoing_metadata: BTreeMap<String, String>,
}

impl BlocksContext {
    pub fn new(surface: Surface) -> Self {
        Self {
            mode: Mode::Render,
            surface,
            element_id: ElementId::new(),
            root_callback_id: None,
            blocks: Vec::new(),
            current: None,
            level2: Level2::None,
            environment: vec![EnvironmentValues::new()],
            state: StateStore::new(),
            preserve_state: false,
            selection: None,
            text_sink: None,
            view: None,
            block_errors: BTreeMap::new(),
            incoming_metadata: BTreeMap::new(),
            outgoing_metadata: BTreeMap::new(),
        }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Seeds the root environment snapshot. Only valid between traversals.
    pub fn install_environment(&mut self, environment: EnvironmentValues) {
        assert!(self.environment.len() == 1, "environment installed mid-traversal");
        self.environment[0] = environment;
    }

    pub fn set_incoming_metadata(&mut self, metadata: BTreeMap<String, String>) {
        self.incoming_metadata = metadata;
    }

    /// Re-arms the context for the next traversal of the same turn.
    /// Asserts that the previous traversal left every transient stack
    /// balanced; an unbalanced stack is an engine bug, never input data.
    /// Block errors survive: they belong to the turn, not the traversal,
    /// so a takeValues parse failure is still visible after invoke.
    pub fn prepare_for(&mut self, mode: Mode) {
        assert!(self.element_id.is_empty(), "element id path not balanced after traversal");
        assert!(self.environment.len() == 1, "environment stack not balanced after traversal");
        assert!(self.selection.is_none(), "selection bridge left installed after traversal");
        assert!(self.text_sink.is_none(), "text sink left installed after traversal");
        self.mode = mode;
        self.root_callback_id = None;
        self.blocks.clear();
        self.current = None;
        self.level2 = Level2::None;
        self.view = None;
        self.outgoing_metadata.clear();
    }

    /// Marks local state for carry-over into the response context.
    pub fn preserve_state(&mut self) {
        self.preserve_state = true;
    }

    /// A fresh context for rendering the response of this turn. Copies the
    /// root environment and inbound metadata; copies state only when this
    /// turn opted in via [`preserve_state`](Self::preserve_state). Never
    /// copies the block-building fields.
    pub fn make_response_context(&self) -> Self {
        let mut response = Self::new(self.surface);
        response.environment[0] = self.environment[0].clone();
        response.incoming_metadata = self.incoming_metadata.clone();
        if self.preserve_state {
            response.state = self.state.clone();
        }
        response
    }

    // ---- environment ----------------------------------------------------

    pub fn environment(&self) -> &EnvironmentValues {
        self.environment.last().expect("environment stack is never empty")
    }

    pub(crate) fn with_environment_patch<R>(
        &mut self,
        patch: &EnvironmentPatch,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let mut snapshot = self.environment().clone();
        patch(&mut snapshot);
        self.environment.push(snapshot);
        let result = f(self);
        self.environment.pop();
        result
    }

    pub(crate) fn with_segment<R>(
        &mut self,
        segment: Segment,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.element_id.push(segment);
        let result = f(self);
        self.element_id.pop();
        result
    }

    // ---- state ----------------------------------------------------------

    pub fn state_value<T: ComponentValue>(&self, id: &ElementId) -> Option<T> {
        self.state.get(id)
    }

    pub fn set_state<T: ComponentValue>(&mut self, id: ElementId, value: T) {
        self.state.set(id, value);
    }

    pub fn element_id(&self) -> &ElementId {
        &self.element_id
    }

    /// The serialized element id at the current position, used as the
    /// `action_id` for interactive elements rendered here.
    pub fn action_id(&self) -> String {
        self.element_id.serialize()
    }

    // ---- metadata --------------------------------------------------------

    pub fn incoming_metadata(&self, key: &str) -> Option<String> {
        self.incoming_metadata.get(key).cloned()
    }

    pub fn set_metadata(&mut self, key: &str, value: &str) {
        self.outgoing_metadata.insert(key.to_owned(), value.to_owned());
    }

    // ---- mode-specific access -------------------------------------------

    /// The submitted form value for an element, if this is a takeValues
    /// traversal and the form carried the element at all.
    pub fn submitted_value(&self, block_id: &str, action_id: &str) -> Option<FormValue> {
        match &self.mode {
            Mode::TakeValues(form) => form.value(block_id, action_id).cloned(),
            Mode::Render | Mode::Invoke(_) => None,
        }
    }

    /// Consumes the invocation if an inbound action structurally matches
    /// this element id. Returns the responder plus the matched action.
    pub(crate) fn try_consume_action(
        &mut self,
        element_action_id: &str,
    ) -> Option<(Responder, InboundAction)> {
        let Mode::Invoke(invocation) = &mut self.mode else {
            return None;
        };
        if invocation.consumed() {
            return None;
        }
        let InvocationKind::Actions(actions) = invocation.kind() else {
            return None;
        };
        let matched = actions.iter().find(|action| action.matches(element_action_id)).cloned()?;
        let responder = invocation.take_responder()?;
        debug!(action_id = %matched.action_id, element = %element_action_id, "action matched");
        Some((responder, matched))
    }

    /// Consumes the invocation for a view submission handler.
    pub(crate) fn try_consume_submit(&mut self) -> Option<Responder> {
        self.try_consume_kind(|kind| matches!(kind, InvocationKind::Submit))
    }

    /// Consumes the invocation for a view-closed handler.
    pub(crate) fn try_consume_view_close(&mut self) -> Option<Responder> {
        self.try_consume_kind(|kind| matches!(kind, InvocationKind::ViewClose))
    }

    fn try_consume_kind(&mut self, matches: impl Fn(&InvocationKind) -> bool) -> Option<Responder> {
        let Mode::Invoke(invocation) = &mut self.mode else {
            return None;
        };
        if invocation.consumed() || !matches(invocation.kind()) {
            return None;
        }
        invocation.take_responder()
    }

    pub fn invocation(&self) -> Option<&Invocation> {
        match &self.mode {
            Mode::Invoke(invocation) => Some(invocation),
            Mode::Render | Mode::TakeValues(_) => None,
        }
    }

    /// Runs a matched action handler. Validation rejections are folded
    /// into the block-error map and the traversal continues; any other
    /// failure propagates out unclassified.
    pub(crate) fn run_action_handler(
        &mut self,
        handler: &ActionHandler,
        responder: Responder,
    ) -> Result<(), RenderError> {
        match handler(self, responder) {
            Ok(()) => Ok(()),
            Err(HandlerError::Validation(validation)) => {
                let fallback = self.enclosing_block_id();
                for failure in validation.failures {
                    let block_id = failure.block_id.unwrap_or_else(|| fallback.clone());
                    self.add_block_error(block_id, failure.message);
                }
                Ok(())
            }
            Err(HandlerError::Other(source)) => Err(RenderError::Handler(source)),
        }
    }

    // ---- block errors ----------------------------------------------------

    pub fn add_block_error(&mut self, block_id: impl Into<String>, message: impl Into<String>) {
        self.block_errors.insert(block_id.into(), message.into());
    }

    pub fn block_errors(&self) -> &BTreeMap<String, String> {
        &self.block_errors
    }

    pub fn has_block_errors(&self) -> bool {
        !self.block_errors.is_empty()
    }

    /// The id of the block errors at the current position belong to: the
    /// open block if any, else the most recently finished one.
    pub fn enclosing_block_id(&self) -> String {
        if let Some(open) = &self.current {
            return open.block_id().to_owned();
        }
        self.blocks
            .last()
            .and_then(Block::block_id)
            .map(str::to_owned)
            .unwrap_or_else(|| self.root_callback_id.clone().unwrap_or_default())
    }

    // ---- container lifecycle --------------------------------------------

    /// Opens a block. A block already open here is a nesting error: it is
    /// closed (keeping its content) before the new one starts.
    pub(crate) fn start_block(&mut self, block: OpenBlock) {
        if let Some(stale) = &self.current {
            error!(
                stale = stale.kind_name(),
                starting = block.kind_name(),
                "block already open; force-closing the stale one"
            );
            if self.level2 != Level2::None {
                warn!(slot = ?self.level2, "level-2 slot abandoned by a forced close");
                self.level2 = Level2::None;
            }
            self.close_block();
        }
        self.level2 = Level2::None;
        self.current = Some(block);
    }

    /// Closes the open block and appends it to the output.
    pub(crate) fn close_block(&mut self) {
        assert!(
            self.level2 == Level2::None,
            "close_block while a level-2 slot is being filled"
        );
        let Some(open) = self.current.take() else {
            error!("close_block with no open block");
            return;
        };
        match open.finish() {
            Some(block) => self.blocks.push(block),
            None => debug!("discarded a block that could not be finished"),
        }
    }

    /// Discards the open block instead of emitting it. Used when an
    /// auto-opened container turned out empty.
    pub(crate) fn drop_current_block(&mut self) {
        match self.current.take() {
            Some(open) => {
                debug!(kind = open.kind_name(), block_id = open.block_id(), "dropped empty block")
            }
            None => error!("drop_current_block with no open block"),
        }
        self.level2 = Level2::None;
    }

    /// Removes the most recently finished block from the output. Used when
    /// a repair path closed a container that turned out to be empty.
    pub(crate) fn drop_last_block(&mut self) {
        match self.blocks.pop() {
            Some(block) => debug!(
                block_id = block.block_id().unwrap_or(""),
                "dropped the last finished block"
            ),
            None => error!("drop_last_block with no finished blocks"),
        }
    }

    /// Pops the most recent finished block back open, for the "sibling
    /// arrived after its container closed" repair. Returns false (and
    /// leaves the output alone) when the last block is not reopenable.
    pub(crate) fn reopen_last_block(&mut self) -> bool {
        debug_assert!(self.current.is_none(), "reopen_last_block with a block open");
        let Some(last) = self.blocks.pop() else {
            return false;
        };
        match OpenBlock::reopen(last) {
            Ok(open) => {
                warn!(
                    block_id = open.block_id(),
                    "reopened a finished block to absorb a late sibling; fix the nesting"
                );
                self.level2 = Level2::None;
                self.current = Some(open);
                true
            }
            Err(block) => {
                self.blocks.push(block);
                false
            }
        }
    }

    pub(crate) fn has_open_block(&self) -> bool {
        self.current.is_some()
    }

    pub(crate) fn open_block_kind(&self) -> Option<&'static str> {
        self.current.as_ref().map(OpenBlock::kind_name)
    }

    /// Typed access to the open block; a mismatch is an engine bug and
    /// surfaces as an internal-inconsistency error.
    pub(crate) fn open_section(
        &mut self,
    ) -> Result<
        (&mut Option<TextObject>, &mut Vec<TextObject>, &mut Option<BlockElement>),
        RenderError,
    > {
        match &mut self.current {
            Some(OpenBlock::Section { text, fields, accessory, .. }) => {
                Ok((text, fields, accessory))
            }
            _ => Err(InconsistencyError::OpenBlockMismatch { expected: "section" }.into()),
        }
    }

    pub(crate) fn open_actions(&mut self) -> Result<&mut Vec<BlockElement>, RenderError> {
        match &mut self.current {
            Some(OpenBlock::Actions { elements, .. }) => Ok(elements),
            _ => Err(InconsistencyError::OpenBlockMismatch { expected: "actions" }.into()),
        }
    }

    pub(crate) fn open_rich_text(
        &mut self,
    ) -> Result<(&mut Vec<RichTextBlockElement>, &mut Option<OpenRichTextPart>), RenderError> {
        match &mut self.current {
            Some(OpenBlock::RichText { parts, open_part, .. }) => Ok((parts, open_part)),
            _ => Err(InconsistencyError::OpenBlockMismatch { expected: "rich_text" }.into()),
        }
    }

    /// Appends a complete top-level block directly (image, divider).
    /// Callers must have resolved any open block first.
    pub(crate) fn emit_block(&mut self, block: Block) {
        debug_assert!(self.current.is_none(), "emit_block while a block is open");
        self.blocks.push(block);
    }

    pub(crate) fn emit_image_block(&mut self, block: ImageBlock) {
        self.emit_block(Block::Image(block));
    }

    // ---- finish ----------------------------------------------------------

    /// Ends the traversal for a message surface: flushes a trailing open
    /// block and returns the finished blocks.
    pub fn finish(&mut self) -> Vec<Block> {
        if self.current.is_some() {
            debug!("flushing a block left open at end of traversal");
            self.close_block();
        }
        let blocks = std::mem::take(&mut self.blocks);
        limits::check_blocks(&blocks);
        blocks
    }

    /// Ends the traversal for a view surface: assembles the finished view
    /// and applies the consistency fixups (auto submit title, metadata
    /// encoding with the capacity guard).
    pub fn finish_view(&mut self) -> Result<WireView, RenderError> {
        let blocks = self.finish();
        let frame = self.view.take().ok_or(InconsistencyError::NoViewRendered)?;

        let kind = match self.surface {
            Surface::HomeTab => ViewKind::Home,
            Surface::Modal => ViewKind::Modal,
            Surface::Message => {
                warn!("view finished on a message surface; encoding as a modal");
                ViewKind::Modal
            }
        };

        let mut view = WireView::new(kind, frame.title);
        view.blocks = blocks;
        view.close = frame.close_title.map(TextObject::plain);
        view.submit = frame.submit_title.map(TextObject::plain);
        if view.submit.is_none() && view.has_input_block() {
            debug!("view has input blocks but no submit title; assigning the default");
            view.submit = Some(TextObject::plain("Submit"));
        }
        view.callback_id = self.root_callback_id.clone();
        view.clear_on_close = frame.clear_on_close;
        view.notify_on_close = frame.notify_on_close;
        view.private_metadata = self.encode_metadata();
        limits::check_view(&view);
        Ok(view)
    }

    /// Double-encodes the outgoing metadata map into the single
    /// `private_metadata` string. Over-capacity payloads are logged, not
    /// truncated: silent mutation would corrupt round-tripping.
    fn encode_metadata(&self) -> Option<String> {
        if self.outgoing_metadata.is_empty() {
            return None;
        }
        match serde_json::to_string(&self.outgoing_metadata) {
            Ok(encoded) => {
                if encoded.chars().count() > limits::MAX_PRIVATE_METADATA_CHARS {
                    warn!(
                        chars = encoded.chars().count(),
                        limit = limits::MAX_PRIVATE_METADATA_CHARS,
                        "private metadata exceeds platform capacity; sending anyway"
                    );
                }
                Some(encoded)
            }
            Err(source) => {
                error!(%source, "failed to encode private metadata");
                None
            }
        }
    }

    /// Decodes an inbound `private_metadata` string into the incoming
    /// metadata map. Malformed payloads are logged and ignored.
    pub fn install_metadata_string(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        match serde_json::from_str::<BTreeMap<String, String>>(raw) {
            Ok(map) => self.incoming_metadata = map,
            Err(source) => warn!(%source, "ignoring malformed private metadata"),
        }
    }
}

#[cfg(test)]
mod tests {
    use blocks_kit::{Block, BlockElement, ButtonElement};

    use super::{BlocksContext, Level2, Mode, OpenBlock, Surface, ViewFrame};

    fn ctx() -> BlocksContext {
        BlocksContext::new(Surface::Message)
    }

    #[test]
    fn close_appends_the_open_block() {
        let mut ctx = ctx();
        ctx.start_block(OpenBlock::actions("b.0".to_owned()));
        ctx.open_actions()
            .expect("actions open")
            .push(BlockElement::Button(ButtonElement::new("b.0.0", "Go")));
        ctx.close_block();
        assert_eq!(ctx.blocks.len(), 1);
        assert!(matches!(&ctx.blocks[0], Block::Actions { elements, .. } if elements.len() == 1));
    }

    #[test]
    fn conflicting_start_closes_the_stale_block_keeping_its_data() {
        let mut ctx = ctx();
        ctx.start_block(OpenBlock::actions("b.0".to_owned()));
        ctx.open_actions()
            .expect("actions open")
            .push(BlockElement::Button(ButtonElement::new("b.0.0", "Go")));
        ctx.start_block(OpenBlock::section("b.1".to_owned()));
        assert_eq!(ctx.blocks.len(), 1, "stale block must be appended, not dropped");
        assert!(ctx.has_open_block());
    }

    #[test]
    fn input_without_element_is_discarded_on_close() {
        let mut ctx = ctx();
        ctx.start_block(OpenBlock::Input {
            block_id: "b.0".to_owned(),
            label: "Name".to_owned(),
            element: None,
            hint: None,
            optional: false,
            dispatch_action: false,
        });
        ctx.close_block();
        assert!(ctx.blocks.is_empty());
    }

    #[test]
    fn reopen_last_block_only_accepts_sections() {
        let mut ctx = ctx();
        ctx.start_block(OpenBlock::section("s.0".to_owned()));
        ctx.open_section().expect("section open").0.replace(blocks_kit::TextObject::mrkdwn("x"));
        ctx.close_block();
        assert!(ctx.reopen_last_block());
        assert!(ctx.has_open_block());
        ctx.close_block();

        ctx.start_block(OpenBlock::header("h.0".to_owned()));
        match &mut ctx.current {
            Some(OpenBlock::Header { text, .. }) => text.push_str("Title"),
            _ => panic!("header open"),
        }
        ctx.close_block();
        assert!(!ctx.reopen_last_block());
        assert_eq!(ctx.blocks.len(), 2);
    }

    #[test]
    fn prepare_for_resets_traversal_output_but_keeps_state() {
        let mut ctx = ctx();
        ctx.set_state(crate::element_id::ElementId::new(), 7_i64);
        ctx.start_block(OpenBlock::section("s.0".to_owned()));
        ctx.open_section().expect("section").0.replace(blocks_kit::TextObject::mrkdwn("x"));
        ctx.close_block();
        ctx.prepare_for(Mode::Render);
        assert!(ctx.blocks.is_empty());
        assert_eq!(ctx.state_value::<i64>(&crate::element_id::ElementId::new()), Some(7));
    }

    #[test]
    #[should_panic(expected = "close_block while a level-2 slot")]
    fn close_with_open_level2_slot_is_an_engine_bug() {
        let mut ctx = ctx();
        ctx.start_block(OpenBlock::section("s.0".to_owned()));
        ctx.level2 = Level2::Field;
        ctx.close_block();
    }

    #[test]
    fn response_context_copies_state_only_when_preserved() {
        let mut ctx = ctx();
        let id = crate::element_id::ElementId::new();
        ctx.set_state(id.clone(), "kept".to_owned());

        let bare = ctx.make_response_context();
        assert_eq!(bare.state_value::<String>(&id), None);

        ctx.preserve_state();
        let carried = ctx.make_response_context();
        assert_eq!(carried.state_value::<String>(&id), Some("kept".to_owned()));
    }

    #[test]
    fn finish_view_assigns_default_submit_title_for_inputs() {
        let mut ctx = BlocksContext::new(Surface::Modal);
        ctx.view = Some(ViewFrame { title: "Form".to_owned(), ..ViewFrame::default() });
        ctx.start_block(OpenBlock::Input {
            block_id: "v.0".to_owned(),
            label: "Name".to_owned(),
            element: Some(BlockElement::PlainTextInput(
                blocks_kit::PlainTextInputElement::new("v.0.0"),
            )),
            hint: None,
            optional: false,
            dispatch_action: false,
        });
        ctx.close_block();
        let view = ctx.finish_view().expect("view");
        assert_eq!(view.submit.as_ref().map(|t| t.text().to_owned()), Some("Submit".to_owned()));
    }
}
