//! The primitive component kinds: content leaves, interactive elements,
//! and the top-level containers. Each knows how to render itself into
//! whichever container is currently open (see the `render` module); the
//! structs here are plain immutable descriptions built by application
//! code.

use std::collections::BTreeSet;
use std::sync::Arc;

use blocks_kit::{ButtonStyle, ConfirmationDialog, RichTextStyle};
use chrono::{NaiveDate, NaiveTime};

use crate::context::BlocksContext;
use crate::node::{ActionHandler, Node};
use crate::selection::Tag;
use crate::state::Binding;

#[derive(Clone, Debug)]
pub struct Text {
    pub content: String,
    pub style: RichTextStyle,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), style: RichTextStyle::default() }
    }

    pub fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.style.italic = true;
        self
    }

    pub fn strike(mut self) -> Self {
        self.style.strike = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.style.code = true;
        self
    }
}

/// Raw Slack mrkdwn, passed through untouched.
#[derive(Clone, Debug)]
pub struct Markdown {
    pub content: String,
}

impl Markdown {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub text: String,
    pub url: String,
    pub style: RichTextStyle,
}

impl Link {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { text: text.into(), url: url.into(), style: RichTextStyle::default() }
    }
}

#[derive(Clone, Debug)]
pub struct Image {
    pub url: String,
    pub alt: String,
    pub title: Option<String>,
}

impl Image {
    pub fn new(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self { url: url.into(), alt: alt.into(), title: None }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Clone)]
pub struct Button {
    pub label: String,
    pub content: Option<Box<Node>>,
    pub value: Option<String>,
    pub style: Option<ButtonStyle>,
    pub url: Option<String>,
    pub confirm: Option<ConfirmationDialog>,
    pub action: Option<ActionHandler>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: None,
            value: None,
            style: None,
            url: None,
            confirm: None,
            action: None,
        }
    }

    /// A button whose label is assembled from child content nodes.
    pub fn with_content(content: impl Into<Node>) -> Self {
        let mut button = Self::new("");
        button.content = Some(Box::new(content.into()));
        button
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn confirm(mut self, confirm: ConfirmationDialog) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn on_action(mut self, handler: impl IntoActionHandler) -> Self {
        self.action = Some(handler.into_action_handler());
        self
    }
}

/// Sets the view's submit title; on a message surface it renders as a
/// primary button instead. Its handler runs for `invoke(Submit)` turns.
#[derive(Clone)]
pub struct Submit {
    pub title: String,
    pub action: Option<ActionHandler>,
}

impl Submit {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), action: None }
    }

    pub fn on_submit(mut self, handler: impl IntoActionHandler) -> Self {
        self.action = Some(handler.into_action_handler());
        self
    }
}

/// How a picker/checkbox group is bound to application state.
#[derive(Clone, Debug)]
pub enum SelectionBinding {
    /// Render-only; selections are not persisted.
    Unbound,
    Single(Binding<Option<Tag>>),
    Multi(Binding<BTreeSet<Tag>>),
}

impl SelectionBinding {
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// The currently-selected tags, read through the context.
    pub fn load(&self, ctx: &BlocksContext) -> BTreeSet<Tag> {
        match self {
            Self::Unbound => BTreeSet::new(),
            Self::Single(binding) => {
                binding.resolve(ctx).flatten().into_iter().collect()
            }
            Self::Multi(binding) => binding.resolve(ctx).unwrap_or_default(),
        }
    }

    /// Writes a freshly accumulated selection back, exactly once per
    /// takeValues traversal.
    pub fn store(&self, ctx: &mut BlocksContext, tags: BTreeSet<Tag>) {
        match self {
            Self::Unbound => {}
            Self::Single(binding) => binding.write(ctx, tags.into_iter().next()),
            Self::Multi(binding) => binding.write(ctx, tags),
        }
    }
}

#[derive(Clone)]
pub struct Picker {
    pub label: String,
    pub placeholder: Option<String>,
    pub selection: SelectionBinding,
    pub max_selected: Option<u32>,
    pub content: Box<Node>,
    pub action: Option<ActionHandler>,
}

impl Picker {
    pub fn new(label: impl Into<String>, content: impl Into<Node>) -> Self {
        Self {
            label: label.into(),
            placeholder: None,
            selection: SelectionBinding::Unbound,
            max_selected: None,
            content: Box::new(content.into()),
            action: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn selection(mut self, binding: Binding<Option<Tag>>) -> Self {
        self.selection = SelectionBinding::Single(binding);
        self
    }

    pub fn multi_selection(mut self, binding: Binding<BTreeSet<Tag>>) -> Self {
        self.selection = SelectionBinding::Multi(binding);
        self
    }

    pub fn max_selected(mut self, limit: u32) -> Self {
        self.max_selected = Some(limit);
        self
    }

    pub fn on_action(mut self, handler: impl IntoActionHandler) -> Self {
        self.action = Some(handler.into_action_handler());
        self
    }
}

/// One selectable option inside a `Picker`.
#[derive(Clone, Debug)]
pub struct Choice {
    pub label: String,
    pub tag: Option<Tag>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), tag: None, description: None, url: None }
    }

    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(Clone)]
pub struct DatePicker {
    pub label: String,
    pub placeholder: Option<String>,
    pub binding: Binding<Option<NaiveDate>>,
    pub action: Option<ActionHandler>,
}

impl DatePicker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            placeholder: None,
            binding: Binding::detached(),
            action: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn binding(mut self, binding: Binding<Option<NaiveDate>>) -> Self {
        self.binding = binding;
        self
    }

    pub fn on_action(mut self, handler: impl IntoActionHandler) -> Self {
        self.action = Some(handler.into_action_handler());
        self
    }
}

#[derive(Clone)]
pub struct TimePicker {
    pub label: String,
    pub placeholder: Option<String>,
    pub binding: Binding<Option<NaiveTime>>,
    pub action: Option<ActionHandler>,
}

impl TimePicker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            placeholder: None,
            binding: Binding::detached(),
            action: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn binding(mut self, binding: Binding<Option<NaiveTime>>) -> Self {
        self.binding = binding;
        self
    }

    pub fn on_action(mut self, handler: impl IntoActionHandler) -> Self {
        self.action = Some(handler.into_action_handler());
        self
    }
}

type TextFieldRead = Arc<dyn Fn(&BlocksContext) -> Option<String> + Send + Sync>;
type TextFieldWrite = Arc<dyn Fn(&mut BlocksContext, &str) -> Result<(), String> + Send + Sync>;

/// The value side of a text field: either a plain string binding or a
/// formatter pair that parses on the way in and formats on the way out.
#[derive(Clone)]
pub enum TextFieldBinding {
    Plain(Binding<String>),
    Formatted { read: TextFieldRead, write: TextFieldWrite },
}

#[derive(Clone)]
pub struct TextField {
    pub label: String,
    pub binding: TextFieldBinding,
    pub placeholder: Option<String>,
    pub hint: Option<String>,
    pub multiline: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub optional: bool,
}

impl TextField {
    pub fn new(label: impl Into<String>, binding: Binding<String>) -> Self {
        Self {
            label: label.into(),
            binding: TextFieldBinding::Plain(binding),
            placeholder: None,
            hint: None,
            multiline: false,
            min_length: None,
            max_length: None,
            optional: false,
        }
    }

    /// A text field bound through a parse/format pair. A failed parse on
    /// takeValues registers `message` against the enclosing block.
    pub fn formatted<T>(
        label: impl Into<String>,
        binding: Binding<T>,
        message: impl Into<String>,
    ) -> Self
    where
        T: std::str::FromStr + std::fmt::Display + Clone + Send + Sync + 'static,
    {
        let message = message.into();
        let read_binding = binding.clone();
        let read: TextFieldRead =
            Arc::new(move |ctx| read_binding.resolve(ctx).map(|value| value.to_string()));
        let write: TextFieldWrite = Arc::new(move |ctx, raw| match raw.trim().parse::<T>() {
            Ok(value) => {
                binding.write(ctx, value);
                Ok(())
            }
            Err(_) => Err(message.clone()),
        });
        Self {
            label: label.into(),
            binding: TextFieldBinding::Formatted { read, write },
            placeholder: None,
            hint: None,
            multiline: false,
            min_length: None,
            max_length: None,
            optional: false,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// One checkbox row. Participates in the enclosing group's selection via
/// its tag, like a `Choice` with a description line.
#[derive(Clone, Debug)]
pub struct Checkbox {
    pub label: String,
    pub description: Option<String>,
    pub tag: Option<Tag>,
}

impl Checkbox {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), description: None, tag: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

#[derive(Clone)]
pub struct CheckboxGroup {
    pub label: String,
    pub selection: SelectionBinding,
    pub content: Box<Node>,
    pub action: Option<ActionHandler>,
}

impl CheckboxGroup {
    pub fn new(label: impl Into<String>, content: impl Into<Node>) -> Self {
        Self {
            label: label.into(),
            selection: SelectionBinding::Unbound,
            content: Box::new(content.into()),
            action: None,
        }
    }

    pub fn selection(mut self, binding: Binding<BTreeSet<Tag>>) -> Self {
        self.selection = SelectionBinding::Multi(binding);
        self
    }

    pub fn on_action(mut self, handler: impl IntoActionHandler) -> Self {
        self.action = Some(handler.into_action_handler());
        self
    }
}

/// A horizontal rule between blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct Divider;

#[derive(Clone)]
pub struct Section {
    pub content: Box<Node>,
}

impl Section {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

/// A side-by-side column entry of a `Section`.
#[derive(Clone)]
pub struct Field {
    pub content: Box<Node>,
}

impl Field {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

/// Marks its content for the accessory slot of the enclosing `Section`.
#[derive(Clone)]
pub struct Accessory {
    pub content: Box<Node>,
}

impl Accessory {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct Actions {
    pub content: Box<Node>,
}

impl Actions {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct Context {
    pub content: Box<Node>,
}

impl Context {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct Header {
    pub content: Box<Node>,
}

impl Header {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct Input {
    pub label: String,
    pub content: Box<Node>,
    pub hint: Option<String>,
    pub optional: bool,
    pub dispatch_action: bool,
}

impl Input {
    pub fn new(label: impl Into<String>, content: impl Into<Node>) -> Self {
        Self {
            label: label.into(),
            content: Box::new(content.into()),
            hint: None,
            optional: false,
            dispatch_action: false,
        }
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn dispatch_action(mut self) -> Self {
        self.dispatch_action = true;
        self
    }
}

#[derive(Clone)]
pub struct RichText {
    pub content: Box<Node>,
}

impl RichText {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct Paragraph {
    pub content: Box<Node>,
}

impl Paragraph {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct Quote {
    pub content: Box<Node>,
}

impl Quote {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct Preformatted {
    pub content: Box<Node>,
}

impl Preformatted {
    pub fn new(content: impl Into<Node>) -> Self {
        Self { content: Box::new(content.into()) }
    }
}

#[derive(Clone)]
pub struct View {
    pub title: String,
    pub submit_title: Option<String>,
    pub close_title: Option<String>,
    pub clear_on_close: bool,
    pub notify_on_close: bool,
    pub on_submit: Option<ActionHandler>,
    pub on_close: Option<ActionHandler>,
    pub content: Box<Node>,
}

impl View {
    pub fn new(title: impl Into<String>, content: impl Into<Node>) -> Self {
        Self {
            title: title.into(),
            submit_title: None,
            close_title: None,
            clear_on_close: false,
            notify_on_close: false,
            on_submit: None,
            on_close: None,
            content: Box::new(content.into()),
        }
    }

    pub fn submit_title(mut self, title: impl Into<String>) -> Self {
        self.submit_title = Some(title.into());
        self
    }

    pub fn close_title(mut self, title: impl Into<String>) -> Self {
        self.close_title = Some(title.into());
        self
    }

    pub fn clear_on_close(mut self) -> Self {
        self.clear_on_close = true;
        self
    }

    pub fn notify_on_close(mut self) -> Self {
        self.notify_on_close = true;
        self
    }

    pub fn on_submit(mut self, handler: impl IntoActionHandler) -> Self {
        self.on_submit = Some(handler.into_action_handler());
        self
    }

    pub fn on_close(mut self, handler: impl IntoActionHandler) -> Self {
        self.on_close = Some(handler.into_action_handler());
        self
    }
}

/// Accepts plain closures as action handlers.
pub trait IntoActionHandler {
    fn into_action_handler(self) -> ActionHandler;
}

impl<F> IntoActionHandler for F
where
    F: Fn(&mut BlocksContext, crate::respond::Responder) -> Result<(), crate::error::HandlerError>
        + Send
        + Sync
        + 'static,
{
    fn into_action_handler(self) -> ActionHandler {
        Arc::new(self)
    }
}

impl IntoActionHandler for ActionHandler {
    fn into_action_handler(self) -> ActionHandler {
        self
    }
}
