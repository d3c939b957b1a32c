//! The component tree.
//!
//! Every node is either a *primitive* (renders itself into the context)
//! or a *composite* (decomposes into further nodes). Composites carry the
//! control flow: fixed sequences, conditionals, optionals, data
//! iteration, environment scoping, and the type-erased stateful
//! component wrapper. Nodes are immutable values; all mutable state lives
//! in the context, addressed by [`ElementId`](crate::element_id::ElementId).

use std::sync::Arc;

use crate::context::BlocksContext;
use crate::element_id::Segment;
use crate::environment::{EnvironmentKey, EnvironmentValues};
use crate::error::HandlerError;
use crate::primitives;
use crate::respond::Responder;
use crate::state::DynamicProperty;

/// An application action handler. Receives the context for state access
/// and a [`Responder`] it may complete now or move into async work.
pub type ActionHandler =
    Arc<dyn Fn(&mut BlocksContext, Responder) -> Result<(), HandlerError> + Send + Sync>;

pub type EnvironmentPatch = Arc<dyn Fn(&mut EnvironmentValues) + Send + Sync>;

/// A user-defined stateful component: declares its bindable slots in a
/// fixed order and decomposes into a body once they are resolved.
pub trait Component: Clone + Send + Sync + 'static {
    /// Ordered bindable slots. Declaration order fixes ElementId
    /// assignment, so reordering breaks round-tripping of live state.
    fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
        Vec::new()
    }

    fn body(&self) -> Node;
}

/// Object-safe erasure of [`Component`]; what `Node::Component` stores.
pub trait ComponentObject: Send + Sync {
    fn properties(&mut self) -> Vec<&mut dyn DynamicProperty>;
    fn body(&self) -> Node;
    fn boxed_clone(&self) -> Box<dyn ComponentObject>;
    fn type_name(&self) -> &'static str;
}

impl<C: Component> ComponentObject for C {
    fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
        Component::properties(self)
    }

    fn body(&self) -> Node {
        Component::body(self)
    }

    fn boxed_clone(&self) -> Box<dyn ComponentObject> {
        Box::new(self.clone())
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }
}

/// Which arm of a conditional a subtree sits on. Tagging the ElementId
/// per branch keeps then/else local state from colliding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    Then,
    Else,
}

impl Branch {
    pub(crate) fn segment(self) -> Segment {
        match self {
            Self::Then => Segment::name("then"),
            Self::Else => Segment::name("else"),
        }
    }
}

#[derive(Clone)]
pub enum Node {
    Empty,
    Primitive(Primitive),
    /// Fixed sequence; children share one zero-based sibling counter.
    Group(Vec<Node>),
    Conditional {
        branch: Branch,
        body: Box<Node>,
    },
    Maybe(Option<Box<Node>>),
    /// Iteration over data. Each element carries its data-provided
    /// identifier, not its position, so reordered input keeps its state.
    ForEach(Vec<(Segment, Node)>),
    Component(Arc<dyn ComponentObject>),
    Environment {
        patch: EnvironmentPatch,
        body: Box<Node>,
    },
    /// A registered root. Establishes the traversal's callback id and the
    /// leading ElementId segment.
    Root {
        callback_id: String,
        body: Box<Node>,
    },
}

impl Node {
    pub fn group(children: Vec<Node>) -> Self {
        Self::Group(children)
    }

    /// Conditional without an else arm.
    pub fn when(condition: bool, body: impl FnOnce() -> Node) -> Self {
        if condition {
            Self::Conditional { branch: Branch::Then, body: Box::new(body()) }
        } else {
            Self::Empty
        }
    }

    pub fn when_else(
        condition: bool,
        then_body: impl FnOnce() -> Node,
        else_body: impl FnOnce() -> Node,
    ) -> Self {
        if condition {
            Self::Conditional { branch: Branch::Then, body: Box::new(then_body()) }
        } else {
            Self::Conditional { branch: Branch::Else, body: Box::new(else_body()) }
        }
    }

    pub fn maybe(node: Option<Node>) -> Self {
        Self::Maybe(node.map(Box::new))
    }

    /// Iterates `items`, deriving each element's identity from the data
    /// itself via `id`.
    pub fn for_each<T, I, S, F>(items: I, id: impl Fn(&T) -> S, body: F) -> Self
    where
        I: IntoIterator<Item = T>,
        S: Into<Segment>,
        F: Fn(&T) -> Node,
    {
        Self::ForEach(
            items.into_iter().map(|item| (id(&item).into(), body(&item))).collect(),
        )
    }

    pub fn component(component: impl Component) -> Self {
        Self::Component(Arc::new(component))
    }

    /// Installs `value` for key `K` over the subtree.
    pub fn environment<K: EnvironmentKey>(value: K::Value, body: impl Into<Node>) -> Self {
        let patch: EnvironmentPatch = Arc::new(move |environment| {
            environment.set::<K>(value.clone());
        });
        Self::Environment { patch, body: Box::new(body.into()) }
    }

    pub fn root(callback_id: impl Into<String>, body: impl Into<Node>) -> Self {
        Self::Root { callback_id: callback_id.into(), body: Box::new(body.into()) }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty | Self::Maybe(None) => true,
            Self::Group(children) => children.iter().all(Node::is_empty),
            Self::ForEach(items) => items.is_empty(),
            _ => false,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Primitive(primitive) => primitive.kind_name(),
            Self::Group(_) => "Group",
            Self::Conditional { .. } => "Conditional",
            Self::Maybe(_) => "Maybe",
            Self::ForEach(_) => "ForEach",
            Self::Component(_) => "Component",
            Self::Environment { .. } => "Environment",
            Self::Root { .. } => "Root",
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group(children) => f.debug_tuple("Group").field(&children.len()).finish(),
            Self::ForEach(items) => f.debug_tuple("ForEach").field(&items.len()).finish(),
            Self::Component(component) => {
                f.debug_tuple("Component").field(&component.type_name()).finish()
            }
            Self::Root { callback_id, .. } => {
                f.debug_tuple("Root").field(callback_id).finish()
            }
            other => f.write_str(other.kind_name()),
        }
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Self::Group(children)
    }
}

#[derive(Clone)]
pub enum Primitive {
    Text(primitives::Text),
    Markdown(primitives::Markdown),
    Link(primitives::Link),
    Image(primitives::Image),
    Button(primitives::Button),
    Submit(primitives::Submit),
    Picker(primitives::Picker),
    Choice(primitives::Choice),
    DatePicker(primitives::DatePicker),
    TimePicker(primitives::TimePicker),
    TextField(primitives::TextField),
    Checkbox(primitives::Checkbox),
    CheckboxGroup(primitives::CheckboxGroup),
    Divider,
    Section(primitives::Section),
    Field(primitives::Field),
    Accessory(primitives::Accessory),
    Actions(primitives::Actions),
    Context(primitives::Context),
    Header(primitives::Header),
    Input(primitives::Input),
    RichText(primitives::RichText),
    Paragraph(primitives::Paragraph),
    Quote(primitives::Quote),
    Preformatted(primitives::Preformatted),
    View(primitives::View),
}

impl Primitive {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "Text",
            Self::Markdown(_) => "Markdown",
            Self::Link(_) => "Link",
            Self::Image(_) => "Image",
            Self::Button(_) => "Button",
            Self::Submit(_) => "Submit",
            Self::Picker(_) => "Picker",
            Self::Choice(_) => "Choice",
            Self::DatePicker(_) => "DatePicker",
            Self::TimePicker(_) => "TimePicker",
            Self::TextField(_) => "TextField",
            Self::Checkbox(_) => "Checkbox",
            Self::CheckboxGroup(_) => "CheckboxGroup",
            Self::Divider => "Divider",
            Self::Section(_) => "Section",
            Self::Field(_) => "Field",
            Self::Accessory(_) => "Accessory",
            Self::Actions(_) => "Actions",
            Self::Context(_) => "Context",
            Self::Header(_) => "Header",
            Self::Input(_) => "Input",
            Self::RichText(_) => "RichText",
            Self::Paragraph(_) => "Paragraph",
            Self::Quote(_) => "Quote",
            Self::Preformatted(_) => "Preformatted",
            Self::View(_) => "View",
        }
    }
}

impl std::fmt::Debug for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind_name())
    }
}

macro_rules! into_node {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::Primitive(Primitive::$variant(value))
                }
            }
        )+
    };
}

into_node!(
    Text => primitives::Text,
    Markdown => primitives::Markdown,
    Link => primitives::Link,
    Image => primitives::Image,
    Button => primitives::Button,
    Submit => primitives::Submit,
    Picker => primitives::Picker,
    Choice => primitives::Choice,
    DatePicker => primitives::DatePicker,
    TimePicker => primitives::TimePicker,
    TextField => primitives::TextField,
    Checkbox => primitives::Checkbox,
    CheckboxGroup => primitives::CheckboxGroup,
    Section => primitives::Section,
    Field => primitives::Field,
    Accessory => primitives::Accessory,
    Actions => primitives::Actions,
    Context => primitives::Context,
    Header => primitives::Header,
    Input => primitives::Input,
    RichText => primitives::RichText,
    Paragraph => primitives::Paragraph,
    Quote => primitives::Quote,
    Preformatted => primitives::Preformatted,
    View => primitives::View,
);

impl From<Primitive> for Node {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

impl From<primitives::Divider> for Node {
    fn from(_: primitives::Divider) -> Self {
        Self::Primitive(Primitive::Divider)
    }
}

#[cfg(test)]
mod tests {
    use super::{Branch, Node};
    use crate::primitives::Text;

    #[test]
    fn when_builds_only_the_taken_branch() {
        let taken = Node::when(true, || Text::new("yes").into());
        assert!(matches!(taken, Node::Conditional { branch: Branch::Then, .. }));

        let skipped = Node::when(false, || unreachable!("must not build the untaken branch"));
        assert!(matches!(skipped, Node::Empty));
    }

    #[test]
    fn for_each_keeps_data_identifiers() {
        let node = Node::for_each(
            vec![("b", 2), ("a", 1)],
            |(key, _)| *key,
            |(_, n)| Text::new(n.to_string()).into(),
        );
        let Node::ForEach(items) = node else { panic!("ForEach expected") };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, crate::element_id::Segment::name("b"));
    }

    #[test]
    fn group_emptiness_is_recursive() {
        assert!(Node::group(vec![Node::Empty, Node::maybe(None)]).is_empty());
        assert!(!Node::group(vec![Text::new("x").into()]).is_empty());
    }
}
