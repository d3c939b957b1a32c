//! The traversal engine.
//!
//! `BlocksContext::render` walks a [`Node`] tree in document order,
//! maintaining ElementId stack discipline around every composite, and
//! dispatches primitives to the per-kind renderers in the submodules.
//! The same walk serves all three traversal modes; mode-sensitive
//! behavior lives at the leaves.

mod containers;
mod content;
mod elements;

use tracing::debug;

use crate::context::BlocksContext;
use crate::element_id::Segment;
use crate::error::RenderError;
use crate::node::{ComponentObject, Node, Primitive};

impl BlocksContext {
    /// Renders one node, mutating the context. Fails only on propagated
    /// handler errors or internal-inconsistency checks; structural
    /// nesting problems are logged and repaired in place.
    pub fn render(&mut self, node: &Node) -> Result<(), RenderError> {
        match node {
            Node::Empty => Ok(()),
            Node::Primitive(primitive) => self.render_primitive(primitive),
            Node::Group(children) => {
                self.element_id.push_zero();
                let result = self.render_siblings(children);
                self.element_id.pop();
                result
            }
            Node::Conditional { branch, body } => {
                self.with_segment(branch.segment(), |ctx| ctx.render(body))
            }
            Node::Maybe(inner) => match inner {
                Some(body) => self.render(body),
                None => Ok(()),
            },
            Node::ForEach(items) => {
                for (segment, body) in items {
                    self.with_segment(segment.clone(), |ctx| ctx.render(body))?;
                }
                Ok(())
            }
            Node::Component(component) => self.render_component(component.as_ref()),
            Node::Environment { patch, body } => {
                self.with_environment_patch(patch, |ctx| ctx.render(body))
            }
            Node::Root { callback_id, body } => self.render_root(callback_id, body),
        }
    }

    fn render_siblings(&mut self, children: &[Node]) -> Result<(), RenderError> {
        for child in children {
            self.render(child)?;
            self.element_id.increment_last();
        }
        Ok(())
    }

    fn render_root(&mut self, callback_id: &str, body: &Node) -> Result<(), RenderError> {
        if self.root_callback_id.is_none() {
            self.root_callback_id = Some(callback_id.to_owned());
        } else {
            debug!(callback_id, "additional root encountered; keeping the first callback id");
        }
        self.with_segment(Segment::name(callback_id), |ctx| ctx.render(body))
    }

    /// Resolves a stateful component: clones it, updates its declared
    /// dynamic properties in order under a zeroed id segment, then renders
    /// the body the resolved copy produces.
    fn render_component(&mut self, component: &dyn ComponentObject) -> Result<(), RenderError> {
        let mut instance = component.boxed_clone();

        self.element_id.push_zero();
        let mut resolved: Result<(), RenderError> = Ok(());
        for property in instance.properties() {
            let id = self.element_id.clone();
            if let Err(error) = property.update(id, self) {
                resolved = Err(error);
                break;
            }
            self.element_id.increment_last();
        }
        self.element_id.pop();
        resolved?;

        let body = instance.body();
        self.render(&body)
    }

    pub(crate) fn render_primitive(&mut self, primitive: &Primitive) -> Result<(), RenderError> {
        match primitive {
            Primitive::Text(text) => self.render_text(text),
            Primitive::Markdown(markdown) => self.render_markdown(markdown),
            Primitive::Link(link) => self.render_link(link),
            Primitive::Image(image) => self.render_image(image),
            Primitive::Button(button) => self.render_button(button),
            Primitive::Submit(submit) => self.render_submit(submit),
            Primitive::Picker(picker) => self.render_picker(picker),
            Primitive::Choice(choice) => self.render_choice(choice),
            Primitive::DatePicker(picker) => self.render_datepicker(picker),
            Primitive::TimePicker(picker) => self.render_timepicker(picker),
            Primitive::TextField(field) => self.render_textfield(field),
            Primitive::Checkbox(checkbox) => self.render_checkbox(checkbox),
            Primitive::CheckboxGroup(group) => self.render_checkbox_group(group),
            Primitive::Divider => self.render_divider(),
            Primitive::Section(section) => self.render_section(section),
            Primitive::Field(field) => self.render_field(field),
            Primitive::Accessory(accessory) => self.render_accessory(accessory),
            Primitive::Actions(actions) => self.render_actions(actions),
            Primitive::Context(context) => self.render_context_block(context),
            Primitive::Header(header) => self.render_header(header),
            Primitive::Input(input) => self.render_input(input),
            Primitive::RichText(rich_text) => self.render_rich_text(rich_text),
            Primitive::Paragraph(paragraph) => self.render_paragraph(paragraph),
            Primitive::Quote(quote) => self.render_quote(quote),
            Primitive::Preformatted(preformatted) => self.render_preformatted(preformatted),
            Primitive::View(view) => self.render_view(view),
        }
    }
}
