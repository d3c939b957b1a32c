//! Renderers for interactive elements: placement dispatch, the
//! auto-promotion matrix, invocation matching, and form-value intake.

use std::collections::BTreeSet;

use blocks_kit::{
    BlockElement, ButtonElement, ButtonStyle, CheckboxesElement, DatePickerElement, OptionObject,
    PlainTextInputElement, SelectElement, TextObject, TimePickerElement,
};
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::context::{BlocksContext, Level2, Mode, OpenBlock, Surface};
use crate::error::{InconsistencyError, RenderError};
use crate::form::FormValue;
use crate::node::Node;
use crate::primitives::{self, SelectionBinding, TextFieldBinding};
use crate::selection::{SelectionState, Tag};

/// Where an interactive element can go from the current nesting.
enum Site {
    /// Inside text or option content; warned and skipped.
    Skip,
    /// A stale block was closed; render the element again.
    Retry,
    /// No container is open; synthesize the wrapper and re-render.
    Promote,
    /// A compatible slot is available.
    Ready,
}

impl BlocksContext {
    fn interactive_site(&mut self, kind: &'static str) -> Site {
        if self.text_sink.is_some()
            || matches!(
                self.level2,
                Level2::Field | Level2::Button | Level2::Generic | Level2::Picker
            )
        {
            warn!(kind, "interactive element inside text or option content; skipped");
            return Site::Skip;
        }
        if self.level2 == Level2::Accessory {
            // render_accessory guarantees an open section here.
            return Site::Ready;
        }
        match &self.current {
            None => Site::Promote,
            Some(OpenBlock::Actions { .. }) | Some(OpenBlock::Input { .. }) => Site::Ready,
            Some(OpenBlock::Section { accessory, .. }) => {
                if accessory.is_none() {
                    Site::Ready
                } else {
                    warn!(kind, "section accessory already filled; closing the section");
                    self.close_block();
                    Site::Retry
                }
            }
            Some(other) => {
                warn!(
                    kind,
                    open = other.kind_name(),
                    "interactive element inside an incompatible block; closing it"
                );
                self.close_block();
                Site::Retry
            }
        }
    }

    /// Synthesizes the container an orphaned interactive element belongs
    /// in (`Input` on modal surfaces or when the element demands one,
    /// `Actions` otherwise) and renders it. The wrapper adds no id
    /// segments, so the element keeps its ElementId.
    fn promote_interactive(
        &mut self,
        origin: Node,
        label: String,
        hint: Option<String>,
        optional: bool,
        require_input: bool,
    ) -> Result<(), RenderError> {
        let wrapped: Node = if require_input || self.surface == Surface::Modal {
            let mut input = primitives::Input::new(label, origin);
            input.hint = hint;
            input.optional = optional;
            input.into()
        } else {
            primitives::Actions::new(origin).into()
        };
        self.render(&wrapped)
    }

    /// Places a finished element into the slot the site check approved.
    /// Anything else here is an engine bug, not a tree-shape problem.
    pub(crate) fn place_built_element(&mut self, element: BlockElement) -> Result<(), RenderError> {
        if self.level2 == Level2::Accessory {
            let (_, _, accessory) = self.open_section()?;
            if accessory.is_some() {
                warn!("section accessory already filled; element dropped");
            } else {
                *accessory = Some(element);
            }
            return Ok(());
        }
        match &mut self.current {
            Some(OpenBlock::Actions { elements, .. }) => {
                elements.push(element);
                Ok(())
            }
            Some(OpenBlock::Input { element: slot, block_id, .. }) => {
                if slot.is_some() {
                    warn!(%block_id, "input already carries an element; duplicate dropped");
                } else {
                    *slot = Some(element);
                }
                Ok(())
            }
            Some(OpenBlock::Section { accessory, .. }) => {
                if accessory.is_some() {
                    warn!("section accessory already filled; element dropped");
                } else {
                    debug!("interactive element inside a section placed as its accessory");
                    *accessory = Some(element);
                }
                Ok(())
            }
            _ => Err(InconsistencyError::OpenBlockMismatch {
                expected: "actions, input or section",
            }
            .into()),
        }
    }

    fn open_block_id(&self) -> String {
        self.current.as_ref().map(|open| open.block_id().to_owned()).unwrap_or_default()
    }

    /// Runs this element's handler if the invocation matches its id.
    fn dispatch_element_action(
        &mut self,
        action_id: &str,
        handler: &Option<crate::node::ActionHandler>,
    ) -> Result<(), RenderError> {
        if let Some(handler) = handler {
            if let Some((responder, _matched)) = self.try_consume_action(action_id) {
                let handler = handler.clone();
                self.run_action_handler(&handler, responder)?;
            }
        }
        Ok(())
    }

    pub(crate) fn render_button(&mut self, button: &primitives::Button) -> Result<(), RenderError> {
        match self.interactive_site("button") {
            Site::Skip => return Ok(()),
            Site::Retry => return self.render_button(button),
            Site::Promote => {
                return self.promote_interactive(
                    button.clone().into(),
                    button.label.clone(),
                    None,
                    false,
                    false,
                );
            }
            Site::Ready => {}
        }

        let action_id = self.action_id();
        self.dispatch_element_action(&action_id, &button.action)?;

        let label = match &button.content {
            Some(content) => self.collect_button_label(content)?,
            None => button.label.clone(),
        };

        let mut element = ButtonElement::new(action_id, label);
        element.style = button.style.clone();
        element.value = button.value.clone();
        element.url = button.url.clone();
        element.confirm = button.confirm.clone();
        self.place_built_element(BlockElement::Button(element))
    }

    fn collect_button_label(&mut self, content: &Node) -> Result<String, RenderError> {
        let saved_level2 = std::mem::replace(&mut self.level2, Level2::Button);
        let previous_sink = self.text_sink.replace(String::new());
        let result = self.render(content);
        let collected = std::mem::replace(&mut self.text_sink, previous_sink).unwrap_or_default();
        self.level2 = saved_level2;
        result?;
        Ok(collected)
    }

    pub(crate) fn render_submit(&mut self, submit: &primitives::Submit) -> Result<(), RenderError> {
        if !self.surface.is_view() {
            // On a message surface the submit control is an ordinary
            // primary button; actions reach it through its element id.
            let mut button =
                primitives::Button::new(submit.title.clone()).style(ButtonStyle::Primary);
            button.action = submit.action.clone();
            return self.render_button(&button);
        }

        match &mut self.view {
            Some(frame) => {
                if frame.submit_title.is_none() {
                    frame.submit_title = Some(submit.title.clone());
                } else {
                    debug!("view submit title already set; keeping the first one");
                }
            }
            None => warn!("submit control outside a view; title dropped"),
        }

        if let Some(handler) = &submit.action {
            if let Some(responder) = self.try_consume_submit() {
                let handler = handler.clone();
                self.run_action_handler(&handler, responder)?;
            }
        }
        Ok(())
    }

    // ---- pickers and checkbox groups ------------------------------------

    /// Builds the selection bridge for this traversal's mode. A takeValues
    /// walk only applies values when the form actually carried this
    /// element; otherwise the bound selection is left untouched.
    fn selection_bridge_for(
        &self,
        binding: &SelectionBinding,
        block_id: &str,
        action_id: &str,
    ) -> SelectionState {
        match &self.mode {
            Mode::Render => SelectionState::for_render(binding.load(self)),
            Mode::TakeValues(_) => match self.submitted_value(block_id, action_id) {
                Some(value) => SelectionState::for_take_values(
                    value.selected().iter().cloned().collect(),
                ),
                None => SelectionState::inert(),
            },
            Mode::Invoke(_) => SelectionState::inert(),
        }
    }

    /// Renders the option subtree under an installed bridge, then returns
    /// (options, initial options, matched tags, whether to write back).
    #[allow(clippy::type_complexity)]
    fn with_selection_bridge(
        &mut self,
        bridge: SelectionState,
        content: &Node,
    ) -> Result<(Vec<OptionObject>, Vec<OptionObject>, BTreeSet<Tag>, bool), RenderError> {
        let saved_level2 = std::mem::replace(&mut self.level2, Level2::Picker);
        let previous = self.selection.replace(bridge);
        let result = self.render(content);
        let bridge = std::mem::replace(&mut self.selection, previous)
            .expect("selection bridge installed above");
        self.level2 = saved_level2;
        result?;

        let applied = bridge.applies_values();
        let (options, initial, matched) = bridge.into_parts();
        Ok((options, initial, matched, applied))
    }

    pub(crate) fn render_picker(&mut self, picker: &primitives::Picker) -> Result<(), RenderError> {
        match self.interactive_site("picker") {
            Site::Skip => return Ok(()),
            Site::Retry => return self.render_picker(picker),
            Site::Promote => {
                return self.promote_interactive(
                    picker.clone().into(),
                    picker.label.clone(),
                    None,
                    false,
                    false,
                );
            }
            Site::Ready => {}
        }

        let action_id = self.action_id();
        self.dispatch_element_action(&action_id, &picker.action)?;

        let block_id = self.open_block_id();
        let bridge = self.selection_bridge_for(&picker.selection, &block_id, &action_id);
        let (options, initial, matched, applied) =
            self.with_selection_bridge(bridge, &picker.content)?;
        if applied {
            picker.selection.store(self, matched);
        }

        let mut element = SelectElement::new(action_id, picker.selection.is_multi());
        element.placeholder = picker.placeholder.clone().map(TextObject::plain);
        element.options = options;
        if element.multi {
            element.initial_options = initial;
        } else {
            element.initial_option = initial.into_iter().next();
        }
        element.max_selected_items = picker.max_selected;
        self.place_built_element(BlockElement::select(element))
    }

    pub(crate) fn render_checkbox_group(
        &mut self,
        group: &primitives::CheckboxGroup,
    ) -> Result<(), RenderError> {
        match self.interactive_site("checkbox group") {
            Site::Skip => return Ok(()),
            Site::Retry => return self.render_checkbox_group(group),
            Site::Promote => {
                return self.promote_interactive(
                    group.clone().into(),
                    group.label.clone(),
                    None,
                    false,
                    false,
                );
            }
            Site::Ready => {}
        }

        let action_id = self.action_id();
        self.dispatch_element_action(&action_id, &group.action)?;

        let block_id = self.open_block_id();
        let bridge = self.selection_bridge_for(&group.selection, &block_id, &action_id);
        let (options, initial, matched, applied) =
            self.with_selection_bridge(bridge, &group.content)?;
        if applied {
            group.selection.store(self, matched);
        }

        let mut element = CheckboxesElement::new(action_id);
        element.options = options;
        element.initial_options = initial;
        self.place_built_element(BlockElement::Checkboxes(element))
    }

    pub(crate) fn render_choice(&mut self, choice: &primitives::Choice) -> Result<(), RenderError> {
        if self.selection.is_none() {
            warn!("option outside a picker; ignored");
            return Ok(());
        }
        let element_id = self.element_id.clone();
        let bridge = self.selection.as_mut().expect("selection bridge checked above");
        bridge.set_pending_tag(choice.tag.clone());
        let value = bridge.client_value(choice.url.as_deref(), &element_id);

        let mut option = OptionObject::new(choice.label.clone(), value);
        option.description = choice.description.clone().map(TextObject::plain);
        option.url = choice.url.clone();
        bridge.note_option(option);
        Ok(())
    }

    pub(crate) fn render_checkbox(
        &mut self,
        checkbox: &primitives::Checkbox,
    ) -> Result<(), RenderError> {
        let Some(bridge) = self.selection.as_mut() else {
            warn!("checkbox outside a checkbox group; wrapping it in one");
            let group = primitives::CheckboxGroup::new(
                checkbox.label.clone(),
                Node::from(checkbox.clone()),
            );
            return self.render_checkbox_group(&group);
        };
        let element_id = self.element_id.clone();
        bridge.set_pending_tag(checkbox.tag.clone());
        let value = bridge.client_value(None, &element_id);

        let mut option = OptionObject::new(checkbox.label.clone(), value);
        option.description = checkbox.description.clone().map(TextObject::plain);
        bridge.note_option(option);
        Ok(())
    }

    // ---- date/time pickers ----------------------------------------------

    pub(crate) fn render_datepicker(
        &mut self,
        picker: &primitives::DatePicker,
    ) -> Result<(), RenderError> {
        match self.interactive_site("date picker") {
            Site::Skip => return Ok(()),
            Site::Retry => return self.render_datepicker(picker),
            Site::Promote => {
                return self.promote_interactive(
                    picker.clone().into(),
                    picker.label.clone(),
                    None,
                    false,
                    false,
                );
            }
            Site::Ready => {}
        }

        let action_id = self.action_id();
        self.dispatch_element_action(&action_id, &picker.action)?;

        let block_id = self.open_block_id();
        if let Some(value) = self.submitted_value(&block_id, &action_id) {
            match &value {
                FormValue::Text(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                    Ok(date) => picker.binding.write(self, Some(date)),
                    Err(_) => self.add_block_error(block_id.clone(), "Please enter a valid date."),
                },
                FormValue::Empty => picker.binding.write(self, None),
                FormValue::Selected(_) => {}
            }
        }

        let initial = picker
            .binding
            .resolve(self)
            .flatten()
            .map(|date| date.format("%Y-%m-%d").to_string());
        let element = DatePickerElement {
            action_id,
            initial_date: initial,
            placeholder: picker.placeholder.clone().map(TextObject::plain),
        };
        self.place_built_element(BlockElement::Datepicker(element))
    }

    pub(crate) fn render_timepicker(
        &mut self,
        picker: &primitives::TimePicker,
    ) -> Result<(), RenderError> {
        match self.interactive_site("time picker") {
            Site::Skip => return Ok(()),
            Site::Retry => return self.render_timepicker(picker),
            Site::Promote => {
                return self.promote_interactive(
                    picker.clone().into(),
                    picker.label.clone(),
                    None,
                    false,
                    false,
                );
            }
            Site::Ready => {}
        }

        let action_id = self.action_id();
        self.dispatch_element_action(&action_id, &picker.action)?;

        let block_id = self.open_block_id();
        if let Some(value) = self.submitted_value(&block_id, &action_id) {
            match &value {
                FormValue::Text(raw) => match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
                    Ok(time) => picker.binding.write(self, Some(time)),
                    Err(_) => self.add_block_error(block_id.clone(), "Please enter a valid time."),
                },
                FormValue::Empty => picker.binding.write(self, None),
                FormValue::Selected(_) => {}
            }
        }

        let initial = picker
            .binding
            .resolve(self)
            .flatten()
            .map(|time| time.format("%H:%M").to_string());
        let element = TimePickerElement {
            action_id,
            initial_time: initial,
            placeholder: picker.placeholder.clone().map(TextObject::plain),
        };
        self.place_built_element(BlockElement::Timepicker(element))
    }

    // ---- text fields -----------------------------------------------------

    pub(crate) fn render_textfield(
        &mut self,
        field: &primitives::TextField,
    ) -> Result<(), RenderError> {
        match self.interactive_site("text field") {
            Site::Skip => return Ok(()),
            Site::Retry => return self.render_textfield(field),
            Site::Promote => {
                // Text inputs only live in input blocks, whatever the
                // surface.
                return self.promote_interactive(
                    field.clone().into(),
                    field.label.clone(),
                    field.hint.clone(),
                    field.optional,
                    true,
                );
            }
            Site::Ready => {}
        }

        let action_id = self.action_id();
        let block_id = self.open_block_id();

        if let Some(value) = self.submitted_value(&block_id, &action_id) {
            if let Some(raw) = value.as_text() {
                let raw = raw.to_owned();
                match &field.binding {
                    TextFieldBinding::Plain(binding) => binding.write(self, raw),
                    TextFieldBinding::Formatted { write, .. } => {
                        if let Err(message) = write(self, &raw) {
                            self.add_block_error(block_id.clone(), message);
                        }
                    }
                }
            }
        }

        let initial = match &field.binding {
            TextFieldBinding::Plain(binding) => binding.resolve(self),
            TextFieldBinding::Formatted { read, .. } => read(self),
        }
        .filter(|value| !value.is_empty());

        let mut element = PlainTextInputElement::new(action_id);
        element.initial_value = initial;
        element.placeholder = field.placeholder.clone().map(TextObject::plain);
        element.multiline = field.multiline;
        element.min_length = field.min_length;
        element.max_length = field.max_length;
        self.place_built_element(BlockElement::PlainTextInput(element))
    }
}
