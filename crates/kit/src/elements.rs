use serde::Serialize;

use crate::text::{OptionObject, TextObject};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmationDialog {
    pub title: TextObject,
    pub text: TextObject,
    pub confirm: TextObject,
    pub deny: TextObject,
}

impl ConfirmationDialog {
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        confirm: impl Into<String>,
        deny: impl Into<String>,
    ) -> Self {
        Self {
            title: TextObject::plain(title),
            text: TextObject::mrkdwn(text),
            confirm: TextObject::plain(confirm),
            deny: TextObject::plain(deny),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<ConfirmationDialog>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
            url: None,
            confirm: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// `static_select` or `multi_static_select`, distinguished by `multi`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    pub options: Vec<OptionObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_option: Option<OptionObject>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub initial_options: Vec<OptionObject>,
    #[serde(skip)]
    pub multi: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_selected_items: Option<u32>,
}

impl SelectElement {
    pub fn new(action_id: impl Into<String>, multi: bool) -> Self {
        Self {
            action_id: action_id.into(),
            placeholder: None,
            options: Vec::new(),
            initial_option: None,
            initial_options: Vec::new(),
            multi,
            max_selected_items: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckboxesElement {
    pub action_id: String,
    pub options: Vec<OptionObject>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub initial_options: Vec<OptionObject>,
}

impl CheckboxesElement {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self { action_id: action_id.into(), options: Vec::new(), initial_options: Vec::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatePickerElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimePickerElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlainTextInputElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl PlainTextInputElement {
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            initial_value: None,
            placeholder: None,
            multiline: false,
            min_length: None,
            max_length: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageElement {
    pub image_url: String,
    pub alt_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockElement {
    Button(ButtonElement),
    StaticSelect(SelectElement),
    MultiStaticSelect(SelectElement),
    Checkboxes(CheckboxesElement),
    Datepicker(DatePickerElement),
    Timepicker(TimePickerElement),
    PlainTextInput(PlainTextInputElement),
    Image(ImageElement),
}

impl BlockElement {
    /// Wraps a select under the wire tag matching its `multi` flag.
    pub fn select(element: SelectElement) -> Self {
        if element.multi {
            Self::MultiStaticSelect(element)
        } else {
            Self::StaticSelect(element)
        }
    }

    pub fn action_id(&self) -> Option<&str> {
        match self {
            Self::Button(e) => Some(&e.action_id),
            Self::StaticSelect(e) | Self::MultiStaticSelect(e) => Some(&e.action_id),
            Self::Checkboxes(e) => Some(&e.action_id),
            Self::Datepicker(e) => Some(&e.action_id),
            Self::Timepicker(e) => Some(&e.action_id),
            Self::PlainTextInput(e) => Some(&e.action_id),
            Self::Image(_) => None,
        }
    }

    /// Interactive elements are the ones Slack routes actions back for.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Self::Image(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockElement, ButtonElement, ButtonStyle, SelectElement};

    #[test]
    fn button_serializes_under_type_tag() {
        let button = BlockElement::Button(
            ButtonElement::new("approve.v1", "Approve").style(ButtonStyle::Primary),
        );
        let value = serde_json::to_value(&button).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "type": "button",
                "action_id": "approve.v1",
                "text": {"type": "plain_text", "text": "Approve"},
                "style": "primary"
            })
        );
    }

    #[test]
    fn select_tag_tracks_multi_flag() {
        let single = serde_json::to_value(BlockElement::select(SelectElement::new("s", false)))
            .expect("serialize");
        let multi = serde_json::to_value(BlockElement::select(SelectElement::new("m", true)))
            .expect("serialize");
        assert_eq!(single["type"], "static_select");
        assert_eq!(multi["type"], "multi_static_select");
    }

    #[test]
    fn plain_text_input_omits_default_multiline() {
        let element = super::PlainTextInputElement::new("field");
        let value = serde_json::to_value(&element).expect("serialize");
        assert!(value.get("multiline").is_none());
    }
}
