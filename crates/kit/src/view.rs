use serde::Serialize;

use crate::blocks::Block;
use crate::text::TextObject;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    #[default]
    Modal,
    Home,
}

/// A finished modal or home tab surface, ready for `views.open` and
/// friends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct View {
    #[serde(rename = "type")]
    pub kind: ViewKind,
    pub title: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<TextObject>,
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub clear_on_close: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub notify_on_close: bool,
}

impl View {
    pub fn new(kind: ViewKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: TextObject::plain(title),
            submit: None,
            close: None,
            blocks: Vec::new(),
            callback_id: None,
            private_metadata: None,
            external_id: None,
            clear_on_close: false,
            notify_on_close: false,
        }
    }

    pub fn has_input_block(&self) -> bool {
        self.blocks.iter().any(Block::is_input)
    }
}

#[cfg(test)]
mod tests {
    use super::{View, ViewKind};
    use crate::blocks::Block;
    use crate::elements::{BlockElement, PlainTextInputElement};
    use crate::text::TextObject;

    #[test]
    fn modal_serializes_with_type_field() {
        let view = View::new(ViewKind::Modal, "Settings");
        let value = serde_json::to_value(&view).expect("serialize");
        assert_eq!(value["type"], "modal");
        assert_eq!(value["title"]["text"], "Settings");
        assert!(value.get("submit").is_none());
    }

    #[test]
    fn has_input_block_spots_input_blocks() {
        let mut view = View::new(ViewKind::Modal, "Form");
        assert!(!view.has_input_block());
        view.blocks.push(Block::Input {
            block_id: None,
            label: TextObject::plain("Name"),
            element: BlockElement::PlainTextInput(PlainTextInputElement::new("name")),
            hint: None,
            optional: false,
            dispatch_action: false,
        });
        assert!(view.has_input_block());
    }
}
