use serde::Serialize;

use crate::elements::{BlockElement, ImageElement};
use crate::rich_text::RichTextBlockElement;
use crate::text::TextObject;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextElement {
    Text(TextObject),
    Image(ImageElement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub image_url: String,
    pub alt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<TextObject>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        fields: Vec<TextObject>,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<BlockElement>,
    },
    Actions {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        elements: Vec<BlockElement>,
    },
    Context {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        elements: Vec<ContextElement>,
    },
    Header {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        text: TextObject,
    },
    Input {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        label: TextObject,
        element: BlockElement,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<TextObject>,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        optional: bool,
        #[serde(skip_serializing_if = "std::ops::Not::not", default)]
        dispatch_action: bool,
    },
    Divider {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
    },
    Image(ImageBlock),
    RichText {
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        elements: Vec<RichTextBlockElement>,
    },
}

impl Block {
    pub fn block_id(&self) -> Option<&str> {
        match self {
            Self::Section { block_id, .. }
            | Self::Actions { block_id, .. }
            | Self::Context { block_id, .. }
            | Self::Header { block_id, .. }
            | Self::Input { block_id, .. }
            | Self::Divider { block_id }
            | Self::RichText { block_id, .. } => block_id.as_deref(),
            Self::Image(image) => image.block_id.as_deref(),
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, ContextElement};
    use crate::elements::{BlockElement, ButtonElement};
    use crate::text::TextObject;

    #[test]
    fn section_serializes_minimal_shape() {
        let block = Block::Section {
            block_id: Some("root.0".to_owned()),
            text: Some(TextObject::mrkdwn("*Hello*")),
            fields: Vec::new(),
            accessory: None,
        };
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "type": "section",
                "block_id": "root.0",
                "text": {"type": "mrkdwn", "text": "*Hello*"}
            })
        );
    }

    #[test]
    fn actions_block_nests_elements() {
        let block = Block::Actions {
            block_id: None,
            elements: vec![BlockElement::Button(ButtonElement::new("a", "Go"))],
        };
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(value["type"], "actions");
        assert_eq!(value["elements"][0]["type"], "button");
    }

    #[test]
    fn context_elements_serialize_untagged() {
        let block = Block::Context {
            block_id: None,
            elements: vec![ContextElement::Text(TextObject::plain("note"))],
        };
        let value = serde_json::to_value(&block).expect("serialize");
        assert_eq!(value["elements"][0]["type"], "plain_text");
    }

    #[test]
    fn block_id_accessor_covers_every_variant() {
        let divider = Block::Divider { block_id: Some("d.1".to_owned()) };
        assert_eq!(divider.block_id(), Some("d.1"));
        let image = Block::Image(super::ImageBlock {
            block_id: None,
            image_url: "https://example.com/x.png".to_owned(),
            alt_text: "x".to_owned(),
            title: None,
        });
        assert_eq!(image.block_id(), None);
    }
}
