use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
    Mrkdwn {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        verbatim: Option<bool>,
    },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into(), emoji: None }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into(), verbatim: None }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::PlainText { text, .. } | Self::Mrkdwn { text, .. } => text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    /// Appends more content to the underlying text, preserving the flavor.
    pub fn append(&mut self, more: &str) {
        match self {
            Self::PlainText { text, .. } | Self::Mrkdwn { text, .. } => text.push_str(more),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionObject {
    pub text: TextObject,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl OptionObject {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { text: TextObject::plain(label), value: value.into(), description: None, url: None }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(TextObject::plain(description));
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{OptionObject, TextObject};

    #[test]
    fn plain_text_serializes_with_type_tag() {
        let value = serde_json::to_value(TextObject::plain("Hi")).expect("serialize");
        assert_eq!(value, serde_json::json!({"type": "plain_text", "text": "Hi"}));
    }

    #[test]
    fn mrkdwn_serializes_with_type_tag() {
        let value = serde_json::to_value(TextObject::mrkdwn("*bold*")).expect("serialize");
        assert_eq!(value, serde_json::json!({"type": "mrkdwn", "text": "*bold*"}));
    }

    #[test]
    fn append_preserves_flavor() {
        let mut text = TextObject::mrkdwn("a");
        text.append("b");
        assert!(matches!(text, TextObject::Mrkdwn { ref text, .. } if text == "ab"));
    }

    #[test]
    fn option_object_omits_empty_fields() {
        let value = serde_json::to_value(OptionObject::new("Label", "v1")).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "text": {"type": "plain_text", "text": "Label"},
                "value": "v1"
            })
        );
    }
}
