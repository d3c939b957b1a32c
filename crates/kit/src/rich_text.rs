use serde::Serialize;

/// Style flags on a rich text run. All default to off and are omitted from
/// the wire encoding when unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RichTextStyle {
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub strike: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub code: bool,
}

impl RichTextStyle {
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.strike || self.code)
    }
}

fn style_is_plain(style: &RichTextStyle) -> bool {
    style.is_plain()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextRun {
    Text {
        text: String,
        #[serde(skip_serializing_if = "style_is_plain", default)]
        style: RichTextStyle,
    },
    Link {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Emoji {
        name: String,
    },
}

impl RichTextRun {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into(), style: RichTextStyle::default() }
    }

    pub fn styled(text: impl Into<String>, style: RichTextStyle) -> Self {
        Self::Text { text: text.into(), style }
    }

    pub fn link(url: impl Into<String>, text: Option<String>) -> Self {
        Self::Link { url: url.into(), text }
    }
}

/// The second-level parts of a `rich_text` block. Slack's wire names keep
/// the `rich_text_` prefix; `section` is the paragraph shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextBlockElement {
    RichTextSection { elements: Vec<RichTextRun> },
    RichTextQuote { elements: Vec<RichTextRun> },
    RichTextPreformatted { elements: Vec<RichTextRun> },
}

impl RichTextBlockElement {
    pub fn runs(&self) -> &[RichTextRun] {
        match self {
            Self::RichTextSection { elements }
            | Self::RichTextQuote { elements }
            | Self::RichTextPreformatted { elements } => elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{RichTextBlockElement, RichTextRun, RichTextStyle};

    #[test]
    fn plain_run_omits_style() {
        let value = serde_json::to_value(RichTextRun::text("hi")).expect("serialize");
        assert_eq!(value, serde_json::json!({"type": "text", "text": "hi"}));
    }

    #[test]
    fn styled_run_keeps_only_set_flags() {
        let run = RichTextRun::styled("hi", RichTextStyle { bold: true, ..Default::default() });
        let value = serde_json::to_value(run).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"type": "text", "text": "hi", "style": {"bold": true}})
        );
    }

    #[test]
    fn section_uses_rich_text_section_tag() {
        let part = RichTextBlockElement::RichTextSection {
            elements: vec![RichTextRun::text("body")],
        };
        let value = serde_json::to_value(part).expect("serialize");
        assert_eq!(value["type"], "rich_text_section");
    }
}
