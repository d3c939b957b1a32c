//! Renderers for text-like content and the section sub-shapes.

use blocks_kit::{ContextElement, RichTextRun, RichTextStyle, TextObject};
use tracing::{debug, warn};

use crate::context::{BlocksContext, Level2, OpenBlock, OpenRichTextPart, RichTextPartKind};
use crate::error::RenderError;
use crate::node::Node;
use crate::primitives;

/// Slack mrkdwn rendering of a styled run, for section/context/field text.
fn mrkdwn_span(content: &str, style: &RichTextStyle) -> String {
    let mut span = content.to_owned();
    if style.code {
        span = format!("`{span}`");
    }
    if style.strike {
        span = format!("~{span}~");
    }
    if style.italic {
        span = format!("_{span}_");
    }
    if style.bold {
        span = format!("*{span}*");
    }
    span
}

impl BlocksContext {
    /// Appends a run to the open rich text block, opening an implicit
    /// paragraph when no part is open.
    fn push_rich_text_run(&mut self, run: RichTextRun) -> Result<(), RenderError> {
        let (_, open_part) = self.open_rich_text()?;
        open_part
            .get_or_insert_with(|| OpenRichTextPart::new(RichTextPartKind::Paragraph))
            .runs
            .push(run);
        Ok(())
    }

    fn append_section_text(&mut self, span: &str) -> Result<(), RenderError> {
        let (text, _, _) = self.open_section()?;
        match text {
            Some(existing) => existing.append(span),
            None => *text = Some(TextObject::mrkdwn(span)),
        }
        Ok(())
    }

    pub(crate) fn render_text(&mut self, text: &primitives::Text) -> Result<(), RenderError> {
        if let Some(sink) = &mut self.text_sink {
            sink.push_str(&text.content);
            return Ok(());
        }
        match &mut self.current {
            Some(OpenBlock::RichText { .. }) => {
                self.push_rich_text_run(RichTextRun::styled(text.content.clone(), text.style))
            }
            Some(OpenBlock::Section { .. }) => {
                let span = mrkdwn_span(&text.content, &text.style);
                self.append_section_text(&span)
            }
            Some(OpenBlock::Context { elements, .. }) => {
                let element = if text.style.is_plain() {
                    TextObject::plain(text.content.clone())
                } else {
                    TextObject::mrkdwn(mrkdwn_span(&text.content, &text.style))
                };
                elements.push(ContextElement::Text(element));
                Ok(())
            }
            Some(OpenBlock::Header { text: header, .. }) => {
                header.push_str(&text.content);
                Ok(())
            }
            Some(other) => {
                warn!(open = other.kind_name(), "text inside an incompatible block; closing it");
                self.close_block();
                self.render_text(text)
            }
            None => self.render_wrapped_in_paragraph(text.clone().into()),
        }
    }

    pub(crate) fn render_markdown(
        &mut self,
        markdown: &primitives::Markdown,
    ) -> Result<(), RenderError> {
        if let Some(sink) = &mut self.text_sink {
            sink.push_str(&markdown.content);
            return Ok(());
        }
        match &mut self.current {
            Some(OpenBlock::RichText { .. }) => {
                self.push_rich_text_run(RichTextRun::text(markdown.content.clone()))
            }
            Some(OpenBlock::Section { .. }) => {
                let span = markdown.content.clone();
                self.append_section_text(&span)
            }
            Some(OpenBlock::Context { elements, .. }) => {
                elements.push(ContextElement::Text(TextObject::mrkdwn(markdown.content.clone())));
                Ok(())
            }
            Some(OpenBlock::Header { text: header, .. }) => {
                header.push_str(&markdown.content);
                Ok(())
            }
            Some(other) => {
                warn!(
                    open = other.kind_name(),
                    "markdown inside an incompatible block; closing it"
                );
                self.close_block();
                self.render_markdown(markdown)
            }
            None => self.render_wrapped_in_paragraph(markdown.clone().into()),
        }
    }

    pub(crate) fn render_link(&mut self, link: &primitives::Link) -> Result<(), RenderError> {
        let mrkdwn = format!("<{}|{}>", link.url, link.text);
        if let Some(sink) = &mut self.text_sink {
            sink.push_str(&mrkdwn);
            return Ok(());
        }

        // A link filling an accessory or actions slot is rewritten into a
        // URL button rather than nested as text.
        if self.level2 == Level2::Accessory || matches!(self.current, Some(OpenBlock::Actions { .. }))
        {
            let element = blocks_kit::BlockElement::Button(
                blocks_kit::ButtonElement::new(self.action_id(), link.text.clone())
                    .url(link.url.clone()),
            );
            return self.place_built_element(element);
        }

        match &mut self.current {
            Some(OpenBlock::RichText { .. }) => {
                self.push_rich_text_run(RichTextRun::link(link.url.clone(), Some(link.text.clone())))
            }
            Some(OpenBlock::Section { .. }) => {
                let span = mrkdwn_span(&mrkdwn, &link.style);
                self.append_section_text(&span)
            }
            Some(OpenBlock::Context { elements, .. }) => {
                elements.push(ContextElement::Text(TextObject::mrkdwn(mrkdwn)));
                Ok(())
            }
            Some(OpenBlock::Header { text: header, .. }) => {
                header.push_str(&link.text);
                Ok(())
            }
            Some(other) => {
                warn!(open = other.kind_name(), "link inside an incompatible block; closing it");
                self.close_block();
                self.render_link(link)
            }
            None => self.render_wrapped_in_paragraph(link.clone().into()),
        }
    }

    /// The no-container promotion for text-likes: `RichText { Paragraph }`.
    fn render_wrapped_in_paragraph(&mut self, node: Node) -> Result<(), RenderError> {
        let wrapped: Node =
            primitives::RichText::new(primitives::Paragraph::new(node)).into();
        self.render(&wrapped)
    }

    pub(crate) fn render_field(&mut self, field: &primitives::Field) -> Result<(), RenderError> {
        match &self.current {
            Some(OpenBlock::Section { .. }) => self.fill_field(&field.content),
            Some(other) => {
                warn!(open = other.kind_name(), "field outside a section; closing the open block");
                self.close_block();
                self.render_field(field)
            }
            None => {
                if self.reopen_last_block() {
                    self.fill_field(&field.content)
                } else {
                    debug!("field with no section in sight; opening one");
                    self.start_block(OpenBlock::section(self.action_id()));
                    self.fill_field(&field.content)
                }
            }
        }
    }

    /// Collects the field's text content and appends it to the open
    /// section. The section is left open so trailing siblings join it.
    fn fill_field(&mut self, content: &Node) -> Result<(), RenderError> {
        let saved_level2 = std::mem::replace(&mut self.level2, Level2::Field);
        let previous_sink = self.text_sink.replace(String::new());
        let result = self.render(content);
        let collected = std::mem::replace(&mut self.text_sink, previous_sink).unwrap_or_default();
        self.level2 = saved_level2;
        result?;

        if collected.is_empty() {
            debug!("field rendered no text; skipped");
            return Ok(());
        }
        match &mut self.current {
            Some(OpenBlock::Section { fields, .. }) => {
                fields.push(TextObject::mrkdwn(collected));
            }
            _ => warn!("section closed while its field rendered; field dropped"),
        }
        Ok(())
    }

    pub(crate) fn render_accessory(
        &mut self,
        accessory: &primitives::Accessory,
    ) -> Result<(), RenderError> {
        match &self.current {
            Some(OpenBlock::Section { .. }) => self.fill_accessory(&accessory.content),
            Some(other) => {
                warn!(
                    open = other.kind_name(),
                    "accessory outside a section; closing the open block"
                );
                self.close_block();
                self.render_accessory(accessory)
            }
            None => {
                if self.reopen_last_block() {
                    self.fill_accessory(&accessory.content)
                } else {
                    debug!("accessory with no section in sight; opening one");
                    self.start_block(OpenBlock::section(self.action_id()));
                    self.fill_accessory(&accessory.content)
                }
            }
        }
    }

    fn fill_accessory(&mut self, content: &Node) -> Result<(), RenderError> {
        let saved_level2 = std::mem::replace(&mut self.level2, Level2::Accessory);
        let result = self.render(content);
        self.level2 = saved_level2;
        result?;

        match &self.current {
            Some(OpenBlock::Section { accessory: None, .. }) => {
                debug!("accessory content produced no element");
            }
            Some(OpenBlock::Section { .. }) => {}
            _ => warn!("section closed while its accessory rendered; nothing placed"),
        }
        Ok(())
    }
}
