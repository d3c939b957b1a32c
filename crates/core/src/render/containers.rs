//! Renderers for the top-level containers and block-level leaves.

use blocks_kit::{Block, ImageBlock, TextObject};
use tracing::{debug, warn};

use crate::context::{
    BlocksContext, Level2, OpenBlock, OpenRichTextPart, RichTextPartKind, ViewFrame,
};
use crate::error::RenderError;
use crate::node::Node;
use crate::primitives;

impl BlocksContext {
    /// Closes the open block, eliding it when its content never
    /// materialized, and tolerates content having closed it already.
    fn finish_container(&mut self) {
        match &self.current {
            Some(open) if open.is_empty() => self.drop_current_block(),
            Some(_) => self.close_block(),
            None => debug!("container was already closed while rendering its content"),
        }
    }

    pub(crate) fn render_section(
        &mut self,
        section: &primitives::Section,
    ) -> Result<(), RenderError> {
        self.start_block(OpenBlock::section(self.action_id()));
        self.render(&section.content)?;
        self.finish_container();
        Ok(())
    }

    pub(crate) fn render_actions(
        &mut self,
        actions: &primitives::Actions,
    ) -> Result<(), RenderError> {
        self.start_block(OpenBlock::actions(self.action_id()));
        self.render(&actions.content)?;
        self.finish_container();
        Ok(())
    }

    pub(crate) fn render_context_block(
        &mut self,
        context: &primitives::Context,
    ) -> Result<(), RenderError> {
        self.start_block(OpenBlock::context(self.action_id()));
        self.render(&context.content)?;
        self.finish_container();
        Ok(())
    }

    pub(crate) fn render_header(
        &mut self,
        header: &primitives::Header,
    ) -> Result<(), RenderError> {
        self.start_block(OpenBlock::header(self.action_id()));
        self.render(&header.content)?;
        self.finish_container();
        Ok(())
    }

    pub(crate) fn render_input(&mut self, input: &primitives::Input) -> Result<(), RenderError> {
        self.start_block(OpenBlock::Input {
            block_id: self.action_id(),
            label: input.label.clone(),
            element: None,
            hint: input.hint.clone().map(TextObject::plain),
            optional: input.optional,
            dispatch_action: input.dispatch_action,
        });
        self.render(&input.content)?;
        if matches!(&self.current, Some(OpenBlock::Input { element: None, .. })) {
            warn!(block_id = %self.enclosing_block_id(), "input block produced no element; dropped");
            self.drop_current_block();
        } else {
            self.finish_container();
        }
        Ok(())
    }

    pub(crate) fn render_rich_text(
        &mut self,
        rich_text: &primitives::RichText,
    ) -> Result<(), RenderError> {
        self.start_block(OpenBlock::rich_text(self.action_id()));
        self.render(&rich_text.content)?;
        self.finish_container();
        Ok(())
    }

    pub(crate) fn render_paragraph(
        &mut self,
        paragraph: &primitives::Paragraph,
    ) -> Result<(), RenderError> {
        self.render_rich_part(RichTextPartKind::Paragraph, &paragraph.content)
    }

    pub(crate) fn render_quote(&mut self, quote: &primitives::Quote) -> Result<(), RenderError> {
        self.render_rich_part(RichTextPartKind::Quote, &quote.content)
    }

    pub(crate) fn render_preformatted(
        &mut self,
        preformatted: &primitives::Preformatted,
    ) -> Result<(), RenderError> {
        self.render_rich_part(RichTextPartKind::Preformatted, &preformatted.content)
    }

    fn render_rich_part(
        &mut self,
        kind: RichTextPartKind,
        content: &Node,
    ) -> Result<(), RenderError> {
        match &self.current {
            Some(OpenBlock::RichText { .. }) => {}
            Some(other) => {
                warn!(open = other.kind_name(), "rich text part inside a foreign block; closing it");
                self.close_block();
                self.start_block(OpenBlock::rich_text(self.action_id()));
            }
            None => {
                self.start_block(OpenBlock::rich_text(self.action_id()));
            }
        }

        // Fold a part someone left open before starting this one.
        let (parts, open_part) = self.open_rich_text()?;
        if let Some(stale) = open_part.take() {
            if !stale.runs.is_empty() {
                parts.push(stale.into_wire());
            }
        }
        *open_part = Some(OpenRichTextPart::new(kind));

        let saved_level2 = std::mem::replace(&mut self.level2, Level2::Generic);
        let result = self.render(content);
        self.level2 = saved_level2;

        if let Ok((parts, open_part)) = self.open_rich_text() {
            if let Some(finished) = open_part.take() {
                if finished.runs.is_empty() {
                    debug!("rich text part rendered no runs; dropped");
                } else {
                    parts.push(finished.into_wire());
                }
            }
        }
        result
    }

    pub(crate) fn render_divider(&mut self) -> Result<(), RenderError> {
        if self.text_sink.is_some() {
            warn!("divider inside text content; skipped");
            return Ok(());
        }
        if let Some(open) = &self.current {
            warn!(open = open.kind_name(), "divider arrived inside an open block; closing it");
            let was_empty = open.is_empty();
            let finished = self.blocks.len();
            self.close_block();
            if was_empty && self.blocks.len() > finished {
                self.drop_last_block();
            }
        }
        let block_id = self.action_id();
        self.emit_block(Block::Divider { block_id: Some(block_id) });
        Ok(())
    }

    pub(crate) fn render_image(&mut self, image: &primitives::Image) -> Result<(), RenderError> {
        if self.text_sink.is_some() {
            warn!("image inside text content; skipped");
            return Ok(());
        }
        if self.level2 == Level2::Accessory {
            let element = image_element(image);
            let (_, _, accessory) = self.open_section()?;
            if accessory.is_some() {
                warn!("section accessory already filled; image dropped");
            } else {
                *accessory = Some(blocks_kit::BlockElement::Image(element));
            }
            return Ok(());
        }
        match &mut self.current {
            Some(OpenBlock::Context { elements, .. }) => {
                elements.push(blocks_kit::ContextElement::Image(image_element(image)));
                Ok(())
            }
            Some(OpenBlock::Section { accessory, .. }) => {
                if accessory.is_none() {
                    debug!("image inside a section placed as its accessory");
                    *accessory = Some(blocks_kit::BlockElement::Image(image_element(image)));
                    Ok(())
                } else {
                    warn!("image does not fit the open section; closing it");
                    self.close_block();
                    self.render_image(image)
                }
            }
            Some(other) => {
                warn!(open = other.kind_name(), "image inside an incompatible block; closing it");
                self.close_block();
                self.render_image(image)
            }
            None => {
                let block_id = self.action_id();
                self.emit_image_block(ImageBlock {
                    block_id: Some(block_id),
                    image_url: image.url.clone(),
                    alt_text: image.alt.clone(),
                    title: image.title.clone().map(TextObject::plain),
                });
                Ok(())
            }
        }
    }

    pub(crate) fn render_view(&mut self, view: &primitives::View) -> Result<(), RenderError> {
        if self.view.is_some() {
            warn!("second View node in one traversal; ignoring its chrome");
            return self.render(&view.content);
        }
        self.view = Some(ViewFrame {
            title: view.title.clone(),
            submit_title: view.submit_title.clone(),
            close_title: view.close_title.clone(),
            clear_on_close: view.clear_on_close,
            notify_on_close: view.notify_on_close,
        });

        if let Some(handler) = &view.on_submit {
            if let Some(responder) = self.try_consume_submit() {
                let handler = handler.clone();
                self.run_action_handler(&handler, responder)?;
            }
        }
        if let Some(handler) = &view.on_close {
            if let Some(responder) = self.try_consume_view_close() {
                let handler = handler.clone();
                self.run_action_handler(&handler, responder)?;
            }
        }

        self.render(&view.content)
    }
}

fn image_element(image: &primitives::Image) -> blocks_kit::ImageElement {
    blocks_kit::ImageElement { image_url: image.url.clone(), alt_text: image.alt.clone() }
}
