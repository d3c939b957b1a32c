//! Platform size limits, enforced as detect-and-warn.
//!
//! Slack rejects oversized payloads with a descriptive API error; mutating
//! a payload client-side (truncation, element dropping) would silently
//! change what the user sees. Every guard here logs and returns the
//! payload untouched.

use tracing::warn;

use crate::blocks::Block;
use crate::view::View;

pub const MAX_BLOCKS_PER_MESSAGE: usize = 50;
pub const MAX_BLOCKS_PER_VIEW: usize = 100;
pub const MAX_ACTIONS_ELEMENTS: usize = 25;
pub const MAX_CONTEXT_ELEMENTS: usize = 10;
pub const MAX_SECTION_FIELDS: usize = 10;
pub const MAX_HEADER_CHARS: usize = 150;
pub const MAX_VIEW_TITLE_CHARS: usize = 24;
pub const MAX_PRIVATE_METADATA_CHARS: usize = 3000;

/// Warns about any block that exceeds a documented platform limit.
pub fn check_blocks(blocks: &[Block]) {
    if blocks.len() > MAX_BLOCKS_PER_MESSAGE {
        warn!(count = blocks.len(), limit = MAX_BLOCKS_PER_MESSAGE, "too many blocks for a message");
    }
    for block in blocks {
        check_block(block);
    }
}

fn check_block(block: &Block) {
    match block {
        Block::Actions { block_id, elements } => {
            if elements.len() > MAX_ACTIONS_ELEMENTS {
                warn!(
                    block_id = block_id.as_deref().unwrap_or(""),
                    count = elements.len(),
                    limit = MAX_ACTIONS_ELEMENTS,
                    "actions block exceeds element limit"
                );
            }
        }
        Block::Context { block_id, elements } => {
            if elements.len() > MAX_CONTEXT_ELEMENTS {
                warn!(
                    block_id = block_id.as_deref().unwrap_or(""),
                    count = elements.len(),
                    limit = MAX_CONTEXT_ELEMENTS,
                    "context block exceeds element limit"
                );
            }
        }
        Block::Section { block_id, fields, .. } => {
            if fields.len() > MAX_SECTION_FIELDS {
                warn!(
                    block_id = block_id.as_deref().unwrap_or(""),
                    count = fields.len(),
                    limit = MAX_SECTION_FIELDS,
                    "section block exceeds field limit"
                );
            }
        }
        Block::Header { block_id, text } => {
            if text.text().chars().count() > MAX_HEADER_CHARS {
                warn!(
                    block_id = block_id.as_deref().unwrap_or(""),
                    chars = text.text().chars().count(),
                    limit = MAX_HEADER_CHARS,
                    "header text exceeds length limit"
                );
            }
        }
        _ => {}
    }
}

/// Warns about view-level limit violations (title length, block count,
/// metadata size). Never mutates the view.
pub fn check_view(view: &View) {
    if view.title.text().chars().count() > MAX_VIEW_TITLE_CHARS {
        warn!(
            chars = view.title.text().chars().count(),
            limit = MAX_VIEW_TITLE_CHARS,
            "view title exceeds length limit"
        );
    }
    if view.blocks.len() > MAX_BLOCKS_PER_VIEW {
        warn!(count = view.blocks.len(), limit = MAX_BLOCKS_PER_VIEW, "too many blocks for a view");
    }
    if let Some(metadata) = &view.private_metadata {
        if metadata.chars().count() > MAX_PRIVATE_METADATA_CHARS {
            warn!(
                chars = metadata.chars().count(),
                limit = MAX_PRIVATE_METADATA_CHARS,
                "private metadata exceeds platform capacity"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::check_blocks;
    use crate::blocks::Block;
    use crate::elements::{BlockElement, ButtonElement};

    #[test]
    fn oversized_actions_block_is_left_untouched() {
        let elements: Vec<BlockElement> = (0..30)
            .map(|i| BlockElement::Button(ButtonElement::new(format!("a.{i}"), "Go")))
            .collect();
        let blocks = vec![Block::Actions { block_id: None, elements }];
        check_blocks(&blocks);
        let Block::Actions { elements, .. } = &blocks[0] else {
            panic!("actions block expected");
        };
        assert_eq!(elements.len(), 30);
    }
}
