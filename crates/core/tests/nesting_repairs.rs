//! Structural repair paths: auto-wrapping, reopening, stale-block
//! recovery, and the metadata capacity guard. All of these degrade
//! gracefully; none of them abort a traversal.

use blocks_core::primitives::{
    Actions, Button, Divider, Field, Image, Link, Markdown, Quote, RichText, Section, Text, View,
};
use blocks_core::{BlocksContext, Component, DynamicProperty, MetaData, Mode, Node, Surface};
use blocks_kit::{Block, BlockElement, RichTextBlockElement};

fn render_blocks(tree: &Node) -> Vec<Block> {
    let mut ctx = BlocksContext::new(Surface::Message);
    ctx.render(tree).expect("render traversal");
    ctx.finish()
}

#[test]
fn bare_text_wraps_in_a_rich_text_paragraph() {
    let blocks = render_blocks(&Node::root("note", Text::new("plain words")));

    assert_eq!(blocks.len(), 1);
    let Block::RichText { elements, .. } = &blocks[0] else {
        panic!("rich text block expected");
    };
    assert!(matches!(&elements[0], RichTextBlockElement::RichTextSection { elements } if elements.len() == 1));
}

#[test]
fn quote_and_paragraph_render_as_separate_parts() {
    let tree = Node::root(
        "prose",
        RichText::new(Node::group(vec![
            Quote::new(Text::new("said earlier")).into(),
            Text::new("and the reply").into(),
        ])),
    );

    let blocks = render_blocks(&tree);
    let Block::RichText { elements, .. } = &blocks[0] else {
        panic!("rich text block expected");
    };
    assert_eq!(elements.len(), 2);
    assert!(matches!(&elements[0], RichTextBlockElement::RichTextQuote { .. }));
    assert!(matches!(&elements[1], RichTextBlockElement::RichTextSection { .. }));
}

#[test]
fn late_field_reopens_the_finished_section() {
    // The Field sits outside its Section; the renderer reopens the last
    // section rather than dropping the field.
    let tree = Node::root(
        "sloppy",
        Node::group(vec![
            Section::new(Text::new("totals")).into(),
            Field::new(Text::new("late column")).into(),
        ]),
    );

    let blocks = render_blocks(&tree);
    assert_eq!(blocks.len(), 1);
    let Block::Section { fields, text, .. } = &blocks[0] else {
        panic!("section expected");
    };
    assert_eq!(text.as_ref().map(|t| t.text().to_owned()), Some("totals".to_owned()));
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].text(), "late column");
}

#[test]
fn link_in_actions_becomes_a_url_button() {
    let tree = Node::root(
        "nav",
        Actions::new(Node::group(vec![
            Button::new("Do it").into(),
            Link::new("Docs", "https://example.com/docs").into(),
        ])),
    );

    let blocks = render_blocks(&tree);
    let Block::Actions { elements, .. } = &blocks[0] else {
        panic!("actions expected");
    };
    assert_eq!(elements.len(), 2);
    let BlockElement::Button(link_button) = &elements[1] else {
        panic!("link must rewrite to a button");
    };
    assert_eq!(link_button.url.as_deref(), Some("https://example.com/docs"));
    assert_eq!(link_button.text.text(), "Docs");
}

#[test]
fn divider_closes_whatever_was_open() {
    let tree = Node::root(
        "split",
        Section::new(Node::group(vec![
            Text::new("above").into(),
            Divider.into(),
            Text::new("below").into(),
        ])),
    );

    let blocks = render_blocks(&tree);
    assert_eq!(blocks.len(), 3);
    assert!(matches!(&blocks[0], Block::Section { .. }));
    assert!(matches!(&blocks[1], Block::Divider { .. }));
    // The trailing text re-wraps on its own.
    assert!(matches!(&blocks[2], Block::RichText { .. }));
}

#[test]
fn image_in_a_section_becomes_its_accessory() {
    let tree = Node::root(
        "card",
        Section::new(Node::group(vec![
            Markdown::new("*Release 1.2*").into(),
            Image::new("https://example.com/icon.png", "icon").into(),
        ])),
    );

    let blocks = render_blocks(&tree);
    let Block::Section { accessory, .. } = &blocks[0] else {
        panic!("section expected");
    };
    assert!(matches!(accessory, Some(BlockElement::Image(image)) if image.alt_text == "icon"));
}

#[test]
fn second_view_wrapper_keeps_the_first_chrome() {
    let tree = Node::root(
        "stacked",
        Node::group(vec![
            View::new("First", Text::new("body one")).into(),
            View::new("Second", Text::new("body two")).into(),
        ]),
    );

    let mut ctx = BlocksContext::new(Surface::Modal);
    ctx.render(&tree).expect("render");
    let view = ctx.finish_view().expect("view");
    assert_eq!(view.title.text(), "First");
    assert_eq!(view.blocks.len(), 2, "the second view's body still renders");
}

#[test]
fn oversized_metadata_is_sent_unmutated() {
    #[derive(Clone)]
    struct Carrier {
        payload: MetaData,
    }

    impl Component for Carrier {
        fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
            vec![&mut self.payload]
        }

        fn body(&self) -> Node {
            View::new("Big", Text::new("metadata test")).into()
        }
    }

    let oversized = "x".repeat(4_000);
    let tree = Node::root(
        "meta",
        Node::component(Carrier { payload: MetaData::new("blob", oversized.clone()) }),
    );

    let mut ctx = BlocksContext::new(Surface::Modal);
    ctx.render(&tree).expect("render");
    let view = ctx.finish_view().expect("view");

    let encoded = view.private_metadata.expect("metadata survives the size guard");
    assert!(encoded.len() > 4_000, "no truncation");
    assert!(encoded.contains(&oversized));
}

#[test]
fn metadata_round_trips_through_the_inbound_string() {
    #[derive(Clone)]
    struct Carrier {
        step: MetaData,
    }

    impl Component for Carrier {
        fn properties(&mut self) -> Vec<&mut dyn DynamicProperty> {
            vec![&mut self.step]
        }

        fn body(&self) -> Node {
            View::new("Wizard", Text::new(format!("step: {}", self.step.value()))).into()
        }
    }

    let tree =
        Node::root("wizard", Node::component(Carrier { step: MetaData::new("step", "one") }));

    let mut ctx = BlocksContext::new(Surface::Modal);
    ctx.render(&tree).expect("render");
    let view = ctx.finish_view().expect("view");
    let encoded = view.private_metadata.expect("metadata present");

    let mut next_turn = BlocksContext::new(Surface::Modal);
    next_turn.install_metadata_string(&encoded);
    next_turn.prepare_for(Mode::Render);
    next_turn.render(&tree).expect("second render");
    let view = next_turn.finish_view().expect("view");
    assert_eq!(view.private_metadata, Some(encoded));
}
