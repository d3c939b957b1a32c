//! Block Kit wire model
//!
//! Serde-serializable value types for Slack's Block Kit JSON: composition
//! objects (`TextObject`, `OptionObject`), interactive elements
//! (`BlockElement`), layout blocks (`Block`), rich text, and surfaces
//! (`View`). The rendering engine in `blocks-core` constructs these; the
//! host ships them to Slack unchanged.
//!
//! Everything here is an immutable value with a stable JSON encoding.
//! Platform size limits are checked by the warn-only guards in
//! [`limits`] rather than hard failures: an over-limit payload is
//! Slack's to reject, and a truncated one would silently change meaning.

pub mod blocks;
pub mod elements;
pub mod limits;
pub mod rich_text;
pub mod text;
pub mod view;

pub use blocks::{Block, ContextElement, ImageBlock};
pub use elements::{
    BlockElement, ButtonElement, ButtonStyle, CheckboxesElement, ConfirmationDialog,
    DatePickerElement, ImageElement, PlainTextInputElement, SelectElement, TimePickerElement,
};
pub use rich_text::{RichTextBlockElement, RichTextRun, RichTextStyle};
pub use text::{OptionObject, TextObject};
pub use view::{View, ViewKind};
