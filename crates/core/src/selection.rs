//! The selection/form-state bridge for pickers and checkbox groups.
//!
//! Two views of "what is selected" meet here: server-side *tags*
//! (application values attached to options) and client-side *values*
//! (opaque strings Slack echoes back). During render the bridge collects
//! the client values of currently-selected tags; during takeValues it is
//! seeded with the submitted client values and accumulates the tags they
//! correspond to, written back to the bound selection exactly once.

use std::collections::BTreeSet;
use std::fmt;

use blocks_kit::OptionObject;

use crate::element_id::ElementId;

/// A server-side selection tag: an application value attached to an
/// option via [`Choice::tag`](crate::primitives::Choice::tag).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Text(String),
    Number(i64),
}

impl Tag {
    /// Converts the tag to a stable web identifier if it is directly
    /// usable as one. Text tags qualify only when made of web-safe
    /// characters; anything else falls through the tie-break chain.
    pub fn web_id(&self) -> Option<String> {
        match self {
            Self::Number(number) => Some(number.to_string()),
            Self::Text(text) => {
                let safe = !text.is_empty()
                    && text
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
                safe.then(|| text.clone())
            }
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for Tag {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Tag {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Tag {
    fn from(number: i64) -> Self {
        Self::Number(number)
    }
}

/// What the bridge is doing this traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
enum BridgePhase {
    /// Rendering: collect the options whose tag is currently selected.
    Render { selected: BTreeSet<Tag> },
    /// Taking values: match submitted client values back to tags.
    TakeValues { submitted: BTreeSet<String> },
    /// Walking for structure only; nothing to collect or write back.
    Inert,
}

/// Per-picker selection bridge, installed on the context while the
/// picker's option subtree renders and taken down right after.
#[derive(Clone, Debug)]
pub struct SelectionState {
    phase: BridgePhase,
    pending_tag: Option<Tag>,
    options: Vec<OptionObject>,
    initial_options: Vec<OptionObject>,
    matched_tags: BTreeSet<Tag>,
}

impl SelectionState {
    pub fn for_render(selected: BTreeSet<Tag>) -> Self {
        Self::with_phase(BridgePhase::Render { selected })
    }

    pub fn for_take_values(submitted: BTreeSet<String>) -> Self {
        Self::with_phase(BridgePhase::TakeValues { submitted })
    }

    pub fn inert() -> Self {
        Self::with_phase(BridgePhase::Inert)
    }

    fn with_phase(phase: BridgePhase) -> Self {
        Self {
            phase,
            pending_tag: None,
            options: Vec::new(),
            initial_options: Vec::new(),
            matched_tags: BTreeSet::new(),
        }
    }

    pub fn set_pending_tag(&mut self, tag: Option<Tag>) {
        self.pending_tag = tag;
    }

    /// Generates the client-visible value for the option being rendered.
    ///
    /// Tie-break order is load-bearing for round-tripping of deployed
    /// `initial_options` and must not change: pending tag's web id, then
    /// the option's URL, then the structural element id.
    pub fn client_value(&self, url: Option<&str>, element_id: &ElementId) -> String {
        if let Some(id) = self.pending_tag.as_ref().and_then(Tag::web_id) {
            return id;
        }
        if let Some(url) = url {
            return url.to_owned();
        }
        element_id.serialize()
    }

    /// Registers a finished option. In render phase, options whose tag is
    /// in the current selection feed `initial_options`; in takeValues
    /// phase, options whose client value came back mark their tag matched.
    pub fn note_option(&mut self, option: OptionObject) {
        let tag = self.pending_tag.take();
        match &self.phase {
            BridgePhase::Render { selected } => {
                if tag.as_ref().is_some_and(|tag| selected.contains(tag)) {
                    self.initial_options.push(option.clone());
                }
            }
            BridgePhase::TakeValues { submitted } => {
                if submitted.contains(&option.value) {
                    if let Some(tag) = tag {
                        self.matched_tags.insert(tag);
                    }
                }
            }
            BridgePhase::Inert => {}
        }
        self.options.push(option);
    }

    pub fn options(&self) -> &[OptionObject] {
        &self.options
    }

    pub fn into_parts(self) -> (Vec<OptionObject>, Vec<OptionObject>, BTreeSet<Tag>) {
        (self.options, self.initial_options, self.matched_tags)
    }

    /// Whether takeValues write-back should happen for this picker.
    pub fn applies_values(&self) -> bool {
        matches!(self.phase, BridgePhase::TakeValues { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use blocks_kit::OptionObject;

    use super::{SelectionState, Tag};
    use crate::element_id::{ElementId, Segment};

    fn element_id(parts: &[&str]) -> ElementId {
        let mut id = ElementId::new();
        for part in parts {
            id.push(Segment::name(*part));
        }
        id
    }

    #[test]
    fn client_value_prefers_tag_web_id() {
        let mut bridge = SelectionState::for_render(BTreeSet::new());
        bridge.set_pending_tag(Some(Tag::from("region-emea")));
        let value = bridge.client_value(Some("https://example.com"), &element_id(&["r", "0"]));
        assert_eq!(value, "region-emea");
    }

    #[test]
    fn client_value_falls_back_to_url_then_element_id() {
        let mut bridge = SelectionState::for_render(BTreeSet::new());
        bridge.set_pending_tag(Some(Tag::from("has spaces")));
        let url_value = bridge.client_value(Some("https://example.com"), &element_id(&["r"]));
        assert_eq!(url_value, "https://example.com");

        bridge.set_pending_tag(None);
        let structural = bridge.client_value(None, &element_id(&["r", "opt"]));
        assert_eq!(structural, "r.opt");
    }

    #[test]
    fn render_phase_collects_initial_options_for_selected_tags() {
        let selected: BTreeSet<Tag> = [Tag::from("b")].into_iter().collect();
        let mut bridge = SelectionState::for_render(selected);

        for tag in ["a", "b", "c"] {
            bridge.set_pending_tag(Some(Tag::from(tag)));
            bridge.note_option(OptionObject::new(tag.to_uppercase(), tag));
        }

        let (options, initial, _) = bridge.into_parts();
        assert_eq!(options.len(), 3);
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].value, "b");
    }

    #[test]
    fn take_values_phase_matches_submitted_client_values() {
        let submitted: BTreeSet<String> = ["a".to_owned(), "c".to_owned()].into_iter().collect();
        let mut bridge = SelectionState::for_take_values(submitted);

        for tag in ["a", "b", "c"] {
            bridge.set_pending_tag(Some(Tag::from(tag)));
            bridge.note_option(OptionObject::new(tag.to_uppercase(), tag));
        }

        let (_, _, matched) = bridge.into_parts();
        assert_eq!(matched, [Tag::from("a"), Tag::from("c")].into_iter().collect());
    }

    #[test]
    fn number_tags_convert_to_decimal_web_ids() {
        assert_eq!(Tag::from(42).web_id(), Some("42".to_owned()));
        assert_eq!(Tag::from("no spaces allowed").web_id(), None);
    }
}
