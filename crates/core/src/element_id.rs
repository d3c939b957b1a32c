use std::fmt;

/// One step of a hierarchical element path: either a positional index
/// inside a fixed sequence, or a name supplied by data or registration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Index(u32),
    Name(String),
}

impl Segment {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            // `%` before `.` so an escaped dot does not get re-escaped.
            Self::Name(name) => write!(f, "{}", name.replace('%', "%25").replace('.', "%2E")),
        }
    }
}

impl From<u32> for Segment {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Hierarchical path addressing one node of the component tree within a
/// traversal. Used verbatim as Slack `block_id`/`action_id` values and as
/// the key into the per-request state store, so serialization must stay
/// deterministic and injective.
///
/// Segments follow stack discipline: every push around a subtree visit is
/// matched by a pop, whatever the subtree's outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    segments: Vec<Segment>,
}

impl ElementId {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Opens a zero-based counter for a run of fixed-arity siblings.
    pub fn push_zero(&mut self) {
        self.segments.push(Segment::Index(0));
    }

    /// Advances the trailing sibling counter. Gives consecutive children
    /// distinct, stable suffixes without the caller threading an index.
    pub fn increment_last(&mut self) {
        match self.segments.last_mut() {
            Some(Segment::Index(index)) => *index += 1,
            other => {
                debug_assert!(false, "increment_last on non-index segment: {other:?}");
                tracing::error!(?other, "increment_last called on a non-index segment");
            }
        }
    }

    pub fn pop(&mut self) {
        assert!(!self.segments.is_empty(), "ElementId::pop on an empty path");
        self.segments.pop();
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Stable dot-joined encoding. Name segments escape `%` and `.`, which
    /// keeps the encoding injective: two distinct paths never collide.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                out.push('.');
            }
            out.push_str(&segment.to_string());
        }
        out
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::{ElementId, Segment};

    #[test]
    fn serialization_is_deterministic_and_order_preserving() {
        let mut id = ElementId::new();
        id.push(Segment::name("root"));
        id.push_zero();
        id.increment_last();
        id.increment_last();
        id.push(Segment::name("item-a"));
        assert_eq!(id.serialize(), "root.2.item-a");
        assert_eq!(id.serialize(), id.clone().serialize());
    }

    #[test]
    fn name_segments_escape_the_separator() {
        let mut plain = ElementId::new();
        plain.push(Segment::name("a.b"));

        let mut nested = ElementId::new();
        nested.push(Segment::name("a"));
        nested.push(Segment::name("b"));

        assert_ne!(plain.serialize(), nested.serialize());
        assert_eq!(plain.serialize(), "a%2Eb");
        assert_eq!(nested.serialize(), "a.b");
    }

    #[test]
    fn push_and_pop_are_balanced() {
        let mut id = ElementId::new();
        id.push(Segment::name("root"));
        id.push_zero();
        id.pop();
        id.pop();
        assert!(id.is_empty());
    }

    #[test]
    #[should_panic(expected = "ElementId::pop on an empty path")]
    fn pop_on_empty_is_a_programming_error() {
        ElementId::new().pop();
    }

    #[test]
    fn increment_requires_an_index_tail() {
        let mut id = ElementId::new();
        id.push_zero();
        id.increment_last();
        assert_eq!(id.serialize(), "1");
    }
}
