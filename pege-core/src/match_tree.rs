/*!
The match tree produced by recognition.

Where the original engine links sibling matches with an intrusive list
and a first-child pointer, this arena-free port just owns its children
in a `Vec`: the tree is always fully owned by its parent, so there's no
need for the extra indirection once pointers aren't in play.
*/

use crate::element::ElementId;
use crate::reference::ReferenceId;

/// What a [`Match`] was produced by: either a grammar element directly
/// (the root match, or a composite's own match) or a reference (the
/// match produced by recognizing one child slot, wrapping the cardinality
/// of that slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    /// Produced by recognizing this element.
    Element(ElementId),
    /// Produced by recognizing this reference (wraps 0..n target
    /// matches per its cardinality).
    Reference(ReferenceId),
}

impl MatchOrigin {
    /// The element id, if this match came directly from an element
    /// rather than a reference.
    pub fn element(self) -> Option<ElementId> {
        match self {
            MatchOrigin::Element(id) => Some(id),
            MatchOrigin::Reference(_) => None,
        }
    }

    /// The reference id, if this match came from recognizing a
    /// reference.
    pub fn reference(self) -> Option<ReferenceId> {
        match self {
            MatchOrigin::Reference(id) => Some(id),
            MatchOrigin::Element(_) => None,
        }
    }
}

/// Element-type-specific payload carried by a match.
#[derive(Debug, Clone, Default)]
pub enum MatchData {
    /// No payload (Word, Group, Rule, Condition, Procedure, References).
    #[default]
    None,
    /// Capture groups from a `Token` match. Index 0 is the whole match.
    /// Storage is owned by the match (copied out of the iterator's
    /// buffer at match time), so it stays valid even if the iterator's
    /// window later slides past the matched offset.
    Token(Vec<Option<Vec<u8>>>),
}

/// A node of the match tree.
#[derive(Debug, Clone)]
pub struct Match {
    origin: MatchOrigin,
    offset: usize,
    length: usize,
    line: usize,
    data: MatchData,
    children: Vec<Match>,
}

impl Match {
    pub(crate) fn new(origin: MatchOrigin, offset: usize, length: usize, line: usize) -> Self {
        Match {
            origin,
            offset,
            length,
            line,
            data: MatchData::None,
            children: Vec::new(),
        }
    }

    pub(crate) fn with_data(mut self, data: MatchData) -> Self {
        self.data = data;
        self
    }

    pub(crate) fn with_children(mut self, children: Vec<Match>) -> Self {
        self.children = children;
        self
    }

    pub(crate) fn push_child(&mut self, child: Match) {
        self.children.push(child);
    }

    /// What produced this match.
    pub fn origin(&self) -> MatchOrigin {
        self.origin
    }

    /// This match's element id, if it came directly from recognizing an
    /// element. `None` for a reference-typed match — reference matches
    /// wrap their target's match as a child rather than being one
    /// themselves, so there's no element id to report here; look at
    /// `children()[0]` for that.
    pub fn element_id(&self) -> Option<ElementId> {
        self.origin.element()
    }

    /// Absolute byte offset where this match begins.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes of this match.
    pub fn length(&self) -> usize {
        self.length
    }

    /// 1-based line number at `offset`.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether this match consumed zero bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The end offset of this match (`offset + length`).
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// This match's element-type-specific payload.
    pub fn data(&self) -> &MatchData {
        &self.data
    }

    /// The token capture groups, if this is (or wraps) a Token match.
    pub fn captures(&self) -> Option<&[Option<Vec<u8>>]> {
        match &self.data {
            MatchData::Token(groups) => Some(groups),
            MatchData::None => None,
        }
    }

    /// This match's ordered children.
    pub fn children(&self) -> &[Match] {
        &self.children
    }

    /// Find a named child among this match's children, by the slot name
    /// on the reference that produced it. Only meaningful on a
    /// `Rule`/`Group` match, whose direct children are reference-typed
    /// matches.
    pub fn named_child<'a>(&'a self, name: &str, grammar: &crate::grammar::Grammar) -> Option<&'a Match> {
        self.children.iter().find(|child| {
            child
                .origin
                .reference()
                .and_then(|r| grammar.reference(r).name())
                .is_some_and(|n| n == name)
        })
    }

    /// Pre-order iterator over this match and all its descendants.
    pub fn walk(&self) -> MatchWalk<'_> {
        MatchWalk { stack: vec![self] }
    }
}

/// Pre-order walk over a match tree, yielding each node before its
/// children.
pub struct MatchWalk<'a> {
    stack: Vec<&'a Match>,
}

impl<'a> std::iter::Iterator for MatchWalk<'a> {
    type Item = &'a Match;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
