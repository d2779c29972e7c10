/*!
References: the only kind of edge in the grammar graph.
*/

use crate::element::ElementId;

/// Stable handle to a [`Reference`] inside a [`crate::grammar::Grammar`]'s
/// reference arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ReferenceId(pub(crate) u32);

impl ReferenceId {
    /// The raw arena index backing this id.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// How many times a referenced element must or may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Cardinality {
    /// Exactly one match; fails iff the target fails.
    One,
    /// Zero or one match; never fails (an empty match is produced on
    /// target failure).
    Optional,
    /// Zero or more matches; never fails.
    ZeroOrMore,
    /// One or more matches; fails iff the first attempt fails.
    OneOrMore,
    /// Exactly one match, additionally failing if that match has zero
    /// length.
    NotEmpty,
}

impl Cardinality {
    /// Whether this cardinality can succeed with zero matches of the
    /// target.
    pub fn allows_empty(self) -> bool {
        matches!(self, Cardinality::Optional | Cardinality::ZeroOrMore)
    }
}

/// A directed, quantified edge from a composite element to a target
/// element.
#[derive(Debug, Clone)]
pub struct Reference {
    pub(crate) target: ElementId,
    pub(crate) cardinality: Cardinality,
    pub(crate) name: Option<String>,
}

impl Reference {
    /// Construct a default reference to `target`: cardinality `one`,
    /// unnamed. Chain the builder methods below to customize it before
    /// wrapping it in a [`crate::grammar::Child::Reference`].
    pub fn new(target: ElementId) -> Self {
        Reference {
            target,
            cardinality: Cardinality::One,
            name: None,
        }
    }

    /// The element this reference points to.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// This reference's cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// The slot name a host processor can use to look up the match this
    /// reference produced among its parent's named children.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Builder: give this reference a slot name.
    pub fn as_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: cardinality one (the default).
    pub fn one(mut self) -> Self {
        self.cardinality = Cardinality::One;
        self
    }

    /// Builder: cardinality optional.
    pub fn optional(mut self) -> Self {
        self.cardinality = Cardinality::Optional;
        self
    }

    /// Builder: cardinality zero-or-more.
    pub fn zero_or_more(mut self) -> Self {
        self.cardinality = Cardinality::ZeroOrMore;
        self
    }

    /// Builder: cardinality one-or-more.
    pub fn one_or_more(mut self) -> Self {
        self.cardinality = Cardinality::OneOrMore;
        self
    }

    /// Builder: cardinality not-empty.
    pub fn not_empty(mut self) -> Self {
        self.cardinality = Cardinality::NotEmpty;
        self
    }
}
