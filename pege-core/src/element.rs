/*!
The parsing-element object model: the node types of the grammar graph.

Every element is a tagged variant rather than a trait object (per the
re-architecture guidance for this engine): [`ElementKind`] dispatches on
a tag in [`crate::recognize`] instead of going through a virtual
`recognize` call, and all graph edges ([`crate::reference::Reference`])
are arena indices rather than pointers.
*/

use std::sync::Arc;

use regex::bytes::Regex;

use crate::context::ParsingContext;
use crate::reference::ReferenceId;

/// A boxed error returned by a host-supplied condition or procedure
/// callback, attached to a failed [`crate::result::ParsingResult`] when
/// it aborts a parse.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A host-supplied zero-width predicate. Must not advance the iterator.
pub type ConditionFn = Arc<dyn Fn(ElementId, &mut ParsingContext) -> Result<bool, CallbackError> + Send + Sync>;

/// A host-supplied zero-width side-effecting callback. Must not advance
/// the iterator; may mutate context variables.
pub type ProcedureFn = Arc<dyn Fn(ElementId, &mut ParsingContext) -> Result<(), CallbackError> + Send + Sync>;

/// Stable handle to an [`Element`] inside a [`crate::grammar::Grammar`]'s
/// element arena. Doubles as the element's id: arena indices are
/// already unique and non-negative, which satisfies the "every reachable
/// element has a unique non-negative id after `prepare`" invariant
/// without a separate renumbering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    /// The raw arena index backing this id.
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A fixed literal byte string.
#[derive(Debug, Clone)]
pub struct WordConfig {
    pub(crate) bytes: Vec<u8>,
}

impl WordConfig {
    /// The literal bytes this word matches.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A regular expression, compiled once at construction.
pub struct TokenConfig {
    pub(crate) pattern: String,
    pub(crate) regex: Regex,
}

impl TokenConfig {
    /// The source pattern this token was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The compiled regex backing this token.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig").field("pattern", &self.pattern).finish()
    }
}

/// Ordered choice among child references: first match wins.
#[derive(Debug, Clone, Default)]
pub struct GroupConfig {
    pub(crate) children: Vec<ReferenceId>,
}

impl GroupConfig {
    /// The child references, in declared (try) order.
    pub fn children(&self) -> &[ReferenceId] {
        &self.children
    }
}

/// Strict sequence of child references: every one must match.
#[derive(Debug, Clone, Default)]
pub struct RuleConfig {
    pub(crate) children: Vec<ReferenceId>,
}

impl RuleConfig {
    /// The child references, in declared (sequence) order.
    pub fn children(&self) -> &[ReferenceId] {
        &self.children
    }
}

/// A host-supplied predicate, consulted without consuming input.
#[derive(Clone)]
pub struct ConditionConfig {
    pub(crate) callback: ConditionFn,
}

impl std::fmt::Debug for ConditionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionConfig").finish_non_exhaustive()
    }
}

/// A host-supplied side-effecting callback, always matching empty.
#[derive(Clone)]
pub struct ProcedureConfig {
    pub(crate) callback: ProcedureFn,
}

impl std::fmt::Debug for ProcedureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcedureConfig").finish_non_exhaustive()
    }
}

/// The type-specific configuration of a parsing element.
#[derive(Debug, Clone)]
pub enum ElementKind {
    /// See [`WordConfig`].
    Word(WordConfig),
    /// See [`TokenConfig`].
    Token(Arc<TokenConfig>),
    /// See [`GroupConfig`].
    Group(GroupConfig),
    /// See [`RuleConfig`].
    Rule(RuleConfig),
    /// See [`ConditionConfig`].
    Condition(ConditionConfig),
    /// See [`ProcedureConfig`].
    Procedure(ProcedureConfig),
}

impl ElementKind {
    /// A short tag naming this element's kind, used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Word(_) => "word",
            ElementKind::Token(_) => "token",
            ElementKind::Group(_) => "group",
            ElementKind::Rule(_) => "rule",
            ElementKind::Condition(_) => "condition",
            ElementKind::Procedure(_) => "procedure",
        }
    }

    /// The child references of a composite element, empty for leaves.
    pub fn children(&self) -> &[ReferenceId] {
        match self {
            ElementKind::Group(g) => g.children(),
            ElementKind::Rule(r) => r.children(),
            _ => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<ReferenceId>> {
        match self {
            ElementKind::Group(g) => Some(&mut g.children),
            ElementKind::Rule(r) => Some(&mut r.children),
            _ => None,
        }
    }
}

/// A node of the grammar graph.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) id: ElementId,
    pub(crate) name: Option<String>,
    pub(crate) kind: ElementKind,
    /// Whether this element was reached from the axiom during the last
    /// `prepare`. Unreachable elements are kept (so host references to
    /// them stay valid) but excluded from validation and stats.
    pub(crate) reachable: bool,
}

impl Element {
    /// This element's id (its arena index).
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// This element's id, if it was reachable from the axiom in the most
    /// recent `prepare`. Mirrors the "sentinel negative id" the original
    /// engine uses for unreachable elements.
    pub fn reachable_id(&self) -> Option<ElementId> {
        self.reachable.then_some(self.id)
    }

    /// The element's human name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The element's type-specific configuration.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }
}
