/*!
The grammar arena: owns every element and reference, assigns ids, and
validates the graph via [`Grammar::prepare`].
*/

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use regex::bytes::Regex;

use crate::element::{
    CallbackError, ConditionConfig, ConditionFn, Element, ElementId, ElementKind, GroupConfig,
    ProcedureConfig, ProcedureFn, RuleConfig, TokenConfig, WordConfig,
};
use crate::context::ParsingContext;
use crate::error::{GrammarError, SourceError};
use crate::iterator::InputCursor;
use crate::reference::{Cardinality, Reference, ReferenceId};
use crate::result::ParsingResult;

/// Something that can be turned into a child reference of a composite
/// element: either a bare element (implicitly wrapped in a
/// cardinality-`one` reference) or an already-built [`Reference`].
pub enum Child {
    /// An element id, wrapped in a default (`one`, unnamed) reference.
    Element(ElementId),
    /// A fully configured reference.
    Reference(Reference),
}

impl From<ElementId> for Child {
    fn from(id: ElementId) -> Self {
        Child::Element(id)
    }
}

impl From<Reference> for Child {
    fn from(r: Reference) -> Self {
        Child::Reference(r)
    }
}

/// Owns every [`Element`] and [`Reference`] created through its factory
/// methods, and exposes the axiom/skip elements parsing starts from.
///
/// All graph edges are arena indices ([`ElementId`] / [`ReferenceId`]),
/// never pointers — this is what lets the grammar be a plain, acyclic
/// (in the ownership sense; the *logical* graph can and usually does
/// have cycles) set of `Vec`s instead of a web of `Rc`/`RefCell`.
pub struct Grammar {
    elements: Vec<Element>,
    references: Vec<Reference>,
    names: HashMap<String, ElementId>,
    axiom: Option<ElementId>,
    skip: Option<ElementId>,
    verbose: bool,
    strict_names: bool,
    prepared: bool,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    /// Construct an empty grammar.
    pub fn new() -> Self {
        Grammar {
            elements: Vec::new(),
            references: Vec::new(),
            names: HashMap::new(),
            axiom: None,
            skip: None,
            verbose: false,
            strict_names: false,
            prepared: false,
        }
    }

    /// Enable verbose diagnostic logging during recognition.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Whether verbose diagnostics are enabled.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Reject registering two named elements under the same name.
    pub fn set_strict_names(&mut self, strict: bool) {
        self.strict_names = strict;
    }

    fn register_name(&mut self, name: Option<&str>, id: ElementId) -> Result<(), GrammarError> {
        if let Some(name) = name {
            if self.strict_names && self.names.contains_key(name) {
                return Err(GrammarError::DuplicateName { name: name.to_owned() });
            }
            self.names.insert(name.to_owned(), id);
        }
        Ok(())
    }

    fn push_element(&mut self, name: Option<&str>, kind: ElementKind) -> Result<ElementId, GrammarError> {
        let id = ElementId(self.elements.len() as u32);
        self.register_name(name, id)?;
        self.elements.push(Element {
            id,
            name: name.map(str::to_owned),
            kind,
            reachable: false,
        });
        self.prepared = false;
        Ok(id)
    }

    /// Create a named `Word` element matching the exact literal `bytes`.
    pub fn word(&mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Result<ElementId, GrammarError> {
        self.push_element(Some(name), ElementKind::Word(WordConfig { bytes: bytes.into() }))
    }

    /// Create an anonymous `Word` element.
    pub fn anon_word(&mut self, bytes: impl Into<Vec<u8>>) -> Result<ElementId, GrammarError> {
        self.push_element(None, ElementKind::Word(WordConfig { bytes: bytes.into() }))
    }

    /// Create a named `Token` element, compiling `pattern` once.
    pub fn token(&mut self, name: &str, pattern: &str) -> Result<ElementId, GrammarError> {
        let regex = Regex::new(pattern).map_err(|source| GrammarError::InvalidTokenRegex {
            pattern: pattern.to_owned(),
            source,
        })?;
        let config = Arc::new(TokenConfig {
            pattern: pattern.to_owned(),
            regex,
        });
        self.push_element(Some(name), ElementKind::Token(config))
    }

    /// Create an anonymous `Token` element.
    pub fn anon_token(&mut self, pattern: &str) -> Result<ElementId, GrammarError> {
        let regex = Regex::new(pattern).map_err(|source| GrammarError::InvalidTokenRegex {
            pattern: pattern.to_owned(),
            source,
        })?;
        let config = Arc::new(TokenConfig {
            pattern: pattern.to_owned(),
            regex,
        });
        self.push_element(None, ElementKind::Token(config))
    }

    fn to_references(&self, children: Vec<Child>) -> Vec<Reference> {
        children
            .into_iter()
            .map(|child| match child {
                Child::Element(id) => Reference::new(id),
                Child::Reference(r) => r,
            })
            .collect()
    }

    fn push_references(&mut self, refs: Vec<Reference>) -> Vec<ReferenceId> {
        refs.into_iter()
            .map(|r| {
                let id = ReferenceId(self.references.len() as u32);
                self.references.push(r);
                id
            })
            .collect()
    }

    /// Create a named `Group` (ordered choice) element.
    pub fn group(&mut self, name: &str, children: Vec<Child>) -> Result<ElementId, GrammarError> {
        let refs = self.to_references(children);
        let ref_ids = self.push_references(refs);
        self.push_element(Some(name), ElementKind::Group(GroupConfig { children: ref_ids }))
    }

    /// Create an anonymous `Group` element.
    pub fn anon_group(&mut self, children: Vec<Child>) -> Result<ElementId, GrammarError> {
        let refs = self.to_references(children);
        let ref_ids = self.push_references(refs);
        self.push_element(None, ElementKind::Group(GroupConfig { children: ref_ids }))
    }

    /// Create a named `Rule` (strict sequence) element.
    pub fn rule(&mut self, name: &str, children: Vec<Child>) -> Result<ElementId, GrammarError> {
        let refs = self.to_references(children);
        let ref_ids = self.push_references(refs);
        self.push_element(Some(name), ElementKind::Rule(RuleConfig { children: ref_ids }))
    }

    /// Create an anonymous `Rule` element.
    pub fn anon_rule(&mut self, children: Vec<Child>) -> Result<ElementId, GrammarError> {
        let refs = self.to_references(children);
        let ref_ids = self.push_references(refs);
        self.push_element(None, ElementKind::Rule(RuleConfig { children: ref_ids }))
    }

    /// Create a named `Condition` element.
    pub fn condition<F>(&mut self, name: &str, callback: F) -> Result<ElementId, GrammarError>
    where
        F: Fn(ElementId, &mut crate::context::ParsingContext) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        let callback: ConditionFn = Arc::new(callback);
        self.push_element(Some(name), ElementKind::Condition(ConditionConfig { callback }))
    }

    /// Create a named `Procedure` element.
    pub fn procedure<F>(&mut self, name: &str, callback: F) -> Result<ElementId, GrammarError>
    where
        F: Fn(ElementId, &mut crate::context::ParsingContext) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        let callback: ProcedureFn = Arc::new(callback);
        self.push_element(Some(name), ElementKind::Procedure(ProcedureConfig { callback }))
    }

    /// Append a child to an existing `Group` or `Rule` element. Requires
    /// a subsequent `prepare` before parsing.
    pub fn add_child(&mut self, parent: ElementId, child: impl Into<Child>) -> Result<(), GrammarError> {
        let child = match child.into() {
            Child::Element(id) => Reference::new(id),
            Child::Reference(r) => r,
        };
        let ref_id = ReferenceId(self.references.len() as u32);
        self.references.push(child);
        let element = &mut self.elements[parent.0 as usize];
        element
            .kind
            .children_mut()
            .expect("add_child called on a non-composite element")
            .push(ref_id);
        self.prepared = false;
        Ok(())
    }

    /// Set the axiom: the top-level element whose match, if it covers
    /// the whole input, makes the parse a success.
    pub fn set_axiom(&mut self, axiom: ElementId) {
        self.axiom = Some(axiom);
        self.prepared = false;
    }

    /// The grammar's axiom, if set.
    pub fn axiom(&self) -> Option<ElementId> {
        self.axiom
    }

    /// Set the element consumed (optionally) between `Rule` children.
    pub fn set_skip(&mut self, skip: ElementId) {
        self.skip = Some(skip);
        self.prepared = false;
    }

    /// The grammar's skip element, if set.
    pub fn skip(&self) -> Option<ElementId> {
        self.skip
    }

    /// Look up an element by its registered name.
    pub fn named(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }

    /// Borrow an element by id.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0 as usize]
    }

    /// Borrow a reference by id.
    pub fn reference(&self, id: ReferenceId) -> &Reference {
        &self.references[id.0 as usize]
    }

    /// Mutably borrow a reference by id (e.g. to change cardinality
    /// after construction, before `prepare`).
    pub fn reference_mut(&mut self, id: ReferenceId) -> &mut Reference {
        self.prepared = false;
        &mut self.references[id.0 as usize]
    }

    /// Number of elements registered in this grammar (including
    /// unreachable ones).
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Iterate over every element in arena order.
    pub fn elements(&self) -> impl std::iter::Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Whether `prepare` has run since the last mutation.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Walk the graph breadth-first from the axiom, mark every reachable
    /// element, and validate the grammar:
    ///
    /// - the axiom must be set,
    /// - every id reached while walking must actually index an element
    ///   in this grammar's arena (an element/reference built through one
    ///   `Grammar`'s factory methods and handed to another's `set_axiom`/
    ///   `set_skip`/`add_child` would otherwise panic deep in the walk
    ///   instead of failing cleanly),
    /// - no cycle may be reachable purely through non-consuming paths
    ///   (`Condition`/`Procedure`/empty-capable references).
    pub fn prepare(&mut self) -> Result<(), GrammarError> {
        let axiom = self.axiom.ok_or(GrammarError::NoAxiom)?;

        for e in &mut self.elements {
            e.reachable = false;
        }

        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();
        queue.push_back(axiom);
        seen.insert(axiom);
        if let Some(skip) = self.skip {
            queue.push_back(skip);
            seen.insert(skip);
        }

        while let Some(id) = queue.pop_front() {
            if id.0 as usize >= self.elements.len() {
                return Err(GrammarError::InvalidElementId { element: id });
            }
            self.elements[id.0 as usize].reachable = true;
            let children = self.elements[id.0 as usize].kind.children().to_vec();
            for ref_id in children {
                let reference = &self.references[ref_id.0 as usize];
                let target = reference.target;
                if seen.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        self.check_non_consuming_cycles(axiom)?;

        self.prepared = true;
        tracing::debug!(elements = self.elements.len(), references = self.references.len(), "grammar prepared");
        Ok(())
    }

    /// Whether an element can, in principle, match with zero length.
    fn can_match_empty(&self, id: ElementId, visiting: &mut HashSet<ElementId>) -> Result<bool, GrammarError> {
        if !visiting.insert(id) {
            // Revisiting an element while still determining whether it can
            // match empty, without having consumed anything in between:
            // that's exactly a non-consuming cycle.
            return Err(GrammarError::NonConsumingCycle { element: id });
        }
        let element = &self.elements[id.0 as usize];
        let result = match &element.kind {
            ElementKind::Word(w) => Ok(w.bytes.is_empty()),
            ElementKind::Token(_) => Ok(true), // a regex may match the empty string
            ElementKind::Condition(_) | ElementKind::Procedure(_) => Ok(true),
            ElementKind::Group(g) => {
                // Any one alternative matching empty makes the whole group
                // empty-capable; stop as soon as that's settled; a later
                // alternative might otherwise drag in an unrelated, purely
                // coincidental recursion through an element already on the
                // `visiting` stack.
                let mut any_empty = false;
                for &ref_id in &g.children {
                    let reference = &self.references[ref_id.0 as usize];
                    if reference.cardinality.allows_empty() || self.can_match_empty(reference.target, visiting)? {
                        any_empty = true;
                        break;
                    }
                }
                Ok(any_empty)
            }
            ElementKind::Rule(r) => {
                // Symmetric to the group case: one required, non-empty
                // child already settles the rule as non-empty-capable, so
                // stop before checking the rest.
                let mut all_empty = true;
                for &ref_id in &r.children {
                    let reference = &self.references[ref_id.0 as usize];
                    let empty = reference.cardinality.allows_empty()
                        || self.can_match_empty(reference.target, visiting)?;
                    if !empty {
                        all_empty = false;
                        break;
                    }
                }
                Ok(all_empty)
            }
        };
        visiting.remove(&id);
        result
    }

    /// Parse an in-memory byte string against this (already prepared)
    /// grammar's axiom.
    pub fn parse_string(&self, bytes: impl Into<Vec<u8>>) -> ParsingResult<'_> {
        self.parse_iterator(InputCursor::from_bytes(bytes.into()))
    }

    /// Open `path` and parse its contents against this grammar's axiom.
    pub fn parse_path(&self, path: impl AsRef<std::path::Path>) -> Result<ParsingResult<'_>, SourceError> {
        Ok(self.parse_iterator(InputCursor::from_path(path, 64 * 1024)?))
    }

    /// Parse an already-constructed iterator against this grammar's
    /// axiom. The iterator may be streamed.
    pub fn parse_iterator(&self, input: InputCursor) -> ParsingResult<'_> {
        let context = ParsingContext::new(self, input);
        ParsingResult::run(self, context)
    }

    fn check_non_consuming_cycles(&self, axiom: ElementId) -> Result<(), GrammarError> {
        let mut visiting = HashSet::new();
        self.can_match_empty(axiom, &mut visiting)?;
        for element in &self.elements {
            if !element.reachable {
                continue;
            }
            let mut visiting = HashSet::new();
            self.can_match_empty(element.id, &mut visiting)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_requires_axiom() {
        let mut g = Grammar::new();
        let w = g.anon_word("x").unwrap();
        let _ = w;
        assert!(matches!(g.prepare(), Err(GrammarError::NoAxiom)));
    }

    #[test]
    fn prepare_marks_unreachable_elements() {
        let mut g = Grammar::new();
        let reachable = g.anon_word("a").unwrap();
        let unreachable = g.anon_word("b").unwrap();
        g.set_axiom(reachable);
        g.prepare().unwrap();
        assert!(g.element(reachable).reachable_id().is_some());
        assert!(g.element(unreachable).reachable_id().is_none());
    }

    #[test]
    fn detects_non_consuming_cycle() {
        let mut g = Grammar::new();
        let group = g.anon_group(Vec::new()).unwrap();
        g.add_child(group, Child::Element(group)).unwrap();
        g.set_axiom(group);
        assert!(matches!(g.prepare(), Err(GrammarError::NonConsumingCycle { .. })));
    }

    #[test]
    fn rule_with_consuming_child_is_not_a_cycle() {
        let mut g = Grammar::new();
        let a = g.anon_word("a").unwrap();
        let rule = g.anon_rule(vec![Child::Element(a)]).unwrap();
        g.set_axiom(rule);
        assert!(g.prepare().is_ok());
    }

    #[test]
    fn prepare_rejects_axiom_from_a_different_grammar() {
        let other = Grammar::new();
        let mut g = Grammar::new();
        // `other` never created any elements, so its id space is empty;
        // any `ElementId` borrowed from it is out of range in `g`'s arena.
        let borrowed = ElementId(0);
        let _ = other;
        g.set_axiom(borrowed);
        assert!(matches!(g.prepare(), Err(GrammarError::InvalidElementId { element }) if element == borrowed));
    }
}
