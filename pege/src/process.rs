/*!
Processor dispatch: walks a match tree and invokes host-supplied
handlers keyed by element id, producing a host value of type `V`.

Traversal visits the tree pre-order but invokes handlers post-order
(children first), so a handler always sees already-processed child
values. Repeated reference slots (`zero_or_more`/`one_or_more`) surface
to the parent's handler as one [`NamedValue`] per repetition under the
same slot name, rather than requiring `V` to support list construction
— the handler decides how to fold them.
*/

use std::collections::HashMap;
use std::sync::Arc;

use pege_core::element::ElementId;
use pege_core::grammar::Grammar;
use pege_core::match_tree::{Match, MatchOrigin};
use pege_core::reference::Cardinality;

/// A child value bound under its reference's slot name, if it had one.
pub struct NamedValue<V> {
    /// The slot name the producing reference was built with, if any.
    pub name: Option<String>,
    /// The child's processed value.
    pub value: V,
}

/// A handler invoked on an element's match, along with its already-
/// processed named children.
pub type Handler<V> = Arc<dyn Fn(&Match, &[NamedValue<V>]) -> V + Send + Sync>;

/// A handler table keyed by [`ElementId`], with a default applied to
/// any element with no specific registration.
pub struct Handlers<V> {
    by_element: HashMap<ElementId, Handler<V>>,
    default: Handler<V>,
}

impl<V: 'static> Handlers<V> {
    /// Construct a handler table whose default recurses into children
    /// and folds them with `default`.
    pub fn new(default: impl Fn(&Match, &[NamedValue<V>]) -> V + Send + Sync + 'static) -> Self {
        Handlers {
            by_element: HashMap::new(),
            default: Arc::new(default),
        }
    }

    /// Register a handler for a specific element, overriding the
    /// default for matches of that element.
    pub fn register(mut self, element: ElementId, handler: impl Fn(&Match, &[NamedValue<V>]) -> V + Send + Sync + 'static) -> Self {
        self.by_element.insert(element, Arc::new(handler));
        self
    }

    fn is_registered(&self, element: ElementId) -> bool {
        self.by_element.contains_key(&element)
    }

    fn handler_for(&self, element: ElementId) -> &Handler<V> {
        self.by_element.get(&element).unwrap_or(&self.default)
    }
}

/// How much of the match tree the processor actually visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Visit every match in the tree; the default handler recurses.
    Eager,
    /// Visit only matches with a registered handler, plus any subtree
    /// that can statically reach one through the grammar graph; other
    /// subtrees are treated as opaque leaves (their handler, if any —
    /// otherwise the default — is called with no children).
    Lazy,
}

/// Walks a match tree against a [`Handlers`] table under a [`Strategy`].
pub struct Processor<'g, V> {
    grammar: &'g Grammar,
    handlers: Handlers<V>,
    strategy: Strategy,
    needed: Option<std::collections::HashSet<ElementId>>,
}

impl<'g, V: 'static> Processor<'g, V> {
    /// Build a processor over `grammar`'s elements.
    pub fn new(grammar: &'g Grammar, handlers: Handlers<V>, strategy: Strategy) -> Self {
        let needed = match strategy {
            Strategy::Eager => None,
            Strategy::Lazy => Some(elements_reaching_a_handler(grammar, &handlers)),
        };
        Processor {
            grammar,
            handlers,
            strategy,
            needed,
        }
    }

    /// Process a match tree rooted at `root`, returning the host value
    /// the root's handler (or the default) produced.
    pub fn process(&self, root: &Match) -> V {
        self.process_element(root)
    }

    fn should_descend(&self, element: ElementId) -> bool {
        match self.strategy {
            Strategy::Eager => true,
            Strategy::Lazy => {
                self.handlers.is_registered(element)
                    || self.needed.as_ref().is_some_and(|needed| needed.contains(&element))
            }
        }
    }

    fn process_element(&self, m: &Match) -> V {
        let element = m.element_id().expect("process_element called on a reference-origin match");
        if !self.should_descend(element) {
            return self.handlers.handler_for(element)(m, &[]);
        }

        let mut named = Vec::with_capacity(m.children().len());
        for child in m.children() {
            named.extend(self.process_reference(child));
        }
        self.handlers.handler_for(element)(m, &named)
    }

    fn process_reference(&self, r: &Match) -> Vec<NamedValue<V>> {
        let MatchOrigin::Reference(reference_id) = r.origin() else {
            panic!("process_reference called on an element-origin match");
        };
        let reference = self.grammar.reference(reference_id);
        let name = reference.name().map(str::to_owned);

        match reference.cardinality() {
            Cardinality::One | Cardinality::NotEmpty => {
                let child = &r.children()[0];
                vec![NamedValue {
                    name,
                    value: self.process_element(child),
                }]
            }
            Cardinality::Optional => r
                .children()
                .first()
                .map(|child| NamedValue {
                    name: name.clone(),
                    value: self.process_element(child),
                })
                .into_iter()
                .collect(),
            Cardinality::ZeroOrMore | Cardinality::OneOrMore => r
                .children()
                .iter()
                .map(|child| NamedValue {
                    name: name.clone(),
                    value: self.process_element(child),
                })
                .collect(),
        }
    }
}

/// Elements that either have a registered handler, or whose subtree in
/// the *grammar graph* (not any one match tree) can reach one — i.e.
/// composites that might, for some input, produce a descendant match
/// worth visiting under the lazy strategy. Computed once per
/// `Processor` by iterating to a fixed point, since the grammar graph
/// can itself be cyclic (recursive rules).
fn elements_reaching_a_handler<V: 'static>(grammar: &Grammar, handlers: &Handlers<V>) -> std::collections::HashSet<ElementId> {
    let mut needed: std::collections::HashSet<ElementId> = grammar
        .elements()
        .filter(|e| handlers.is_registered(e.id()))
        .map(|e| e.id())
        .collect();

    loop {
        let mut changed = false;
        for element in grammar.elements() {
            if needed.contains(&element.id()) {
                continue;
            }
            let reaches = element.kind().children().iter().any(|&ref_id| {
                let target = grammar.reference(ref_id).target();
                needed.contains(&target)
            });
            if reaches {
                needed.insert(element.id());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    needed
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use pege_core::grammar::{Child, Grammar};

    use super::*;

    /// `Root -> [left: A, right: B]`, matching `"ab"`.
    fn build_pair_grammar() -> Grammar {
        let mut g = Grammar::new();
        let a = g.word("A", "a").unwrap();
        let b = g.word("B", "b").unwrap();
        let root = g
            .rule("Root", vec![Child::from(a), Child::from(b)])
            .unwrap();
        g.set_axiom(root);
        g.prepare().unwrap();
        g
    }

    #[test]
    fn registered_handler_fires_under_eager_and_lazy_strategies() {
        let g = build_pair_grammar();
        let result = g.parse_string("ab");
        let root = result.root_match().unwrap();
        let root_id = g.named("Root").unwrap();

        for strategy in [Strategy::Eager, Strategy::Lazy] {
            let handlers = Handlers::new(|_m: &Match, _children: &[NamedValue<String>]| "default".to_string())
                .register(root_id, |_m, children: &[NamedValue<String>]| {
                    format!("root({})", children.len())
                });
            let processor = Processor::new(&g, handlers, strategy);
            assert_eq!(processor.process(root), "root(2)");
        }
    }

    /// `Root -> [Branch -> [Leaf], TargetB]`. Only `Root` has a handler;
    /// `Leaf` has none and is never named by anything reachable from
    /// `Root` in the grammar graph, so under `Lazy`, `Branch` should be
    /// treated as opaque and never recurse down to `Leaf`.
    fn build_nested_grammar() -> (Grammar, ElementId, ElementId) {
        let mut g = Grammar::new();
        let leaf = g.word("Leaf", "x").unwrap();
        let branch = g.rule("Branch", vec![Child::from(leaf)]).unwrap();
        let target_b = g.word("TargetB", "y").unwrap();
        let root = g.rule("Root", vec![Child::from(branch), Child::from(target_b)]).unwrap();
        g.set_axiom(root);
        g.prepare().unwrap();
        (g, root, leaf)
    }

    #[test]
    fn eager_strategy_reaches_every_leaf() {
        let (g, root_id, leaf_id) = build_nested_grammar();
        let result = g.parse_string("xy");
        let root = result.root_match().unwrap();

        let visited_leaf = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&visited_leaf);
        let handlers = Handlers::new(move |m: &Match, _children: &[NamedValue<()>]| {
            if m.element_id() == Some(leaf_id) {
                flag.store(true, Ordering::SeqCst);
            }
        })
        .register(root_id, |_m, _children: &[NamedValue<()>]| ());

        let processor = Processor::new(&g, handlers, Strategy::Eager);
        processor.process(root);
        assert!(visited_leaf.load(Ordering::SeqCst));
    }

    #[test]
    fn lazy_strategy_skips_a_subtree_with_no_reachable_handler() {
        let (g, root_id, leaf_id) = build_nested_grammar();
        let result = g.parse_string("xy");
        let root = result.root_match().unwrap();

        let visited_leaf = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&visited_leaf);
        let handlers = Handlers::new(move |m: &Match, _children: &[NamedValue<()>]| {
            if m.element_id() == Some(leaf_id) {
                flag.store(true, Ordering::SeqCst);
            }
        })
        .register(root_id, |_m, _children: &[NamedValue<()>]| ());

        let processor = Processor::new(&g, handlers, Strategy::Lazy);
        processor.process(root);
        assert!(!visited_leaf.load(Ordering::SeqCst));
    }
}
