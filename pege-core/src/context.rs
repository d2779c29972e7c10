/*!
Per-parse state: the iterator, variable scopes, memoization table, and
statistics threaded through a single call to `parse_*`.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::element::ElementId;
use crate::grammar::Grammar;
use crate::iterator::InputCursor;
use crate::memo::MemoTable;
use crate::stats::Stats;

/// A value a host condition/procedure can stash in a
/// [`ParsingContext`]'s variable scopes.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Value {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer counter (e.g. an indentation depth).
    Int(i64),
    /// Arbitrary text.
    Text(String),
}

/// A stack of `(name, value)` scopes. `push` records the current depth;
/// `pop` truncates back to it. Lookups search from the most recently
/// pushed entry backward, so inner scopes shadow outer ones.
#[derive(Debug, Default)]
pub struct Scopes {
    entries: Vec<(String, Value)>,
}

impl Scopes {
    /// Look up the nearest-enclosing entry with this name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set (or shadow) a variable in the current scope.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    /// Record the current depth, to be restored by a matching `pop`.
    pub fn push_scope(&self) -> usize {
        self.entries.len()
    }

    /// Truncate back to a depth previously returned by `push_scope`.
    pub fn pop_scope(&mut self, depth: usize) {
        self.entries.truncate(depth);
    }
}

/// A handle a host can clone out of a [`ParsingContext`] before parsing
/// starts, to request cancellation of an in-flight parse from another
/// thread. Consulted between top-level child recognitions in rules and
/// between alternatives in groups.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Construct a fresh, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the parse using this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-parse state: the iterator, a reference to the (already prepared)
/// grammar, variable scopes, memoization, statistics, and recursion
/// depth.
pub struct ParsingContext<'g> {
    pub(crate) grammar: &'g Grammar,
    pub(crate) input: InputCursor,
    pub(crate) scopes: Scopes,
    pub(crate) memo: MemoTable,
    pub(crate) stats: Stats,
    pub(crate) depth: usize,
    pub(crate) cancellation: CancellationToken,
    pub(crate) max_depth: usize,
}

impl<'g> ParsingContext<'g> {
    /// Construct a context over a prepared grammar and an iterator.
    pub fn new(grammar: &'g Grammar, input: InputCursor) -> Self {
        ParsingContext {
            grammar,
            input,
            scopes: Scopes::default(),
            memo: MemoTable::default(),
            stats: Stats::new(grammar.element_count()),
            depth: 0,
            cancellation: CancellationToken::new(),
            max_depth: 4096,
        }
    }

    /// Attach a cancellation token a host can use to abort this parse
    /// from another thread. Replaces whatever token was installed
    /// before.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Bound how deeply rules/groups may recurse before the parse is
    /// aborted as a runaway-recursion failure.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The grammar this context is parsing against.
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// The underlying input cursor.
    pub fn input(&mut self) -> &mut InputCursor {
        &mut self.input
    }

    /// The current absolute offset.
    pub fn current_offset(&self) -> usize {
        self.input.offset()
    }

    /// The byte at `offset`, if still within the buffered window.
    pub fn char_at(&self, offset: usize) -> Option<u8> {
        self.input.slice(offset, 1).and_then(|s| s.first().copied())
    }

    /// Look up a context variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.get(name)
    }

    /// Set a context variable in the current scope.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.scopes.set(name, value);
    }

    /// Push a new variable scope.
    pub fn push_scope(&mut self) -> usize {
        self.scopes.push_scope()
    }

    /// Pop back to a previously pushed scope depth.
    pub fn pop_scope(&mut self, depth: usize) {
        self.scopes.pop_scope(depth);
    }

    /// This context's statistics so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// A clone of this context's cancellation token, to hand to another
    /// thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) fn record_attempt(&mut self, element: ElementId, offset: usize, success: bool, end: usize) {
        self.stats.record(element, offset, success, end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::iterator::InputCursor;

    #[test]
    fn scopes_shadow_and_restore_on_pop() {
        let mut scopes = Scopes::default();
        scopes.set("indent", Value::Int(0));
        let depth = scopes.push_scope();
        scopes.set("indent", Value::Int(1));
        assert_eq!(scopes.get("indent"), Some(&Value::Int(1)));
        scopes.pop_scope(depth);
        assert_eq!(scopes.get("indent"), Some(&Value::Int(0)));
    }

    #[test]
    fn parsing_context_push_pop_scope_restores_shadowed_variable() {
        let mut g = Grammar::new();
        let axiom = g.anon_word("x").unwrap();
        g.set_axiom(axiom);
        g.prepare().unwrap();

        let mut ctx = ParsingContext::new(&g, InputCursor::from_bytes(b"x".to_vec()));
        ctx.set("depth", Value::Int(0));

        let saved = ctx.push_scope();
        ctx.set("depth", Value::Int(1));
        assert_eq!(ctx.get("depth"), Some(&Value::Int(1)));

        ctx.pop_scope(saved);
        assert_eq!(ctx.get("depth"), Some(&Value::Int(0)));
    }
}
