/*!
Per-element-type recognition: the functions that consume the iterator
and emit matches.

Each element kind gets a pure function `recognize_*(ctx, element) ->
RecognizeResult`, dispatched on the element's tag rather than through a
virtual call (see `crate::element`). `Reference` recognition applies
cardinality and lives alongside them, since it's the only place
backtracking loops over a target element more than once.
*/

use crate::context::ParsingContext;
use crate::element::{CallbackError, ElementId, ElementKind};
use crate::match_tree::{Match, MatchData, MatchOrigin};
use crate::memo::{MemoEntry, MemoLookup};
use crate::reference::{Cardinality, ReferenceId};

/// Why recognition did not produce a match, beyond ordinary
/// backtracking.
#[derive(Debug)]
pub enum RecognizeFailure {
    /// No match at this position; normal backtracking outcome.
    NoMatch,
    /// The host requested cancellation mid-parse.
    Cancelled,
    /// A condition or procedure callback returned an error.
    Callback(CallbackError),
    /// Recursion went deeper than the context's configured limit.
    RunawayRecursion,
}

/// The result of attempting to recognize an element or reference.
pub type RecognizeResult = Result<Match, RecognizeFailure>;

/// Recognize `element` at the context's current offset, consulting and
/// updating memoization for composite elements.
pub fn recognize_element(ctx: &mut ParsingContext, element: ElementId) -> RecognizeResult {
    if ctx.is_cancelled() {
        return Err(RecognizeFailure::Cancelled);
    }
    if ctx.depth >= ctx.max_depth {
        return Err(RecognizeFailure::RunawayRecursion);
    }

    let kind_is_composite = matches!(
        ctx.grammar.element(element).kind(),
        ElementKind::Group(_) | ElementKind::Rule(_)
    );
    let offset = ctx.current_offset();

    if kind_is_composite {
        match ctx.memo.lookup(element, offset) {
            MemoLookup::Miss => ctx.memo.mark_in_progress(element, offset),
            MemoLookup::InProgress => return Err(RecognizeFailure::NoMatch),
            MemoLookup::Success(end, result) => {
                ctx.input().set_offset(end);
                ctx.record_attempt(element, offset, true, end);
                return Ok(result);
            }
            MemoLookup::Failure => {
                ctx.record_attempt(element, offset, false, offset);
                return Err(RecognizeFailure::NoMatch);
            }
        }
    }

    ctx.depth += 1;
    let outcome = dispatch(ctx, element);
    ctx.depth -= 1;

    if kind_is_composite {
        match &outcome {
            Ok(m) => ctx.memo.store(element, offset, MemoEntry::Success {
                end: m.end(),
                result: Box::new(m.clone()),
            }),
            Err(RecognizeFailure::NoMatch) => ctx.memo.store(element, offset, MemoEntry::Failure),
            // Cancellation/callback errors abort the parse; don't cache them.
            Err(_) => {}
        }
    }

    match &outcome {
        Ok(m) => ctx.record_attempt(element, offset, true, m.end()),
        Err(RecognizeFailure::NoMatch) => ctx.record_attempt(element, offset, false, offset),
        Err(_) => {}
    }

    outcome
}

fn dispatch(ctx: &mut ParsingContext, element: ElementId) -> RecognizeResult {
    // Borrow the config out from under `ctx.grammar` up front: the
    // grammar is immutable for the whole parse, so this is just a
    // lifetime dance, not a real clone of anything but `Arc`s/small
    // copies.
    match ctx.grammar.element(element).kind().clone() {
        ElementKind::Word(word) => recognize_word(ctx, element, &word.bytes),
        ElementKind::Token(token) => recognize_token(ctx, element, &token),
        ElementKind::Group(group) => recognize_group(ctx, element, &group.children),
        ElementKind::Rule(rule) => recognize_rule(ctx, element, &rule.children),
        ElementKind::Condition(cond) => recognize_condition(ctx, element, &cond.callback),
        ElementKind::Procedure(proc) => recognize_procedure(ctx, element, &proc.callback),
    }
}

fn recognize_word(ctx: &mut ParsingContext, element: ElementId, bytes: &[u8]) -> RecognizeResult {
    let offset = ctx.current_offset();
    let line = ctx.input().line_of(offset);
    if ctx.input().peek(bytes.len()) == bytes {
        ctx.input().advance(bytes.len());
        Ok(Match::new(MatchOrigin::Element(element), offset, bytes.len(), line))
    } else {
        Err(RecognizeFailure::NoMatch)
    }
}

fn recognize_token(ctx: &mut ParsingContext, element: ElementId, token: &crate::element::TokenConfig) -> RecognizeResult {
    let offset = ctx.current_offset();
    let line = ctx.input().line_of(offset);
    let haystack = ctx.input().remaining();
    let Some(captures) = token.regex().captures(haystack) else {
        return Err(RecognizeFailure::NoMatch);
    };
    let whole = captures.get(0).expect("capture group 0 always present on a match");
    if whole.start() != 0 {
        // The regex matched, but not anchored at the current offset.
        return Err(RecognizeFailure::NoMatch);
    }
    let length = whole.end();
    let groups: Vec<Option<Vec<u8>>> = captures
        .iter()
        .map(|m| m.map(|m| m.as_bytes().to_vec()))
        .collect();
    ctx.input().advance(length);
    Ok(Match::new(MatchOrigin::Element(element), offset, length, line).with_data(MatchData::Token(groups)))
}

fn recognize_group(ctx: &mut ParsingContext, element: ElementId, children: &[ReferenceId]) -> RecognizeResult {
    let start = ctx.current_offset();
    for &reference in children {
        if ctx.is_cancelled() {
            return Err(RecognizeFailure::Cancelled);
        }
        ctx.input().set_offset(start);
        match recognize_reference(ctx, reference) {
            Ok(child) => {
                let line = ctx.input().line_of(start);
                let length = child.end() - start;
                return Ok(Match::new(MatchOrigin::Element(element), start, length, line).with_children(vec![child]));
            }
            Err(RecognizeFailure::NoMatch) => continue,
            Err(other) => return Err(other),
        }
    }
    ctx.input().set_offset(start);
    Err(RecognizeFailure::NoMatch)
}

fn recognize_rule(ctx: &mut ParsingContext, element: ElementId, children: &[ReferenceId]) -> RecognizeResult {
    let start = ctx.current_offset();
    let line = ctx.input().line_of(start);
    let mut produced = Vec::with_capacity(children.len());

    for (i, &reference) in children.iter().enumerate() {
        if ctx.is_cancelled() {
            ctx.input().set_offset(start);
            return Err(RecognizeFailure::Cancelled);
        }
        if i > 0 {
            if let Some(skip) = ctx.grammar.skip() {
                run_skip(ctx, skip);
            }
        }
        match recognize_reference(ctx, reference) {
            Ok(child) => produced.push(child),
            Err(RecognizeFailure::NoMatch) => {
                ctx.input().set_offset(start);
                return Err(RecognizeFailure::NoMatch);
            }
            Err(other) => {
                ctx.input().set_offset(start);
                return Err(other);
            }
        }
    }

    let end = ctx.current_offset();
    Ok(Match::new(MatchOrigin::Element(element), start, end - start, line).with_children(produced))
}

/// Consume a maximal prefix matched by the skip element between `Rule`
/// children. Skip is optional and may accept an empty match; an
/// unboundedly-empty skip is accepted exactly once and then abandoned,
/// so it can never cause an infinite loop.
fn run_skip(ctx: &mut ParsingContext, skip: ElementId) {
    let before = ctx.current_offset();
    match recognize_element(ctx, skip) {
        Ok(m) if m.length() == 0 => {
            // Accept the single empty match and move on; don't loop.
            ctx.input().set_offset(before);
        }
        Ok(_) => {}
        Err(_) => {
            ctx.input().set_offset(before);
        }
    }
}

fn recognize_condition(
    ctx: &mut ParsingContext,
    element: ElementId,
    callback: &crate::element::ConditionFn,
) -> RecognizeResult {
    let offset = ctx.current_offset();
    let line = ctx.input().line_of(offset);
    match callback(element, ctx) {
        Ok(true) => Ok(Match::new(MatchOrigin::Element(element), offset, 0, line)),
        Ok(false) => Err(RecognizeFailure::NoMatch),
        Err(e) => Err(RecognizeFailure::Callback(e)),
    }
}

fn recognize_procedure(
    ctx: &mut ParsingContext,
    element: ElementId,
    callback: &crate::element::ProcedureFn,
) -> RecognizeResult {
    let offset = ctx.current_offset();
    let line = ctx.input().line_of(offset);
    match callback(element, ctx) {
        Ok(()) => Ok(Match::new(MatchOrigin::Element(element), offset, 0, line)),
        Err(e) => Err(RecognizeFailure::Callback(e)),
    }
}

/// Recognize a reference, applying its cardinality. Always produces a
/// single reference-typed match wrapping zero or more target matches.
pub fn recognize_reference(ctx: &mut ParsingContext, reference_id: ReferenceId) -> RecognizeResult {
    let reference = ctx.grammar.reference(reference_id).clone();
    let start = ctx.current_offset();
    let line = ctx.input().line_of(start);
    let target = reference.target();

    match reference.cardinality() {
        Cardinality::One => {
            let child = recognize_element(ctx, target)?;
            let length = child.end() - start;
            Ok(wrap(reference_id, start, length, line, vec![child]))
        }
        Cardinality::NotEmpty => {
            let child = recognize_element(ctx, target)?;
            if child.length() == 0 {
                ctx.input().set_offset(start);
                return Err(RecognizeFailure::NoMatch);
            }
            let length = child.end() - start;
            Ok(wrap(reference_id, start, length, line, vec![child]))
        }
        Cardinality::Optional => match recognize_element(ctx, target) {
            Ok(child) => {
                let length = child.end() - start;
                Ok(wrap(reference_id, start, length, line, vec![child]))
            }
            Err(RecognizeFailure::NoMatch) => {
                ctx.input().set_offset(start);
                Ok(wrap(reference_id, start, 0, line, Vec::new()))
            }
            Err(other) => Err(other),
        },
        Cardinality::ZeroOrMore => {
            let children = recognize_repeated(ctx, target)?;
            let end = ctx.current_offset();
            Ok(wrap(reference_id, start, end - start, line, children))
        }
        Cardinality::OneOrMore => {
            let first = recognize_element(ctx, target)?;
            let mut children = vec![first];
            children.extend(recognize_repeated(ctx, target)?);
            let end = ctx.current_offset();
            Ok(wrap(reference_id, start, end - start, line, children))
        }
    }
}

fn wrap(reference_id: ReferenceId, offset: usize, length: usize, line: usize, children: Vec<Match>) -> Match {
    Match::new(MatchOrigin::Reference(reference_id), offset, length, line).with_children(children)
}

/// Repeatedly attempt `target`, stopping at the first failure and never
/// backtracking past the last success. A target that can match empty
/// would otherwise loop forever; one empty match is accepted and then
/// repetition stops, mirroring the `skip`-between-siblings rule.
fn recognize_repeated(ctx: &mut ParsingContext, target: ElementId) -> Result<Vec<Match>, RecognizeFailure> {
    let mut children = Vec::new();
    loop {
        if ctx.is_cancelled() {
            return Err(RecognizeFailure::Cancelled);
        }
        let before = ctx.current_offset();
        match recognize_element(ctx, target) {
            Ok(m) => {
                let empty = m.length() == 0;
                children.push(m);
                if empty {
                    break;
                }
            }
            Err(RecognizeFailure::NoMatch) => {
                ctx.input().set_offset(before);
                break;
            }
            Err(other) => return Err(other),
        }
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Child, Grammar};
    use crate::iterator::InputCursor;

    fn run(grammar: &Grammar, input: &[u8]) -> RecognizeResult {
        let mut ctx = ParsingContext::new(grammar, InputCursor::from_bytes(input.to_vec()));
        let axiom = grammar.axiom().unwrap();
        recognize_element(&mut ctx, axiom)
    }

    #[test]
    fn word_matches_exact_literal() {
        let mut g = Grammar::new();
        let w = g.word("w", "pouet").unwrap();
        g.set_axiom(w);
        g.prepare().unwrap();
        let m = run(&g, b"pouet").unwrap();
        assert_eq!((m.offset(), m.length()), (0, 5));
        assert!(m.children().is_empty());
    }

    #[test]
    fn word_fails_on_mismatch() {
        let mut g = Grammar::new();
        let w = g.word("w", "pouet").unwrap();
        g.set_axiom(w);
        g.prepare().unwrap();
        assert!(run(&g, b"xxxxx").is_err());
    }

    #[test]
    fn rule_matches_sequence_and_reports_partial() {
        let mut g = Grammar::new();
        let a = g.anon_word("a").unwrap();
        let b = g.anon_word("b").unwrap();
        let rule = g.anon_rule(vec![Child::Element(a), Child::Element(b)]).unwrap();
        g.set_axiom(rule);
        g.prepare().unwrap();
        let m = run(&g, b"abab").unwrap();
        assert_eq!(m.length(), 2);
    }

    #[test]
    fn group_is_ordered_choice() {
        let mut g = Grammar::new();
        let short = g.anon_word("a").unwrap();
        let long = g.anon_word("ab").unwrap();
        // `short` is tried first, so even though `long` would also
        // match, the group returns `short`'s (shorter) match.
        let group = g.anon_group(vec![Child::Element(short), Child::Element(long)]).unwrap();
        g.set_axiom(group);
        g.prepare().unwrap();
        let m = run(&g, b"ab").unwrap();
        assert_eq!(m.length(), 1);
    }

    #[test]
    fn not_empty_rejects_zero_length_match() {
        let mut g = Grammar::new();
        let maybe = g.anon_token("x*").unwrap();
        let rule = g
            .anon_rule(vec![Child::Reference(crate::reference::Reference::new(maybe).not_empty())])
            .unwrap();
        g.set_axiom(rule);
        g.prepare().unwrap();
        assert!(run(&g, b"").is_err());
        let m = run(&g, b"xxx").unwrap();
        assert_eq!(m.length(), 3);
    }

    #[test]
    fn nested_star_of_optional_does_not_loop() {
        // (a?)* over input with no 'a's: the inner optional always
        // succeeds empty, so the outer repetition must stop after one
        // empty iteration instead of looping forever.
        let mut g = Grammar::new();
        let a = g.anon_word("a").unwrap();
        let inner = crate::reference::Reference::new(a).optional();
        let inner_group = g.anon_group(vec![Child::Reference(inner)]).unwrap();
        let outer = crate::reference::Reference::new(inner_group).zero_or_more();
        let rule = g.anon_rule(vec![Child::Reference(outer)]).unwrap();
        g.set_axiom(rule);
        g.prepare().unwrap();
        let m = run(&g, b"").unwrap();
        assert_eq!(m.length(), 0);
    }
}
