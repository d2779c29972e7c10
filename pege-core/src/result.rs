/*!
The outcome of a call to `parse_string`/`parse_path`/`parse_iterator`.
*/

use crate::context::ParsingContext;
use crate::element::CallbackError;
use crate::grammar::Grammar;
use crate::match_tree::Match;
use crate::recognize::{recognize_element, RecognizeFailure};
use crate::stats::{render_pointer, Stats};

/// Why a parse failed, beyond an ordinary non-matching input.
#[derive(Debug)]
pub enum FailureCause {
    /// The grammar's axiom simply didn't match at offset 0.
    NoMatch,
    /// The host requested cancellation.
    Cancelled,
    /// A condition or procedure callback raised an error.
    Callback(CallbackError),
    /// Recursion exceeded the context's configured limit.
    RunawayRecursion,
}

/// Whether a parse succeeded, covered only part of the input, or failed
/// outright.
#[derive(Debug)]
pub enum Status {
    /// The root match covers the entire input.
    Success,
    /// The root match succeeded but stops short of the end of input.
    Partial,
    /// No root match was produced.
    Failure(FailureCause),
}

/// The result of a single parse: status, the root match if any, and the
/// context it ran in (for diagnostics/stats). Always exists for a call
/// to `parse_*`; never null, even on failure.
pub struct ParsingResult<'g> {
    status: Status,
    root: Option<Match>,
    context: ParsingContext<'g>,
}

impl<'g> ParsingResult<'g> {
    pub(crate) fn run(grammar: &'g Grammar, mut context: ParsingContext<'g>) -> Self {
        let Some(axiom) = grammar.axiom() else {
            return ParsingResult {
                status: Status::Failure(FailureCause::NoMatch),
                root: None,
                context,
            };
        };

        match recognize_element(&mut context, axiom) {
            Ok(root) => {
                let remaining = context.input.remaining().is_empty();
                let status = if remaining { Status::Success } else { Status::Partial };
                ParsingResult {
                    status,
                    root: Some(root),
                    context,
                }
            }
            Err(RecognizeFailure::NoMatch) => ParsingResult {
                status: Status::Failure(FailureCause::NoMatch),
                root: None,
                context,
            },
            Err(RecognizeFailure::Cancelled) => ParsingResult {
                status: Status::Failure(FailureCause::Cancelled),
                root: None,
                context,
            },
            Err(RecognizeFailure::Callback(e)) => ParsingResult {
                status: Status::Failure(FailureCause::Callback(e)),
                root: None,
                context,
            },
            Err(RecognizeFailure::RunawayRecursion) => ParsingResult {
                status: Status::Failure(FailureCause::RunawayRecursion),
                root: None,
                context,
            },
        }
    }

    /// Whether the root match covers the entire input.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Status::Success)
    }

    /// Whether the root match succeeded but left unconsumed input.
    pub fn is_partial(&self) -> bool {
        matches!(self.status, Status::Partial)
    }

    /// Whether no root match was produced at all.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, Status::Failure(_))
    }

    /// The full status, including the failure cause when applicable.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// The root match, if recognition of the axiom succeeded (even
    /// partially).
    pub fn root_match(&self) -> Option<&Match> {
        self.root.as_ref()
    }

    /// The context this parse ran in (stats, memo table, scopes as they
    /// stood at the end of the parse).
    pub fn context(&self) -> &ParsingContext<'g> {
        &self.context
    }

    /// How many bytes of input were left unconsumed.
    pub fn remaining_bytes(&mut self) -> usize {
        self.context.input.remaining().len()
    }

    /// Offset, length, and element of the last successful match recorded
    /// during this parse.
    pub fn last_match(&self) -> (usize, usize, Option<crate::element::ElementId>) {
        self.context.stats().last_match()
    }

    /// This parse's statistics.
    pub fn stats(&self) -> &Stats {
        self.context.stats()
    }

    /// A human-readable description of why the parse failed (or, for a
    /// successful/partial parse, of how far it got), with a line/column
    /// pointer into the input and a window of surrounding source.
    pub fn describe_error(&mut self) -> String {
        let stats = self.context.stats();
        let (deepest_offset, deepest_element) = (stats.deepest_failure_offset(), stats.deepest_failure_element());
        let (last_offset, last_length, last_element) = stats.last_match();
        let grammar = self.context.grammar();

        let mut out = String::new();
        match &self.status {
            Status::Success => out.push_str("parse succeeded\n"),
            Status::Partial => out.push_str("parse succeeded but did not consume the entire input\n"),
            Status::Failure(FailureCause::NoMatch) => out.push_str("parse failed: no match for the axiom\n"),
            Status::Failure(FailureCause::Cancelled) => out.push_str("parse cancelled by host request\n"),
            Status::Failure(FailureCause::Callback(e)) => out.push_str(&format!("parse aborted by callback error: {e}\n")),
            Status::Failure(FailureCause::RunawayRecursion) => out.push_str("parse aborted: exceeded maximum recursion depth\n"),
        }

        if let Some(name) = last_element.and_then(|id| grammar.element(id).name()) {
            out.push_str(&format!(
                "last successful match: {name} at offset {last_offset}, length {last_length}\n"
            ));
        }
        if let Some(name) = deepest_element.and_then(|id| grammar.element(id).name()) {
            out.push_str(&format!("deepest failure: {name} at offset {deepest_offset}\n"));
        }

        let window_start = self.context.input.window_start();
        let pointer_offset = deepest_offset.max(last_offset);
        if pointer_offset >= window_start {
            let local = pointer_offset - window_start;
            out.push_str(&render_pointer(self.context.input.window(), local, 2));
        }

        out
    }
}
