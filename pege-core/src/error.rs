/*!
Error types for grammar construction, preparation, and input handling.

Recognition *failure* (an alternative or rule not matching) is not an
error at this level — it's the normal return value that drives
backtracking. Only construction-time and I/O problems are represented
here; see [`crate::result::FailureCause`] for how a failed parse is
reported to the host.
*/

use std::io;

use thiserror::Error;

/// Errors raised while building a grammar or while [`crate::grammar::Grammar::prepare`]
/// validates it.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// A reference was never given a target before `prepare` ran.
    #[error("reference {reference:?} has no target element")]
    DanglingReference {
        /// The reference missing a target.
        reference: crate::reference::ReferenceId,
    },

    /// `prepare`'s graph walk reached an [`crate::element::ElementId`]
    /// that doesn't index any element in this grammar's arena — e.g. an
    /// id or axiom/skip borrowed from a different `Grammar`.
    #[error("element id {element:?} does not exist in this grammar")]
    InvalidElementId {
        /// The out-of-range id that was reached.
        element: crate::element::ElementId,
    },

    /// `prepare` was called before an axiom was set.
    #[error("grammar has no axiom element")]
    NoAxiom,

    /// The graph contains a cycle reachable purely through non-consuming
    /// paths (an element that can match empty and, directly or
    /// indirectly, refers back to itself without ever consuming input).
    #[error("grammar contains a cycle through non-consuming elements starting at {element:?}")]
    NonConsumingCycle {
        /// The element at which the cycle was detected.
        element: crate::element::ElementId,
    },

    /// Two named elements were registered under the same name while the
    /// grammar's strict-naming mode was enabled.
    #[error("the name {name:?} is already registered in this grammar")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// A `Token` element's regex failed to compile.
    #[error("failed to compile token regex {pattern:?}: {source}")]
    InvalidTokenRegex {
        /// The offending pattern.
        pattern: String,
        /// The underlying compilation error.
        #[source]
        source: regex::Error,
    },

    /// A reference's cardinality was set to a value that makes no sense
    /// for the place it's used (reserved for future cardinality kinds;
    /// no combinator in this crate currently constructs this variant,
    /// but host code manipulating references directly can).
    #[error("invalid cardinality for reference {reference:?}")]
    InvalidCardinality {
        /// The malformed reference.
        reference: crate::reference::ReferenceId,
    },
}

/// Errors raised opening or reading an input source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to open or read the path passed to `parse_path`.
    #[error("failed to read input from {path:?}: {source}")]
    Io {
        /// The path that failed to open/read.
        path: std::path::PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}
