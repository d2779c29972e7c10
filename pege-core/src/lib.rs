/*!
`pege-core` is a runtime-assembled Parsing Expression Grammar engine: a
host builds a [`grammar::Grammar`] out of words, tokens, groups, rules,
conditions and procedures, links them with [`reference::Reference`]s,
calls [`grammar::Grammar::prepare`], and matches it against an input
with [`grammar::Grammar::parse_string`] (or `parse_path`/
`parse_iterator` for streamed sources) to get back a [`result::ParsingResult`]
wrapping a [`match_tree::Match`] tree.

It is a direct recognizer with memoization, not a compiled LL/LR/GLR
parser: it doesn't produce an AST, and it doesn't tokenize ahead of
time — the grammar itself drives tokenization through regex-backed
[`element::ElementKind::Token`] elements.

# Example

```
use pege_core::grammar::{Child, Grammar};

let mut g = Grammar::new();
let word = g.word("greeting", "hello").unwrap();
g.set_axiom(word);
g.prepare().unwrap();

let result = g.parse_string("hello");
assert!(result.is_success());
let m = result.root_match().unwrap();
assert_eq!((m.offset(), m.length()), (0, 5));
```
*/

#![deny(missing_docs)]

pub mod context;
pub mod element;
pub mod error;
pub mod grammar;
pub mod iterator;
pub mod match_tree;
pub mod memo;
pub mod recognize;
pub mod reference;
pub mod result;
pub mod stats;
