/*!
`pege` is the host-ergonomics layer over [`pege_core`]: processor
dispatch (walk a completed match tree and fold it into a host value
through handlers keyed by element id) and debugging serialization
(JSON/XML dumps of a match tree, and a textual diagnostics report).

`pege_core` never needs this crate; `pege` only ever reads the types it
exposes.
*/

#![deny(missing_docs)]

pub mod diagnostics;
pub mod process;
pub mod serialize;

pub use pege_core;
