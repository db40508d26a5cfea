//! Front end (spec §6.2, supplemented per §11).
//!
//! Full multi-dialect parsing (native Graph::Easy text, Graphviz DOT,
//! VCG/GDL) is out of the layout engine's core per spec §1; this module
//! implements the *interface* §6.2 specifies — ordered node insertion,
//! deterministic edge ids, one `set_attribute` call per (object, name)
//! pair — with a small line-oriented grammar so the engine is exercisable
//! end-to-end without hand-building a `Graph` in Rust.

pub mod native;

pub use native::parse;
