//! # docrag-chunker
//!
//! Splits document text into overlapping windows for embedding.
//!
//! The splitter walks the text in windows of at most `size` characters, each
//! window starting `overlap` characters before the previous window's end so
//! that sentences cut at a window boundary are still seen whole in the next
//! window. Window ends prefer a nearby paragraph, sentence, or word boundary
//! over a hard mid-word cut.

mod splitter;

pub use splitter::chunk;
