//! The `.za` program document: the translator's output and the data path's
//! input.

mod parser;
mod program;

pub use program::{DataEntry, Program};
