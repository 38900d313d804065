//! Algebraic notation.

pub mod san;

pub use san::{format_san, parse_san, SanError};
