//! Top-level module for the Markov chain phrase generator.
//!
//! This module provides:
//! - A sorted token index, mutable while building and frozen afterwards (`index`)
//! - A line-by-line stream tokenizer (`stream`)
//! - The prefix -> suffix chain and its three-pass build (`chain`)
//! - Weighted random phrase generation (`generator`)

/// Word-level Markov chain.
///
/// Builds the token index, the starting prefix index and the transition
/// table from a byte stream, then serves read-only lookups.
pub mod chain;

/// Phrase generation over a built chain with an injectable RNG.
pub mod generator;

/// Sorted, deduplicated token sets (`IndexBuilder` and the frozen `Index`).
pub mod index;

/// Line-by-line, space-split stream processing.
pub mod stream;
