//! Word-level Markov chain phrase generation library.
//!
//! This crate provides:
//! - A sorted, deduplicating token index with a frozen query phase
//! - A line-by-line stream tokenizer
//! - A prefix -> suffix chain built in three passes over a corpus
//! - Frequency-weighted phrase generation with an injectable RNG
//!
//! # Example
//!
//! ```
//! use rs_markov_core::model::chain::Chain;
//!
//! let mut chain = Chain::new(2).unwrap();
//! chain.build("foo bar baz\nfoo bar qux".as_bytes()).unwrap();
//! let phrase = chain.generate(10).unwrap();
//! assert!(phrase.starts_with("foo bar"));
//! ```

/// Chain model, token index, tokenizer and generation logic.
pub mod model;

/// Error type shared by the build pipeline and the generator.
pub mod error;

/// File helpers used by the binaries to locate and open corpora.
pub mod io;

pub use error::ChainError;
pub use model::chain::Chain;
pub use model::generator::Generator;
