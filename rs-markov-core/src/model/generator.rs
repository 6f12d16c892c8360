use log::trace;
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

use super::chain::Chain;
use super::stream::DELIM;
use crate::error::ChainError;

/// Generates phrases by walking a built [`Chain`].
///
/// # Responsibilities
/// - Pick a starting prefix, weighted by how many corpus lines begin with it
/// - Repeatedly pick a suffix for the last `prefix_length` tokens, weighted
///   by how often it followed them in the corpus
///
/// The RNG is injected so callers can choose between the non-deterministic
/// thread local generator ([`Generator::new`]) and a seeded one
/// ([`Generator::from_seed`], [`Generator::with_rng`]).
#[derive(Debug)]
pub struct Generator<'a, R = ThreadRng> {
	chain: &'a Chain,
	rng: R,
}

impl<'a> Generator<'a, ThreadRng> {
	/// Creates a generator backed by the thread local RNG.
	pub fn new(chain: &'a Chain) -> Self {
		Self::with_rng(chain, rand::rng())
	}
}

impl<'a> Generator<'a, StdRng> {
	/// Creates a reproducible generator seeded with `seed`.
	pub fn from_seed(chain: &'a Chain, seed: u64) -> Self {
		Self::with_rng(chain, StdRng::seed_from_u64(seed))
	}
}

impl<'a, R: Rng> Generator<'a, R> {
	/// Creates a generator drawing from `rng`.
	pub fn with_rng(chain: &'a Chain, rng: R) -> Self {
		Self { chain, rng }
	}

	/// Generates a phrase of at most `max_length` tokens.
	///
	/// The phrase always starts with a starting prefix of the corpus and may
	/// stop early, when the current prefix was never followed by anything.
	///
	/// # Errors
	/// - [`ChainError::MaxLengthTooShort`] if `max_length` is less than the
	///   prefix length
	/// - [`ChainError::NoStartingPrefix`] if the chain is not built, or its
	///   corpus had no line longer than the prefix length
	/// - [`ChainError::MalformedStartingPrefix`] if a starting prefix does not
	///   split back into `prefix_length` tokens
	pub fn generate(&mut self, max_length: usize) -> Result<String, ChainError> {
		let prefix_length = self.chain.prefix_length();
		if max_length < prefix_length {
			return Err(ChainError::MaxLengthTooShort { max_length, prefix_length });
		}

		let starting = self.chain.starting_frequencies();
		if starting.is_empty() {
			return Err(ChainError::NoStartingPrefix);
		}

		// Starting prefixes are duplicated by frequency
		let i = starting[self.rng.random_range(0..starting.len())];
		let prefix = self.chain.starting_prefixes().get(i as usize)?;
		let mut sentence: Vec<&str> = prefix.split(DELIM).collect();

		if sentence.len() < prefix_length {
			return Err(ChainError::MalformedStartingPrefix {
				expected: prefix_length,
				found: sentence.len(),
			});
		}

		while sentence.len() < max_length {
			let key = sentence[sentence.len() - prefix_length..].join(DELIM);
			let suffixes = match self.chain.transitions(&key) {
				Some(suffixes) if !suffixes.is_empty() => suffixes,
				_ => break,
			};

			// Suffixes are duplicated too
			let i = suffixes[self.rng.random_range(0..suffixes.len())];
			sentence.push(self.chain.tokens().get(i as usize)?);
		}

		trace!("generated {} tokens (max {})", sentence.len(), max_length);
		Ok(sentence.join(DELIM))
	}

	/// Like [`Generator::generate`], but panics on error.
	///
	/// Meant for call sites that have no way to recover, such as a CLI.
	pub fn must_generate(&mut self, max_length: usize) -> String {
		match self.generate(max_length) {
			Ok(phrase) => phrase,
			Err(e) => panic!("phrase generation failed: {e}"),
		}
	}

	/// Endless iterator of generated phrases; combine with `take`.
	pub fn phrases(&mut self, max_length: usize) -> impl Iterator<Item = Result<String, ChainError>> + '_ {
		std::iter::repeat_with(move || self.generate(max_length))
	}
}
