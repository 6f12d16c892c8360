use std::collections::HashMap;
use std::io::Read;

use log::{debug, warn};

use super::generator::Generator;
use super::index::{Index, IndexBuilder};
use super::stream::{DELIM, TeeReader, process_stream};
use crate::error::ChainError;

/// A word-level Markov chain.
///
/// A `Chain` maps every prefix (`prefix_length` consecutive tokens joined by
/// [`DELIM`]) to the positions of the tokens observed right after it. A
/// position is stored once per observation, so drawing uniformly from the
/// list is a frequency-weighted draw over the suffixes.
///
/// Starting prefixes (the first tokens of each corpus line) are tracked the
/// same way, as positions into a second index.
///
/// ## Lifecycle
/// - Created empty by [`Chain::new`]
/// - Populated once by [`Chain::build`]
/// - Read-only afterwards; [`Chain::generate`] and [`Generator`] only borrow it
///
/// ## Invariants
/// - Every position in `transitions` is valid for `tokens`
/// - Every position in `starting_frequencies` is valid for `starting_prefixes`
#[derive(Clone, Debug)]
pub struct Chain {
	/// Number of tokens in a prefix, >= 1
	prefix_length: usize,

	/// Every token of the corpus
	tokens: Index,

	/// Every distinct starting prefix of the corpus
	starting_prefixes: Index,

	/// Prefix -> suffix positions into `tokens`, duplicated by frequency
	transitions: HashMap<String, Vec<u32>>,

	/// Positions into `starting_prefixes`, one per line that has a transition
	starting_frequencies: Vec<u32>,

	built: bool,
}

impl Chain {
	/// Creates an empty chain using prefixes of `prefix_length` tokens.
	///
	/// # Errors
	/// Returns [`ChainError::InvalidPrefixLength`] if `prefix_length` is 0.
	pub fn new(prefix_length: usize) -> Result<Self, ChainError> {
		if prefix_length == 0 {
			return Err(ChainError::InvalidPrefixLength);
		}
		Ok(Self {
			prefix_length,
			tokens: Index::default(),
			starting_prefixes: Index::default(),
			transitions: HashMap::new(),
			starting_frequencies: Vec::new(),
			built: false,
		})
	}

	/// Builds the chain from a stream of `\n` separated phrases.
	///
	/// The stream is read once. While the token index is built, every byte
	/// is captured so the starting prefix index and the transitions can be
	/// built from a replay, with the token index already sealed.
	///
	/// # Errors
	/// - [`ChainError::AlreadyBuilt`] if the chain was built before
	/// - [`ChainError::Io`] on the first read failure
	///
	/// # Panics
	/// If a token or starting prefix seen in the last pass is missing from
	/// its index. Both indexes are built from the same bytes, so this only
	/// happens if that guarantee is broken.
	pub fn build<R: Read>(&mut self, reader: R) -> Result<(), ChainError> {
		if self.built {
			return Err(ChainError::AlreadyBuilt);
		}

		let mut tee = TeeReader::new(reader);
		let tokens = Self::build_token_index(&mut tee)?;
		let corpus = tee.into_captured();
		debug!("token index built: {} tokens from {} bytes", tokens.len(), corpus.len());

		let starting_prefixes = self.build_prefix_index(corpus.as_slice())?;
		debug!("starting prefix index built: {} prefixes", starting_prefixes.len());

		let (transitions, starting_frequencies) =
			self.build_transitions(corpus.as_slice(), &tokens, &starting_prefixes)?;
		debug!(
			"transitions built: {} states, {} starting lines",
			transitions.len(),
			starting_frequencies.len()
		);
		if starting_frequencies.is_empty() {
			warn!("corpus has no line longer than {} tokens, nothing can be generated", self.prefix_length);
		}

		self.tokens = tokens;
		self.starting_prefixes = starting_prefixes;
		self.transitions = transitions;
		self.starting_frequencies = starting_frequencies;
		self.built = true;
		Ok(())
	}

	/// Pass 1: every token of every line.
	fn build_token_index<R: Read>(reader: R) -> Result<Index, ChainError> {
		let mut builder = IndexBuilder::new();
		process_stream(reader, |tokens| {
			for token in tokens {
				builder.add(token);
			}
		})?;
		Ok(builder.freeze())
	}

	/// Pass 2: the first `prefix_length` tokens of every long enough line.
	fn build_prefix_index<R: Read>(&self, reader: R) -> Result<Index, ChainError> {
		let mut builder = IndexBuilder::new();
		process_stream(reader, |tokens| {
			if tokens.len() >= self.prefix_length {
				builder.add(&tokens[..self.prefix_length].join(DELIM));
			}
		})?;
		Ok(builder.freeze())
	}

	/// Pass 3: slides a window of `prefix_length + 1` tokens over every line,
	/// recording prefix -> suffix, and the starting prefix of every line that
	/// has at least one window.
	fn build_transitions<R: Read>(
		&self,
		reader: R,
		tokens: &Index,
		starting_prefixes: &Index,
	) -> Result<(HashMap<String, Vec<u32>>, Vec<u32>), ChainError> {
		let mut transitions: HashMap<String, Vec<u32>> = HashMap::new();
		let mut starting_frequencies = Vec::new();

		process_stream(reader, |line| {
			// Nothing follows the prefix; also keeps `prefix_length + 1` in range
			if line.len() <= self.prefix_length {
				return;
			}
			for (i, window) in line.windows(self.prefix_length + 1).enumerate() {
				let (prefix, suffix) = window.split_at(self.prefix_length);
				let prefix = prefix.join(DELIM);
				let suffix = suffix[0];

				let suffix_i = tokens
					.find(suffix)
					.unwrap_or_else(|| panic!("can't find token {suffix:?} in index"));

				if i == 0 {
					let starting_i = starting_prefixes
						.find(&prefix)
						.unwrap_or_else(|| panic!("can't find starting prefix {prefix:?} in index"));
					starting_frequencies.push(starting_i);
				}

				transitions.entry(prefix).or_default().push(suffix_i);
			}
		})?;

		Ok((transitions, starting_frequencies))
	}

	/// Generates a phrase of at most `max_length` tokens using the thread
	/// local RNG.
	///
	/// See [`Generator::generate`].
	pub fn generate(&self, max_length: usize) -> Result<String, ChainError> {
		Generator::new(self).generate(max_length)
	}

	/// Like [`Chain::generate`], but panics on error.
	pub fn must_generate(&self, max_length: usize) -> String {
		Generator::new(self).must_generate(max_length)
	}

	pub fn prefix_length(&self) -> usize {
		self.prefix_length
	}

	/// Sorted index of every corpus token.
	pub fn tokens(&self) -> &Index {
		&self.tokens
	}

	/// Sorted index of every distinct starting prefix.
	pub fn starting_prefixes(&self) -> &Index {
		&self.starting_prefixes
	}

	/// Suffix positions (into [`Chain::tokens`]) recorded for `prefix`.
	pub fn transitions(&self, prefix: &str) -> Option<&[u32]> {
		self.transitions.get(prefix).map(Vec::as_slice)
	}

	/// Starting prefix positions (into [`Chain::starting_prefixes`]), one per
	/// corpus line that contributed a transition.
	pub fn starting_frequencies(&self) -> &[u32] {
		&self.starting_frequencies
	}

	/// Number of distinct prefixes with at least one suffix.
	pub fn state_count(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_built(&self) -> bool {
		self.built
	}
}
