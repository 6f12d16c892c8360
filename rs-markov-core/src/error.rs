use thiserror::Error;

/// Errors produced while building a chain or generating from it.
///
/// Read failures and an unusable chain are recoverable and surface here.
/// A token missing from a sealed index during the final build pass is not:
/// it means the replayed streams disagree, and the build panics instead.
#[derive(Error, Debug)]
pub enum ChainError {
	#[error("failed to read corpus: {0}")]
	Io(#[from] std::io::Error),

	#[error("prefix length must be >= 1")]
	InvalidPrefixLength,

	#[error("chain has already been built")]
	AlreadyBuilt,

	#[error("chain has no starting prefix, build it from a corpus with at least one usable line")]
	NoStartingPrefix,

	#[error("sentence must begin with at least {expected} tokens, got {found}")]
	MalformedStartingPrefix { expected: usize, found: usize },

	#[error("max length {max_length} is shorter than the prefix length {prefix_length}")]
	MaxLengthTooShort { max_length: usize, prefix_length: usize },

	#[error("position {position} out of range for index of length {len}")]
	PositionOutOfRange { position: usize, len: usize },
}
