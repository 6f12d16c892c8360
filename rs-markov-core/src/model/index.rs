use std::fmt;

use crate::error::ChainError;

/// Mutable, insert-only set of tokens kept as a sorted vector.
///
/// Positions shift every time a token lands before existing ones, so no
/// position should be captured until the builder is frozen into an [`Index`].
///
/// ## Invariants
/// - `tokens` is strictly ascending (sorted, no duplicates)
#[derive(Clone, Debug, Default)]
pub struct IndexBuilder {
	tokens: Vec<String>,
}

impl IndexBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `token` at its sorted position, if not already present.
	///
	/// Binary search makes the lookup O(log n); the insert itself shifts
	/// the right hand side up and is O(n).
	pub fn add(&mut self, token: &str) {
		if let Err(i) = self.search(token) {
			self.tokens.insert(i, token.to_owned());
		}
	}

	/// Returns true if `token` has been added.
	pub fn contains(&self, token: &str) -> bool {
		self.search(token).is_ok()
	}

	/// Seals the builder. Positions are stable from here on.
	pub fn freeze(self) -> Index {
		Index { tokens: self.tokens }
	}

	fn search(&self, token: &str) -> Result<usize, usize> {
		self.tokens.binary_search_by(|probe| probe.as_str().cmp(token))
	}
}

/// Frozen, query-only set of tokens.
///
/// Positions returned by [`Index::find`] are valid for [`Index::get`] for
/// the lifetime of the index, which is what lets the chain store `u32`
/// positions instead of duplicated strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
	tokens: Vec<String>,
}

impl Index {
	/// Returns the token at `position`.
	///
	/// # Errors
	/// Returns [`ChainError::PositionOutOfRange`] if `position >= len()`.
	pub fn get(&self, position: usize) -> Result<&str, ChainError> {
		self.tokens
			.get(position)
			.map(String::as_str)
			.ok_or(ChainError::PositionOutOfRange { position, len: self.tokens.len() })
	}

	/// Searches for `token` in O(log n) and returns its position.
	///
	/// Matching is exact and case-sensitive. Returns `None` if `token` is not
	/// present.
	pub fn find(&self, token: &str) -> Option<u32> {
		self.tokens
			.binary_search_by(|probe| probe.as_str().cmp(token))
			.ok()
			.and_then(|i| u32::try_from(i).ok())
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Sorted view of every token.
	pub fn as_slice(&self) -> &[String] {
		&self.tokens
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.tokens.iter().map(String::as_str)
	}
}

impl fmt::Display for Index {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for token in self.iter() {
			write!(f, "\n{token}")?;
		}
		writeln!(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn frozen(tokens: &[&str]) -> Index {
		let mut builder = IndexBuilder::new();
		for token in tokens {
			builder.add(token);
		}
		builder.freeze()
	}

	#[test]
	fn add_keeps_tokens_sorted_and_unique() {
		let mut builder = IndexBuilder::new();
		let examples: [(&str, &[&str]); 6] = [
			("foo", &["foo"]),
			("foo", &["foo"]),
			("hello", &["foo", "hello"]),
			("abc", &["abc", "foo", "hello"]),
			("boo", &["abc", "boo", "foo", "hello"]),
			("boo", &["abc", "boo", "foo", "hello"]),
		];

		for (token, expected) in examples {
			builder.add(token);
			assert_eq!(builder.tokens, expected, "after adding {token:?}");
		}
		assert!(builder.contains("boo"));
		assert!(!builder.contains("bo"));
	}

	#[test]
	fn get_returns_token_at_position() {
		let index = frozen(&["abc", "boo", "foo", "hello"]);

		assert_eq!(index.get(0).unwrap(), "abc");
		assert_eq!(index.get(2).unwrap(), "foo");
		assert_eq!(index.get(3).unwrap(), "hello");
	}

	#[test]
	fn get_out_of_range_is_an_error() {
		let index = frozen(&["abc", "boo"]);

		match index.get(2) {
			Err(ChainError::PositionOutOfRange { position, len }) => {
				assert_eq!(position, 2);
				assert_eq!(len, 2);
			}
			other => panic!("expected out of range error, got {other:?}"),
		}
		assert!(Index::default().get(0).is_err());
	}

	#[test]
	fn find_is_exact_and_case_sensitive() {
		let index = frozen(&["abc", "boo", "foo", "hello"]);

		assert_eq!(index.find("foo"), Some(2));
		assert_eq!(index.find("hello"), Some(3));
		assert_eq!(index.find("HELLO"), None);
		assert_eq!(index.find("fo"), None);
		assert_eq!(index.find("abc"), Some(0));
		assert_eq!(index.find("zzz"), None);
	}

	#[test]
	fn empty_string_is_an_ordinary_token() {
		let index = frozen(&["b", "", "a"]);

		assert_eq!(index.as_slice(), ["", "a", "b"]);
		assert_eq!(index.find(""), Some(0));
		assert_eq!(index.iter().collect::<Vec<_>>(), ["", "a", "b"]);
	}

	#[test]
	fn display_renders_one_token_per_line() {
		let index = frozen(&["b", "a"]);
		assert_eq!(index.to_string(), "\na\nb\n");
		assert_eq!(Index::default().to_string(), "\n");
	}
}
