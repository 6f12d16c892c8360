use std::io::{self, BufRead, BufReader, Read};

/// Separator between tokens, and between the tokens of a joined prefix.
pub const DELIM: &str = " ";

/// Splits a trimmed line into tokens on [`DELIM`].
///
/// Consecutive spaces yield empty tokens, and an empty line yields a single
/// empty token.
pub fn tokenize(line: &str) -> Vec<&str> {
	line.trim().split(DELIM).collect()
}

/// Consumes `reader` line by line, handing the tokens of each line to
/// `process_tokens`.
///
/// - Lines end at `\n`; the last line need not be terminated.
/// - Bytes are decoded as UTF-8, invalid sequences are replaced.
/// - The callback also sees whatever follows the final newline, which is an
///   empty line (a single `""` token) when the stream ends with `\n`.
///
/// End of stream is not an error. Any other read failure is returned as is.
pub fn process_stream<R, F>(reader: R, mut process_tokens: F) -> io::Result<()>
where
	R: Read,
	F: FnMut(&[&str]),
{
	let mut reader = BufReader::new(reader);
	let mut line = Vec::new();
	loop {
		line.clear();
		// read_until retries on Interrupted
		let read = reader.read_until(b'\n', &mut line)?;
		let eof = read == 0 || line.last() != Some(&b'\n');

		let text = String::from_utf8_lossy(&line);
		process_tokens(&tokenize(&text));

		if eof {
			return Ok(());
		}
	}
}

/// Reader that keeps a copy of every byte read through it, so the stream
/// can be replayed once the first pass is done.
pub(crate) struct TeeReader<R> {
	inner: R,
	captured: Vec<u8>,
}

impl<R: Read> TeeReader<R> {
	pub(crate) fn new(inner: R) -> Self {
		Self { inner, captured: Vec::new() }
	}

	/// Everything read so far.
	pub(crate) fn into_captured(self) -> Vec<u8> {
		self.captured
	}
}

impl<R: Read> Read for TeeReader<R> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let read = self.inner.read(buf)?;
		self.captured.extend_from_slice(&buf[..read]);
		Ok(read)
	}
}
