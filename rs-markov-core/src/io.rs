use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Opens a corpus file for [`Chain::build`](crate::Chain::build).
pub fn open_corpus<P: AsRef<Path>>(filename: P) -> io::Result<BufReader<File>> {
	Ok(BufReader::new(File::open(filename)?))
}

/// Name a corpus is served under: the file stem of its path.
///
/// `None` when the path has no stem or the stem is not UTF-8, since such a
/// corpus could never be requested by name.
pub fn corpus_name<P: AsRef<Path>>(path: P) -> Option<String> {
	path.as_ref().file_stem().and_then(OsStr::to_str).map(str::to_owned)
}

/// Resolves the folder corpora are read from.
///
/// Blank input and `.`/`./` mean the current working directory; anything
/// else is taken as given, without canonicalizing.
pub fn resolve_data_dir(input: &str) -> PathBuf {
	match input.trim() {
		"" | "." | "./" => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
		dir => PathBuf::from(dir),
	}
}

/// Lists the corpus names of every `extension` file directly in `dir`, sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut names = Vec::new();
	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if !path.is_file() || path.extension() != Some(OsStr::new(extension)) {
			continue;
		}
		names.extend(corpus_name(&path));
	}

	names.sort();
	Ok(names)
}
