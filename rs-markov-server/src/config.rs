//! Server configuration, read from `RS_MARKOV_*` environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};

use rs_markov_core::io::resolve_data_dir;

/// Largest `max_length` a request or the configuration may ask for
pub const MAX_LENGTH: usize = 1000;

/// Largest prefix length a corpus may be loaded with
pub const MAX_PREFIX_LENGTH: usize = 16;

/// Runtime settings of the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Number of actix workers, one per logical CPU by default
	pub workers: usize,
	/// Folder holding the `.txt` corpora
	pub data_dir: PathBuf,
	/// Corpus loaded at startup, if any
	pub corpus: Option<String>,
	/// Prefix length used when a load request does not give one
	pub prefix_length: usize,
	/// Token cap used when a generate request does not give one
	pub max_length: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			workers: num_cpus::get(),
			data_dir: PathBuf::from("./data"),
			corpus: None,
			prefix_length: 2,
			max_length: 20,
		}
	}
}

impl ServerConfig {
	/// Loads the configuration from the process environment.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads the configuration from `lookup`, falling back to defaults for
	/// every missing key.
	///
	/// # Errors
	/// Returns an error if a value does not parse, if the worker count is
	/// zero, or if a length is outside `1..=MAX_PREFIX_LENGTH` / `1..=MAX_LENGTH`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(host) = lookup("RS_MARKOV_HOST") {
			config.host = host;
		}
		if let Some(port) = lookup("RS_MARKOV_PORT") {
			config.port = port.parse().with_context(|| format!("invalid RS_MARKOV_PORT {port:?}"))?;
		}
		if let Some(workers) = lookup("RS_MARKOV_WORKERS") {
			config.workers = workers.parse().with_context(|| format!("invalid RS_MARKOV_WORKERS {workers:?}"))?;
		}
		if let Some(data_dir) = lookup("RS_MARKOV_DATA") {
			config.data_dir = resolve_data_dir(&data_dir);
		}
		if let Some(corpus) = lookup("RS_MARKOV_CORPUS") {
			config.corpus = Some(corpus).filter(|c| !c.trim().is_empty());
		}
		if let Some(prefix_length) = lookup("RS_MARKOV_PREFIX_LENGTH") {
			config.prefix_length = prefix_length
				.parse()
				.with_context(|| format!("invalid RS_MARKOV_PREFIX_LENGTH {prefix_length:?}"))?;
		}
		if let Some(max_length) = lookup("RS_MARKOV_MAX_LENGTH") {
			config.max_length = max_length
				.parse()
				.with_context(|| format!("invalid RS_MARKOV_MAX_LENGTH {max_length:?}"))?;
		}

		ensure!(config.workers > 0, "RS_MARKOV_WORKERS must be >= 1");
		ensure!(
			(1..=MAX_PREFIX_LENGTH).contains(&config.prefix_length),
			"RS_MARKOV_PREFIX_LENGTH must be between 1 and {MAX_PREFIX_LENGTH}"
		);
		ensure!(
			(1..=MAX_LENGTH).contains(&config.max_length),
			"RS_MARKOV_MAX_LENGTH must be between 1 and {MAX_LENGTH}"
		);
		Ok(config)
	}

	/// Path of the corpus file named `name` in the data folder.
	pub fn corpus_path(&self, name: &str) -> PathBuf {
		self.data_dir.join(format!("{name}.txt"))
	}
}
