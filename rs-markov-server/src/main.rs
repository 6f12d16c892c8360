use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use log::{error, info};
use serde::Deserialize;

use rs_markov_core::io::{list_files, open_corpus};
use rs_markov_core::{Chain, ChainError, Generator};

mod config;

use config::{MAX_LENGTH, MAX_PREFIX_LENGTH, ServerConfig};

/// Query parameters of `/v1/generate`
#[derive(Deserialize)]
struct GenerateParams {
	max_length: Option<usize>,
	count: Option<usize>,
}

/// Query parameters of `/v1/load_corpus`
#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
	prefix_length: Option<usize>,
}

/// A built chain and the corpus it came from.
struct LoadedCorpus {
	name: String,
	chain: Chain,
}

/// State shared by every worker. The chain is only written when a new
/// corpus is swapped in; generation takes a read lock.
struct AppState {
	config: ServerConfig,
	corpus: RwLock<Option<LoadedCorpus>>,
}

/// Upper bound on `count`, keeps a single request from hogging a worker
const MAX_COUNT: usize = 100;

/// Builds a chain from `<data>/<name>.txt`.
fn load_corpus(config: &ServerConfig, name: &str, prefix_length: usize) -> Result<LoadedCorpus, ChainError> {
	let mut chain = Chain::new(prefix_length)?;
	chain.build(open_corpus(config.corpus_path(name))?)?;
	info!(
		"loaded corpus {name}: {} tokens, {} states, prefix length {prefix_length}",
		chain.tokens().len(),
		chain.state_count()
	);
	Ok(LoadedCorpus { name: name.to_owned(), chain })
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` phrases (default 1) of at most `max_length` tokens,
/// one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<AppState>, query: web::Query<GenerateParams>) -> impl Responder {
	let max_length = query.max_length.unwrap_or(data.config.max_length);
	let count = query.count.unwrap_or(1);
	if count == 0 || count > MAX_COUNT {
		return HttpResponse::BadRequest().body(format!("count must be between 1 and {MAX_COUNT}"));
	}
	if max_length > MAX_LENGTH {
		return HttpResponse::BadRequest().body(format!("max_length must be at most {MAX_LENGTH}"));
	}

	let corpus = match data.corpus.read() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	let Some(loaded) = corpus.as_ref() else {
		return HttpResponse::Conflict().body("No corpus loaded");
	};

	let mut generator = Generator::new(&loaded.chain);
	let phrases: Result<Vec<String>, ChainError> = generator.phrases(max_length).take(count).collect();
	match phrases {
		Ok(phrases) => HttpResponse::Ok().body(phrases.join("\n")),
		Err(e @ ChainError::MaxLengthTooShort { .. }) => HttpResponse::BadRequest().body(e.to_string()),
		Err(e @ ChainError::NoStartingPrefix) => HttpResponse::Conflict().body(e.to_string()),
		Err(e) => {
			error!("generation failed on {}: {e}", loaded.name);
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP GET endpoint `/v1/corpora`, lists the corpora of the data folder.
#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<AppState>) -> impl Responder {
	match list_files(&data.config.data_dir, "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n")),
		Err(e) => {
			error!("failed to list {}: {e}", data.config.data_dir.display());
			HttpResponse::InternalServerError().body("Failed to list corpora")
		}
	}
}

#[get("/v1/loaded_corpus")]
async fn get_loaded_corpus(data: web::Data<AppState>) -> impl Responder {
	let corpus = match data.corpus.read() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Corpus lock failed"),
	};
	match corpus.as_ref() {
		Some(loaded) => HttpResponse::Ok().body(format!(
			"{}\nprefix_length: {}\ntokens: {}\nstates: {}\nstarting_prefixes: {}",
			loaded.name,
			loaded.chain.prefix_length(),
			loaded.chain.tokens().len(),
			loaded.chain.state_count(),
			loaded.chain.starting_prefixes().len()
		)),
		None => HttpResponse::NotFound().body("No corpus loaded"),
	}
}

/// HTTP PUT endpoint `/v1/load_corpus`
///
/// Builds a new chain from the named corpus and swaps it in. The previous
/// chain keeps serving until the new one is built.
#[put("/v1/load_corpus")]
async fn put_corpus(data: web::Data<AppState>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};
	if name.contains(['/', '\\']) || name.starts_with('.') {
		return HttpResponse::BadRequest().body("Invalid corpus name");
	}
	let prefix_length = query.prefix_length.unwrap_or(data.config.prefix_length);
	if !(1..=MAX_PREFIX_LENGTH).contains(&prefix_length) {
		return HttpResponse::BadRequest().body(format!("prefix_length must be between 1 and {MAX_PREFIX_LENGTH}"));
	}

	let state = data.clone();
	let loaded = match web::block(move || load_corpus(&state.config, &name, prefix_length)).await {
		Ok(Ok(loaded)) => loaded,
		Ok(Err(ChainError::Io(e))) if e.kind() == std::io::ErrorKind::NotFound => {
			return HttpResponse::NotFound().body("Unknown corpus");
		}
		Ok(Err(e @ ChainError::InvalidPrefixLength)) => return HttpResponse::BadRequest().body(e.to_string()),
		Ok(Err(e)) => {
			error!("failed to load corpus: {e}");
			return HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}"));
		}
		Err(_) => return HttpResponse::InternalServerError().body("Corpus loader failed"),
	};

	match data.corpus.write() {
		Ok(mut corpus) => {
			*corpus = Some(loaded);
			HttpResponse::Ok().body("Corpus loaded successfully")
		}
		Err(_) => HttpResponse::InternalServerError().body("Corpus lock failed"),
	}
}

fn app_state(config: ServerConfig) -> anyhow::Result<AppState> {
	let corpus = match &config.corpus {
		Some(name) => Some(load_corpus(&config, name, config.prefix_length)?),
		None => None,
	};
	Ok(AppState { config, corpus: RwLock::new(corpus) })
}

/// Main entry point for the server.
///
/// Reads the configuration from the environment, optionally builds the
/// startup corpus, and serves the endpoints on `RS_MARKOV_HOST:RS_MARKOV_PORT`.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env()?;
	let (host, port, workers) = (config.host.clone(), config.port, config.workers);
	let state = web::Data::new(app_state(config)?);

	info!("listening on {host}:{port} with {workers} workers");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(state.clone())
			.service(get_generated)
			.service(get_corpora)
			.service(put_corpus)
			.service(get_loaded_corpus)
	})
		.workers(workers)
		.bind((host, port))?
		.run()
		.await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use actix_web::http::StatusCode;
	use actix_web::test;

	use super::*;

	fn state_with(corpus: Option<(&str, usize, &str)>) -> web::Data<AppState> {
		let corpus = corpus.map(|(name, prefix_length, text)| {
			let mut chain = Chain::new(prefix_length).unwrap();
			chain.build(text.as_bytes()).unwrap();
			LoadedCorpus { name: name.to_owned(), chain }
		});
		web::Data::new(AppState { config: ServerConfig::default(), corpus: RwLock::new(corpus) })
	}

	#[actix_web::test]
	async fn generate_returns_count_phrases() {
		let state = state_with(Some(("abc", 2, "a b c\na b d")));
		let app = test::init_service(App::new().app_data(state).service(get_generated)).await;

		let req = test::TestRequest::get().uri("/v1/generate?max_length=3&count=4").to_request();
		let body = test::call_and_read_body(&app, req).await;
		let body = std::str::from_utf8(&body).unwrap();

		let phrases: Vec<&str> = body.lines().collect();
		assert_eq!(phrases.len(), 4);
		assert!(phrases.iter().all(|p| *p == "a b c" || *p == "a b d"), "{phrases:?}");
	}

	#[actix_web::test]
	async fn generate_without_corpus_is_a_conflict() {
		let app = test::init_service(App::new().app_data(state_with(None)).service(get_generated)).await;

		let req = test::TestRequest::get().uri("/v1/generate").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn generate_rejects_bad_parameters() {
		let app = test::init_service(
			App::new().app_data(state_with(Some(("abc", 2, "a b c")))).service(get_generated),
		)
		.await;

		let req = test::TestRequest::get().uri("/v1/generate?max_length=1").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri("/v1/generate?count=0").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri("/v1/generate?max_length=10000000000&count=100").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri(&format!("/v1/generate?max_length={MAX_LENGTH}")).to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
	}

	#[actix_web::test]
	async fn corpus_without_starting_state_is_a_conflict() {
		let app = test::init_service(
			App::new().app_data(state_with(Some(("short", 3, "a b\nc")))).service(get_generated),
		)
		.await;

		let req = test::TestRequest::get().uri("/v1/generate").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn load_corpus_rejects_path_like_names() {
		let app = test::init_service(App::new().app_data(state_with(None)).service(put_corpus)).await;

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=../etc").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::put().uri("/v1/load_corpus").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn load_corpus_rejects_out_of_range_prefix_lengths() {
		let app = test::init_service(App::new().app_data(state_with(None)).service(put_corpus)).await;

		for prefix_length in ["0", "17", "18446744073709551615"] {
			let uri = format!("/v1/load_corpus?name=tiny&prefix_length={prefix_length}");
			let req = test::TestRequest::put().uri(&uri).to_request();
			assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST, "{prefix_length}");
		}
	}

	#[actix_web::test]
	async fn load_corpus_swaps_the_chain() {
		let dir = std::env::temp_dir().join(format!("rs-markov-server-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		std::fs::write(dir.join("tiny.txt"), "x y z\n").unwrap();

		let config = ServerConfig { data_dir: dir.clone(), ..ServerConfig::default() };
		let state = web::Data::new(AppState { config, corpus: RwLock::new(None) });
		let app = test::init_service(
			App::new().app_data(state.clone()).service(put_corpus).service(get_loaded_corpus),
		)
		.await;

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=tiny&prefix_length=1").to_request();
		let status = test::call_service(&app, req).await.status();

		let req = test::TestRequest::put().uri("/v1/load_corpus?name=missing").to_request();
		let missing = test::call_service(&app, req).await.status();
		std::fs::remove_dir_all(&dir).unwrap();

		assert_eq!(status, StatusCode::OK);
		assert_eq!(missing, StatusCode::NOT_FOUND);
		let corpus = state.corpus.read().unwrap();
		let loaded = corpus.as_ref().unwrap();
		assert_eq!(loaded.name, "tiny");
		assert_eq!(loaded.chain.prefix_length(), 1);
		assert_eq!(loaded.chain.generate(3).unwrap(), "x y z");
	}
}
