use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, post, web};
use rs_ngram_core::{ModelError, ModelHolder, ModelInfo, ModelStore, NGramModel, PredictionMethod};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::config::AppConfig;

/// The model currently served, with the logical name it was loaded as.
#[derive(Debug, Default)]
pub struct ActiveModel {
	pub name: String,
	pub model: NGramModel,
}

/// Shared application state. Requests read a snapshot of the active model;
/// a switch builds the new model first, then swaps it in.
pub struct AppState {
	pub config: AppConfig,
	pub store: ModelStore,
	pub active: ModelHolder<ActiveModel>,
}

impl AppState {
	pub fn new(config: AppConfig) -> Self {
		let store = ModelStore::new(config.models.directory.clone(), config.models.format);
		Self { config, store, active: ModelHolder::default() }
	}

	/// Loads the model registered under the logical `name`.
	pub fn load_alias(&self, name: &str) -> Result<NGramModel, SwitchError> {
		let stem = self.config.models.file_stem(name).ok_or_else(|| SwitchError::UnknownAlias(name.to_owned()))?;
		Ok(self.store.load_model(stem)?)
	}
}

/// Why a logical model name could not be loaded.
#[derive(Error, Debug)]
pub enum SwitchError {
	#[error("Unknown model name: {0}")]
	UnknownAlias(String),
	#[error(transparent)]
	Model(#[from] ModelError),
}

#[derive(Deserialize)]
struct PredictRequest {
	text: String,
	top_k: Option<usize>,
	method: Option<PredictionMethod>,
}

#[derive(Serialize)]
struct PredictResponse {
	input: String,
	top_k: usize,
	method: PredictionMethod,
	predictions: Vec<String>,
	model: String,
}

#[derive(Deserialize)]
struct SwitchRequest {
	model_name: String,
}

#[derive(Serialize)]
struct LoadedModelInfo {
	name: String,
	vocab_size: u64,
	total_tokens: u64,
	is_trained: bool,
}

#[derive(Serialize)]
struct ModelsResponse {
	models: Vec<ModelInfo>,
	total_models: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	loaded_model_info: Option<LoadedModelInfo>,
}

fn error_body(status: actix_web::http::StatusCode, detail: impl Into<String>) -> HttpResponse {
	HttpResponse::build(status).json(json!({ "detail": detail.into() }))
}

/// HTTP GET endpoint `/`
///
/// Reports whether a trained model is being served.
#[get("/")]
async fn root(data: web::Data<AppState>) -> impl Responder {
	let active = data.active.get();
	HttpResponse::Ok().json(json!({
		"message": "N-gram language model API is running",
		"model_loaded": active.model.is_trained(),
		"active_model": active.name,
	}))
}

/// HTTP GET endpoint `/models`
///
/// Lists the records found in the models directory, corrupted ones
/// included, plus statistics of the served model.
#[get("/models")]
async fn get_models(data: web::Data<AppState>) -> impl Responder {
	let store = data.store.clone();
	let listing = match web::block(move || store.list_available_models()).await {
		Ok(Ok(models)) => models,
		Ok(Err(e)) => return error_body(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
		Err(e) => return error_body(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
	};

	let active = data.active.get();
	let loaded_model_info = active.model.is_trained().then(|| LoadedModelInfo {
		name: active.name.clone(),
		vocab_size: active.model.vocab_size(),
		total_tokens: active.model.total_tokens(),
		is_trained: true,
	});

	HttpResponse::Ok().json(ModelsResponse { total_models: listing.len(), models: listing, loaded_model_info })
}

/// HTTP POST endpoint `/models/switch`
///
/// Loads another model by logical name and swaps it in once fully loaded.
#[post("/models/switch")]
async fn switch_model(data: web::Data<AppState>, request: web::Json<SwitchRequest>) -> impl Responder {
	let name = request.into_inner().model_name;

	let state = data.clone();
	let target = name.clone();
	let model = match web::block(move || state.load_alias(&target)).await {
		Ok(Ok(model)) => model,
		Ok(Err(SwitchError::UnknownAlias(_))) => {
			let available: Vec<&str> = data.config.models.aliases.keys().map(String::as_str).collect();
			return error_body(
				actix_web::http::StatusCode::BAD_REQUEST,
				format!("Invalid model name. Available models: {}", available.join(", ")),
			);
		}
		Ok(Err(SwitchError::Model(ModelError::ModelFileNotFound(path)))) => {
			return error_body(
				actix_web::http::StatusCode::NOT_FOUND,
				format!("Model file {} not found", path.display()),
			);
		}
		Ok(Err(SwitchError::Model(e))) => {
			error!(model = %name, error = %e, "model switch failed");
			return error_body(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, format!("Model switch failed: {e}"));
		}
		Err(e) => return error_body(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
	};

	let vocab_size = model.vocab_size();
	let total_tokens = model.total_tokens();
	data.active.set(ActiveModel { name: name.clone(), model });
	info!(model = %name, vocab_size, total_tokens, "switched active model");

	HttpResponse::Ok().json(json!({
		"message": format!("Successfully switched to {name} model"),
		"model_info": {
			"model_name": name,
			"vocab_size": vocab_size,
			"total_tokens": total_tokens,
		}
	}))
}

/// HTTP POST endpoint `/predict`
///
/// Returns the next-word suggestions for `text`. `top_k` is clamped to
/// the configured range; `method` defaults to the configured strategy.
#[post("/predict")]
async fn predict(data: web::Data<AppState>, request: web::Json<PredictRequest>) -> impl Responder {
	let request = request.into_inner();
	let active = data.active.get();
	if !active.model.is_trained() {
		return error_body(actix_web::http::StatusCode::SERVICE_UNAVAILABLE, "Model not loaded or not trained");
	}

	let text = request.text.trim();
	if text.is_empty() {
		return error_body(actix_web::http::StatusCode::BAD_REQUEST, "Text input cannot be empty");
	}

	let input = text.to_owned();
	let top_k = data.config.predict.clamp_top_k(request.top_k);
	let method = request.method.unwrap_or(data.config.predict.default_method);

	// Interpolation scores the whole vocabulary, keep it off the worker thread
	let snapshot = Arc::clone(&active);
	let context = input.clone();
	let predictions = match web::block(move || snapshot.model.predict(method, &context, top_k)).await {
		Ok(predictions) => predictions,
		Err(e) => return error_body(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
	};

	HttpResponse::Ok().json(PredictResponse { input, top_k, method, predictions, model: active.name.clone() })
}

/// Registers every endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(root).service(get_models).service(switch_model).service(predict);
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::{App, http::StatusCode, test};
	use rs_ngram_core::{RecordFormat, Trainer};
	use serde_json::Value;

	fn state(dir: &std::path::Path) -> web::Data<AppState> {
		let mut config = AppConfig::default();
		config.models.directory = dir.to_path_buf();
		config.models.format = RecordFormat::Json;
		web::Data::new(AppState::new(config))
	}

	fn save_toy(dir: &std::path::Path, stem: &str) {
		let store = ModelStore::new(dir, RecordFormat::Json);
		store.save_model(&Trainer::new(1).train(&["a b c", "a b d"]), stem).unwrap();
	}

	#[actix_web::test]
	async fn predict_without_model_is_unavailable() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(state(dir.path())).configure(configure)).await;

		let req = test::TestRequest::post().uri("/predict").set_json(json!({"text": "a b"})).to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
	}

	#[actix_web::test]
	async fn switch_then_predict() {
		let dir = tempfile::tempdir().unwrap();
		save_toy(dir.path(), "all");
		let app = test::init_service(App::new().app_data(state(dir.path())).configure(configure)).await;

		let req = test::TestRequest::post().uri("/models/switch").set_json(json!({"model_name": "all"})).to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["model_info"]["vocab_size"], 6);

		let req = test::TestRequest::post()
			.uri("/predict")
			.set_json(json!({"text": "  a b ", "top_k": 2}))
			.to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["predictions"], json!(["c", "d"]));
		assert_eq!(body["method"], "backoff");
		assert_eq!(body["model"], "all");
		assert_eq!(body["input"], "a b");

		let req = test::TestRequest::post()
			.uri("/predict")
			.set_json(json!({"text": "a b", "top_k": 900, "method": "interpolation"}))
			.to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["top_k"], 50);
		assert_eq!(body["predictions"][0], "c");
	}

	#[actix_web::test]
	async fn switch_errors_map_to_statuses() {
		let dir = tempfile::tempdir().unwrap();
		let app = test::init_service(App::new().app_data(state(dir.path())).configure(configure)).await;

		let req = test::TestRequest::post().uri("/models/switch").set_json(json!({"model_name": "klingon"})).to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::post().uri("/models/switch").set_json(json!({"model_name": "poetic"})).to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
	}

	#[::core::prelude::v1::test]
	fn switch_errors_display_their_cause() {
		let dir = tempfile::tempdir().unwrap();
		let state = AppState::new({
			let mut config = AppConfig::default();
			config.models.directory = dir.path().to_path_buf();
			config
		});

		let unknown = state.load_alias("klingon").unwrap_err();
		assert_eq!(unknown.to_string(), "Unknown model name: klingon");

		let missing = state.load_alias("formal").unwrap_err();
		assert!(matches!(missing, SwitchError::Model(ModelError::ModelFileNotFound(_))));
		assert!(missing.to_string().starts_with("Model file not found"), "{missing}");
	}

	#[actix_web::test]
	async fn predict_runs_against_a_snapshot() {
		let dir = tempfile::tempdir().unwrap();
		let data = state(dir.path());
		data.active.set(ActiveModel { name: "toy".to_owned(), model: Trainer::new(1).train(&["a b c", "a b d"]) });
		let app = test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

		let req = test::TestRequest::post()
			.uri("/predict")
			.set_json(json!({"text": "a b", "method": "interpolation"}))
			.to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["predictions"], json!(["c", "d", "a", "b"]));
		assert_eq!(body["top_k"], 5);
		assert_eq!(body["model"], "toy");
	}

	#[actix_web::test]
	async fn blank_text_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let data = state(dir.path());
		data.active.set(ActiveModel { name: "toy".to_owned(), model: Trainer::new(1).train(&["a b c"]) });
		let app = test::init_service(App::new().app_data(data).configure(configure)).await;

		let req = test::TestRequest::post().uri("/predict").set_json(json!({"text": "   "})).to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn models_listing_includes_corrupted_entries() {
		let dir = tempfile::tempdir().unwrap();
		save_toy(dir.path(), "std-en");
		std::fs::write(dir.path().join("cas-en.json"), "oops").unwrap();
		let app = test::init_service(App::new().app_data(state(dir.path())).configure(configure)).await;

		let req = test::TestRequest::get().uri("/models").to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["total_models"], 2);
		assert_eq!(body["models"][0]["name"], "cas-en");
		assert_eq!(body["models"][0]["status"], "corrupted");
		assert_eq!(body["models"][1]["status"], "valid");
		assert!(body.get("loaded_model_info").is_none());
	}
}
