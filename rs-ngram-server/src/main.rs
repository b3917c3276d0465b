mod api;
mod config;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::{ActiveModel, AppState};
use crate::config::AppConfig;

/// Main entry point for the server.
///
/// Reads the configuration, loads the default model and serves the
/// prediction API.
///
/// # Notes
/// - A default model that fails to load is logged and the server starts
///   untrained; `/predict` answers 503 until a switch succeeds.
#[actix_web::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = AppConfig::load()?;
	let bind = (config.server.host.clone(), config.server.port);
	let state = AppState::new(config);

	let default_name = state.config.models.default.clone();
	match state.load_alias(&default_name) {
		Ok(model) => {
			state.active.set(ActiveModel { name: default_name, model });
		}
		Err(error) => warn!(model = %default_name, %error, "default model not loaded, starting untrained"),
	}

	let state = web::Data::new(state);
	info!(host = %bind.0, port = bind.1, "starting server");

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(state.clone())
			.configure(api::configure)
	})
		.bind(bind)?
		.run()
		.await?;
	Ok(())
}
