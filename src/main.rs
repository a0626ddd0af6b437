#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod route;
mod schema;
mod store;
mod trace;

use std::{any::Any, sync::Arc, time::Duration};

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{
	http::{header, Method},
	response::{IntoResponse, Response},
	Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{
	catch_panic::CatchPanicLayer,
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

pub use config::Config;
pub use error::AppError;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// The store is created once at startup and shared by every request
/// for the lifetime of the process.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: store::Store,
}

/// Turns a panic inside a handler into the same opaque response as any
/// other unexpected error.
#[allow(clippy::needless_pass_by_value)]
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
	let message = panic
		.downcast_ref::<String>()
		.map(String::as_str)
		.or_else(|| panic.downcast_ref::<&str>().copied())
		.unwrap_or("unknown panic");

	AppError::Unexpected(message.to_owned()).into_response()
}

/// Builds the application router, including the API documentation.
pub fn app(state: State, config: &Config) -> Router {
	let mut api = OpenApi::default();

	let cors = CorsLayer::new()
		.allow_origin(config.cors_origins.clone())
		.allow_methods([Method::POST])
		.allow_headers([header::CONTENT_TYPE]);

	ApiRouter::new()
		.nest("/api/submit", route::submit::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(cors)
				.layer(CatchPanicLayer::custom(handle_panic)),
		)
		.with_state(state)
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = tokio::signal::ctrl_c().await {
			tracing::error!(%error, "failed to listen for ctrl-c");
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(error) => {
				tracing::error!(%error, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard =
		trace::init_tracing_subscriber(config.otlp_enabled).expect("failed to initialize tracing");

	let database = PgPoolOptions::new()
		.max_connections(config.database_max_connections)
		.acquire_timeout(Duration::from_secs(5))
		.connect_with(config.connect_options().expect("invalid configuration"))
		.await
		.expect("failed to connect to database");

	let state = State {
		store: Arc::new(database.clone()),
	};

	let app = app(state, &config);

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.expect("server error");

	database.close().await;
}
