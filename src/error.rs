use aide::{
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationOutput,
};
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, schema::Violations, store};

/// The message sent in place of any error that is not a validation error.
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred";

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] Violations),
	#[error("malformed payload: {0}")]
	Payload(#[from] rejection::JsonRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("unexpected error: {0}")]
	Unexpected(String),
}

/// The envelope of every failed response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Failure<E> {
	/// Always `false`.
	pub success: bool,
	/// The violated rules for a validation error, or a generic message.
	pub error: E,
}

impl<E> Failure<E> {
	pub fn new(error: E) -> Self {
		Self {
			success: false,
			error,
		}
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) => StatusCode::BAD_REQUEST,
			Self::Payload(..) | Self::Store(..) | Self::Unexpected(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		match self {
			Self::Validation(violations) => {
				tracing::debug!(%violations, "submission rejected");

				(status, Json(Failure::new(violations))).into_response()
			}
			error => {
				tracing::error!(%error, "request failed");

				(status, Json(Failure::new(GENERIC_MESSAGE))).into_response()
			}
		}
	}
}

impl OperationOutput for AppError {
	type Inner = Self;

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, ApiResponse)> {
		let mut responses = Vec::new();

		if let Some(res) = Json::<Failure<Violations>>::operation_response(ctx, operation) {
			responses.push((Some(400), res));
		}

		if let Some(res) = Json::<Failure<String>>::operation_response(ctx, operation) {
			responses.push((Some(500), res));
		}

		responses
	}
}
