use aide::{
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationIo, OperationOutput,
};
use axum::{
	body::Body,
	extract::{FromRequest, Request},
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::{error::AppError, schema::Schema};

/// Extractor that parses a JSON body and checks it against a [`Schema`].
///
/// A body that is not JSON is rejected with [`AppError::Payload`], one that
/// breaks the rules of `T` with [`AppError::Validation`].
///
/// ```rust
/// async fn route(Json(input): Json<SubmissionInput>) {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
	T: Serialize,
{
	fn into_response(self) -> Response<Body> {
		axum::extract::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: Schema + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let value = axum::extract::Json::<Value>::from_request(req, state)
			.await?
			.0;

		Ok(Self(T::parse(value)?))
	}
}

/// The envelope of every successful response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Success<T> {
	/// Always `true`.
	pub success: bool,
	pub data: T,
}

/// Responds with `201 Created` and the created resource in a [`Success`] envelope.
pub struct Created<T>(pub T);

impl<T> IntoResponse for Created<T>
where
	T: Serialize,
{
	fn into_response(self) -> Response<Body> {
		let body = Success {
			success: true,
			data: self.0,
		};

		(StatusCode::CREATED, Json(body)).into_response()
	}
}

impl<T> OperationOutput for Created<T>
where
	T: Serialize + JsonSchema,
{
	type Inner = Success<T>;

	fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
		axum_jsonschema::Json::<Success<T>>::operation_response(ctx, operation)
	}

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, ApiResponse)> {
		Self::operation_response(ctx, operation)
			.map(|res| vec![(Some(201), res)])
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod test {
	use axum::{body::to_bytes, http::header};
	use serde_json::json;

	use super::*;
	use crate::route::submit::model::SubmissionInput;

	fn request(content_type: &str, body: &'static str) -> Request {
		axum::http::Request::builder()
			.method("POST")
			.header(header::CONTENT_TYPE, content_type)
			.body(Body::from(body))
			.unwrap()
	}

	#[tokio::test]
	async fn test_json_checks_schema() {
		let req = request("application/json", r#"{ "content": "Hello", "extra": 1 }"#);
		let Json(input) = Json::<SubmissionInput>::from_request(req, &()).await.unwrap();

		assert_eq!(input.content, "Hello");
		assert_eq!(input.email, None);

		let req = request("application/json", r#"{ "content": "Hey" }"#);
		let error = Json::<SubmissionInput>::from_request(req, &()).await.err();

		assert!(matches!(error, Some(AppError::Validation(..))));
	}

	#[tokio::test]
	async fn test_json_rejects_malformed_payload() {
		let req = request("application/json", "content=Hello");
		let error = Json::<SubmissionInput>::from_request(req, &()).await.err();

		assert!(matches!(error, Some(AppError::Payload(..))));

		let req = request("text/plain", r#"{ "content": "Hello world" }"#);
		let error = Json::<SubmissionInput>::from_request(req, &()).await.err();

		assert!(matches!(error, Some(AppError::Payload(..))));
	}

	#[tokio::test]
	async fn test_created_wraps_in_envelope() {
		let response = Created(json!({ "id": 1 })).into_response();

		assert_eq!(response.status(), StatusCode::CREATED);

		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let body = serde_json::from_slice::<Value>(&bytes).unwrap();

		assert_eq!(body, json!({ "success": true, "data": { "id": 1 } }));
	}
}
