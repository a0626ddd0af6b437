use aide::transform::TransformOperation;
use axum::extract::State;
use serde_json::{json, Value};

use crate::{
	error::AppError,
	extract::{Created, Json},
	openapi::tag,
	store::Store,
};

use super::model;

pub fn create_submission_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Create submission")
		.description(&format!(
			"Validates a submission and stores it as a new post. `content` must be at least \
			 {} characters long, `email` is an optional string. Submitting the same body twice \
			 creates two posts.",
			model::CONTENT_MIN_LENGTH
		))
		.tag(tag::SUBMISSION)
}

/// Validates the body against the submission schema and stores it.
///
/// The store is called exactly once for an accepted body and never for a
/// rejected one.
#[tracing::instrument(skip_all)]
pub async fn create_submission(
	State(store): State<Store>,
	Json(input): Json<model::SubmissionInput>,
) -> Result<Created<model::Post>, AppError> {
	let post = store.create_post(input).await?;

	tracing::info!(
		monotonic_counter.submissions_created = 1_u64,
		post = %post.id,
		"created post"
	);

	Ok(Created(post))
}

pub fn get_submission_schema_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Get submission schema")
		.description(
			"Returns the JSON Schema of a submission, so clients can run the same checks \
			 before sending it.",
		)
		.tag(tag::SUBMISSION)
}

pub async fn get_submission_schema() -> Json<Value> {
	Json(json!(schemars::schema_for!(model::SubmissionInput)))
}
