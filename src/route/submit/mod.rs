use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", post_with(create_submission, create_submission_docs))
		.api_route(
			"/schema",
			get_with(get_submission_schema, get_submission_schema_docs),
		)
}
