use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{
	error::{self, Failure},
	extract::Json,
};

pub mod tag {
	pub const SUBMISSION: &str = "Submission";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Submission Service")
		.summary("Collects validated submissions")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::SUBMISSION.into(),
			description: Some("Submitting and validating posts".into()),
			..Default::default()
		})
		.default_response_with::<Json<Failure<String>>, _>(|res| {
			res.example(Failure::new(error::GENERIC_MESSAGE.to_owned()))
		})
}
