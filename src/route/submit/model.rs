use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::schema::{Object, Schema, Violations};

/// The minimum number of characters in the content of a submission.
pub const CONTENT_MIN_LENGTH: u64 = 5;

fn validate_content(content: &str) -> Result<(), ValidationError> {
	if (content.chars().count() as u64) < CONTENT_MIN_LENGTH {
		let mut error = ValidationError::new("too_short");

		error.message = Some(format!("Must be {CONTENT_MIN_LENGTH} or more characters long").into());
		error.add_param("min".into(), &CONTENT_MIN_LENGTH);

		return Err(error);
	}

	Ok(())
}

/// A submission sent by the form. Lives only for the duration of a request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, Validate)]
pub struct SubmissionInput {
	/// The text of the submission.
	#[validate(custom(function = "validate_content"))]
	#[schemars(length(min = "CONTENT_MIN_LENGTH"))]
	pub content: String,
	/// An address to notify once the post is live. No format is enforced.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	#[schemars(with = "String")]
	pub email: Option<String>,
}

impl Schema for SubmissionInput {
	fn parse(value: Value) -> Result<Self, Violations> {
		let mut object = Object::new(value)?;
		let content = object.required_string("content");
		let email = object.optional_string("email");

		object.finish(Self {
			content: content.unwrap_or_default(),
			email,
		})
	}
}

/// A stored submission.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	/// The unique identifier of the post.
	pub id: Uuid,
	/// The text of the post.
	pub content: String,
	/// The address left by the author, if any.
	pub email: Option<String>,
	/// The creation time of the post.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod test {
	use serde_json::json;

	use super::*;
	use crate::test::fixtures;

	#[test]
	fn test_parse_normalizes_missing_email() {
		let input = SubmissionInput::parse(json!({ "content": "Hello world" })).unwrap();

		assert_eq!(
			input,
			SubmissionInput {
				content: "Hello world".into(),
				email: None,
			}
		);
	}

	#[test]
	fn test_parse_keeps_empty_email() {
		let input = SubmissionInput::parse(json!({ "content": "Hello", "email": "" })).unwrap();

		assert_eq!(input.email.as_deref(), Some(""));
	}

	#[test]
	fn test_short_content_mentions_minimum() {
		let violations = SubmissionInput::parse(json!({ "content": "hi" })).unwrap_err();
		let violation = &violations.0[0];

		assert_eq!(violation.path, vec!["content"]);
		assert_eq!(violation.code, "too_short");
		assert_eq!(violation.message, "Must be 5 or more characters long");
		assert_eq!(
			violation.details.as_ref().and_then(|d| d.get("min")),
			Some(&json!(CONTENT_MIN_LENGTH))
		);
	}

	#[test]
	fn test_content_length_counts_characters() {
		assert!(SubmissionInput::parse(json!({ "content": "héllo" })).is_ok());
		assert!(SubmissionInput::parse(json!({ "content": "🦀🦀🦀🦀🦀" })).is_ok());
		assert!(SubmissionInput::parse(json!({ "content": "日本語です" })).is_ok());
		assert!(SubmissionInput::parse(json!({ "content": "日本語" })).is_err());
	}

	#[test]
	fn test_nul_bytes_pass_validation() {
		// postgres refuses them in text columns, so the insert fails instead
		let input = SubmissionInput::parse(json!({ "content": "Hello\u{0}" })).unwrap();

		assert_eq!(input.content.chars().count(), 6);
	}

	#[test]
	fn test_fixtures() {
		for case in fixtures() {
			let result = SubmissionInput::parse(case.input.clone());

			match result {
				Ok(input) => {
					assert!(case.violations.is_empty(), "{}: expected violations", case.name);
					assert_eq!(Some(&json!(input.content)), case.input.get("content"));
				}
				Err(violations) => {
					let found = violations
						.iter()
						.map(|v| (v.path.join("."), v.code.to_string()))
						.collect::<Vec<_>>();

					assert_eq!(found, case.violations, "{}", case.name);
				}
			}
		}
	}

	#[test]
	fn test_json_schema_carries_rules() {
		let schema = serde_json::to_value(schemars::schema_for!(SubmissionInput)).unwrap();

		assert_eq!(schema["required"], json!(["content"]));
		assert_eq!(schema["properties"]["email"]["type"], "string");
		assert_eq!(
			schema["properties"]["content"]["minLength"],
			json!(CONTENT_MIN_LENGTH)
		);
	}
}
