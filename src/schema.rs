use std::{borrow::Cow, collections::HashSet, fmt};

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

pub type Map = serde_json::Map<String, Value>;

/// A type that can be produced from an arbitrary JSON value.
///
/// Implementors check the shape of the value themselves so that every
/// violated rule is reported at once, instead of stopping at the first
/// field [`serde`] fails to deserialize.
pub trait Schema: Sized {
	fn parse(value: Value) -> Result<Self, Violations>;
}

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Violation {
	/// The path to the offending field. Empty when the value itself is wrong.
	pub path: Vec<String>,
	/// A human-readable description of the problem.
	pub message: Cow<'static, str>,
	/// The identifier of the violated rule, such as `too_short`.
	pub code: Cow<'static, str>,
	/// Parameters of the rule, such as the minimum length.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Violation {
	pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			path: Vec::new(),
			message: message.into(),
			code: code.into(),
			details: None,
		}
	}

	pub fn at(mut self, field: impl Into<String>) -> Self {
		self.path.push(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	fn invalid_type(expected: &'static str, received: &Value) -> Self {
		let received = type_name(received);

		Self::new(
			"invalid_type",
			format!("Expected {expected}, received {received}"),
		)
		.detail("expected", expected)
		.detail("received", received)
	}

	/// Converts a rule failure reported by [`validator`].
	fn from_validator(field: &str, error: &validator::ValidationError) -> Self {
		let message = error
			.message
			.clone()
			.unwrap_or_else(|| error.code.clone());

		let mut violation = Self::new(error.code.clone(), message).at(field);

		for (key, value) in &error.params {
			// echoes the input back, which the caller already has
			if key == "value" {
				continue;
			}

			violation = violation.detail(key.to_string(), value.clone());
		}

		violation
	}

	fn field(&self) -> Option<&str> {
		self.path.first().map(String::as_str)
	}
}

/// Every rule a value violated, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Violations(pub Vec<Violation>);

impl fmt::Display for Violations {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;

		for violation in &self.0 {
			if !first {
				f.write_str(", ")?;
			}

			first = false;
			write!(f, "{}: {}", violation.path.join("."), violation.code)?;
		}

		Ok(())
	}
}

impl std::error::Error for Violations {}

impl Violations {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Violation> {
		self.0.iter()
	}

	fn push(&mut self, violation: Violation) {
		self.0.push(violation);
	}
}

impl From<Violation> for Violations {
	fn from(violation: Violation) -> Self {
		Self(vec![violation])
	}
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(..) => "boolean",
		Value::Number(..) => "number",
		Value::String(..) => "string",
		Value::Array(..) => "array",
		Value::Object(..) => "object",
	}
}

/// Walks the fields of a JSON object, collecting type violations as it goes.
///
/// ```rust
/// let mut object = Object::new(value)?;
/// let content = object.required_string("content");
///
/// object.finish(Input { content: content.unwrap_or_default() })
/// ```
pub struct Object {
	fields: Map,
	violations: Violations,
}

impl Object {
	pub fn new(value: Value) -> Result<Self, Violations> {
		match value {
			Value::Object(fields) => Ok(Self {
				fields,
				violations: Violations::default(),
			}),
			other => Err(Violation::invalid_type("object", &other).into()),
		}
	}

	/// Takes a string field that must be present.
	pub fn required_string(&mut self, field: &'static str) -> Option<String> {
		match self.fields.remove(field) {
			Some(Value::String(value)) => Some(value),
			Some(other) => {
				self.violations
					.push(Violation::invalid_type("string", &other).at(field));
				None
			}
			None => {
				self.violations.push(
					Violation::new("required", "Required")
						.detail("expected", "string")
						.at(field),
				);
				None
			}
		}
	}

	/// Takes a string field that may be absent. `null` is not treated as absent.
	pub fn optional_string(&mut self, field: &'static str) -> Option<String> {
		match self.fields.remove(field) {
			Some(Value::String(value)) => Some(value),
			Some(other) => {
				self.violations
					.push(Violation::invalid_type("string", &other).at(field));
				None
			}
			None => None,
		}
	}

	/// Runs the value rules of `value`, skipping fields that already failed
	/// their type check, and returns it if nothing was violated.
	pub fn finish<T: Validate>(mut self, value: T) -> Result<T, Violations> {
		let mistyped = self
			.violations
			.iter()
			.filter_map(Violation::field)
			.map(str::to_owned)
			.collect::<HashSet<_>>();

		if let Err(errors) = value.validate() {
			let mut fields = errors
				.field_errors()
				.into_iter()
				.map(|(field, errors)| (field.to_string(), errors))
				.filter(|(field, _)| !mistyped.contains(field))
				.collect::<Vec<_>>();

			fields.sort_by(|a, b| a.0.cmp(&b.0));

			for (field, errors) in fields {
				for error in errors {
					self.violations.push(Violation::from_validator(&field, error));
				}
			}
		}

		if self.violations.is_empty() {
			Ok(value)
		} else {
			Err(self.violations)
		}
	}
}
